//! Date strings to timestamp ranges, and timestamps back to display text

use chrono::{Days, Local, NaiveDate, TimeZone};

use crate::core::error::ValidationError;

/// Display format for record timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse `YYYY-MM-DD` into a calendar date
pub fn parse_date(text: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::MalformedDate(text.to_string()))
}

/// Local midnight at the start of `text`'s day
pub fn parse_date_start(text: &str) -> Result<i64, ValidationError> {
    let date = parse_date(text)?;
    local_midnight(date).ok_or_else(|| ValidationError::MalformedDate(text.to_string()))
}

/// Local midnight at the start of the day after `text`, used as an
/// inclusive upper bound
pub fn parse_date_end(text: &str) -> Result<i64, ValidationError> {
    let date = parse_date(text)?;
    date.checked_add_days(Days::new(1))
        .and_then(local_midnight)
        .ok_or_else(|| ValidationError::MalformedDate(text.to_string()))
}

/// Optional `(start, end)` bounds from optional date strings
pub fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
) -> Result<(Option<i64>, Option<i64>), ValidationError> {
    let start = from.map(parse_date_start).transpose()?;
    let end = to.map(parse_date_end).transpose()?;
    Ok((start, end))
}

fn local_midnight(date: NaiveDate) -> Option<i64> {
    start_of_day(&Local, date)
}

/// First valid instant of `date` in `tz`. When midnight falls in a DST gap
/// the next whole hour that exists is used.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<i64> {
    (0..=3).find_map(|hour| {
        let naive = date.and_hms_opt(hour, 0, 0)?;
        tz.from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.timestamp())
    })
}

/// Format epoch seconds in local time
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}
