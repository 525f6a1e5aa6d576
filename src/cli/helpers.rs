//! Shared helper functions for CLI commands
//!
//! Formatting used across list and show outputs.

use console::style;

use crate::entities::record::Status;

/// Truncate a string to `max_chars` characters, adding "..." if truncated
///
/// Counts characters rather than bytes so CJK text is never split.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Collapse line breaks so a value fits on one table row
pub fn single_line(s: &str) -> String {
    s.split(['\r', '\n'])
        .filter(|part| !part.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" / ")
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Escape a value for a tab-separated row
pub fn escape_tsv(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// Status colored the way the case list highlights it
pub fn styled_status(status: Status) -> String {
    let text = status.to_string();
    match status {
        Status::Passed => style(text).green().to_string(),
        Status::Failed => style(text).red().bold().to_string(),
        Status::Blocked => style(text).yellow().to_string(),
        Status::Skipped => style(text).dim().to_string(),
    }
}

/// Pad to a display width, counting wide CJK characters as two columns
pub fn pad(s: &str, width: usize) -> String {
    let shown = console::measure_text_width(s);
    if shown >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - shown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("用户登录功能测试", 5), "用户...");
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("1. open\n2. click\r\n"), "1. open / 2. click");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_pad_counts_wide_chars() {
        assert_eq!(pad("登录", 6), "登录  ");
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("toolong", 3), "toolong");
    }
}
