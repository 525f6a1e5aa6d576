//! Spreadsheet renderer: one CSV row per flat row

use std::io::Write;

use super::images::ImageCopier;
use super::ReportError;
use crate::core::dates::format_timestamp;
use crate::core::store::FlatRow;

pub const CSV_HEADERS: [&str; 10] = [
    "用例ID",
    "测试场景",
    "测试步骤",
    "预期结果",
    "优先级",
    "执行状态",
    "实际结果",
    "备注",
    "执行时间",
    "图片",
];

/// Write rows as CSV. Image cells hold the copied references joined by `, `.
pub(crate) fn write_csv<W: Write>(
    rows: &[FlatRow],
    copier: &ImageCopier,
    writer: W,
) -> Result<(), ReportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADERS)?;

    for row in rows {
        let images: Vec<&str> = copier.references_for(&row.images).collect();
        wtr.write_record([
            row.case_id.as_str(),
            row.scenario.as_str(),
            row.test_steps.as_deref().unwrap_or(""),
            row.expected_result.as_str(),
            row.priority.as_deref().unwrap_or(""),
            row.status.stored_label(),
            row.actual_result.as_str(),
            row.notes.as_str(),
            format_timestamp(row.timestamp).as_str(),
            images.join(", ").as_str(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::record::Status;
    use std::fs;
    use tempfile::tempdir;

    fn flat(case_id: &str, images: Vec<String>) -> FlatRow {
        FlatRow {
            record_id: 1,
            case_id: case_id.to_string(),
            scenario: "登录, 含逗号".to_string(),
            test_steps: None,
            expected_result: "ok".to_string(),
            priority: Some("高".to_string()),
            collection_name: None,
            status: Status::Passed,
            actual_result: "fine".to_string(),
            notes: String::new(),
            executor: None,
            timestamp: 0,
            images,
        }
    }

    #[test]
    fn test_csv_columns_and_image_refs() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.png");
        let b = tmp.path().join("b.png");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();
        let a = a.to_string_lossy().into_owned();
        let b = b.to_string_lossy().into_owned();

        let mut copier = ImageCopier::new(tmp.path().join("out/images"), "images".into());
        let mut artifacts = super::super::images::Artifacts::default();
        copier.copy(&a, &mut artifacts).unwrap();
        copier.copy(&b, &mut artifacts).unwrap();

        let rows = vec![flat("A1", vec![a, "gone.png".into(), b])];
        let mut buf = Vec::new();
        write_csv(&rows, &copier, &mut buf).unwrap();

        let mut rdr = csv::Reader::from_reader(buf.as_slice());
        let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, CSV_HEADERS);

        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "A1");
        assert_eq!(&record[1], "登录, 含逗号");
        assert_eq!(&record[5], "通过");
        assert_eq!(&record[9], "images/a.png, images/b.png");
    }
}
