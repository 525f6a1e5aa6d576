//! Document renderer: Markdown with a statistics table and one section per
//! record

use tabled::{builder::Builder, settings::Style};

use super::images::ImageCopier;
use crate::core::dates::format_timestamp;
use crate::core::store::{FlatRow, Statistics};
use crate::entities::record::Status;

/// Display width for embedded screenshots, in pixels
pub const IMAGE_WIDTH: u32 = 400;

/// Render the report document. `on_row` is called with the number of rows
/// rendered so far.
pub(crate) fn render_markdown(
    rows: &[FlatRow],
    stats: &Statistics,
    copier: &ImageCopier,
    on_row: &mut impl FnMut(usize),
) -> String {
    let mut output = String::new();
    output.push_str("# 测试执行报告\n\n");

    output.push_str("## Summary\n\n");
    let mut summary = Builder::default();
    summary.push_record(["Metric", "Count"]);
    summary.push_record(["Total".to_string(), stats.total.to_string()]);
    for status in Status::ALL {
        summary.push_record([status.stored_label().to_string(), stats.count(status).to_string()]);
    }
    summary.push_record(["Pass Rate".to_string(), format!("{:.1}%", stats.pass_rate)]);
    output.push_str(&summary.build().with(Style::markdown()).to_string());
    output.push_str("\n\n## Records\n");

    for (i, row) in rows.iter().enumerate() {
        output.push_str(&format!("\n### {} {}\n\n", row.case_id, row.scenario));

        let mut fields = Builder::default();
        fields.push_record(["Field", "Value"]);
        push_field(&mut fields, "测试步骤", cell(row.test_steps.as_deref().unwrap_or("")));
        push_field(&mut fields, "预期结果", cell(&row.expected_result));
        push_field(&mut fields, "优先级", cell(row.priority.as_deref().unwrap_or("")));
        push_field(&mut fields, "执行状态", row.status.stored_label().to_string());
        push_field(&mut fields, "实际结果", cell(&row.actual_result));
        push_field(&mut fields, "备注", cell(&row.notes));
        push_field(&mut fields, "执行人", cell(row.executor.as_deref().unwrap_or("")));
        push_field(&mut fields, "执行时间", format_timestamp(row.timestamp));
        output.push_str(&fields.build().with(Style::markdown()).to_string());
        output.push('\n');

        let images: Vec<&str> = copier.references_for(&row.images).collect();
        if !images.is_empty() {
            output.push('\n');
            for image in images {
                output.push_str(&format!(
                    "<img src=\"{}\" width=\"{}\" />\n",
                    image, IMAGE_WIDTH
                ));
            }
        }

        on_row(i + 1);
    }

    output
}

fn push_field(builder: &mut Builder, name: &str, value: String) {
    builder.push_record([name.to_string(), value]);
}

/// Keep multi-line text inside one table cell
fn cell(text: &str) -> String {
    if text.is_empty() {
        return "-".to_string();
    }
    text.replace('|', "\\|").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_document_contains_stats_and_fields() {
        let rows = vec![FlatRow {
            record_id: 7,
            case_id: "A1".into(),
            scenario: "登录".into(),
            test_steps: Some("1. open\n2. submit".into()),
            expected_result: "ok".into(),
            priority: None,
            collection_name: None,
            status: Status::Failed,
            actual_result: "a|b".into(),
            notes: String::new(),
            executor: Some("qa".into()),
            timestamp: 0,
            images: vec!["missing.png".into()],
        }];
        let stats = Statistics {
            total: 4,
            passed: 3,
            failed: 1,
            pass_rate: 75.0,
            ..Default::default()
        };
        let copier = ImageCopier::new(PathBuf::from("unused"), "r_images".into());
        let mut calls = Vec::new();

        let doc = render_markdown(&rows, &stats, &copier, &mut |n| calls.push(n));

        assert!(doc.contains("75.0%"));
        assert!(doc.contains("### A1 登录"));
        assert!(doc.contains("1. open<br>2. submit"));
        assert!(doc.contains("a\\|b"));
        assert!(doc.contains("失败"));
        assert!(!doc.contains("<img"));
        assert_eq!(calls, vec![1]);
    }
}
