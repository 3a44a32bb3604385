//! CLI presentation: text and json formatters per command.

use crate::generation::RunSummary;
use crate::prompt::Topic;
use crate::usage::UsageReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn usage_table(usage: &UsageReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Counter", "Tokens"]);
    for (label, value) in usage.entries() {
        table.add_row(vec![label.to_string(), value.to_string()]);
    }
    table
}

pub fn format_summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Generation Summary")));
    out.push_str(&format!("  Requested: {}\n", summary.requested));
    out.push_str(&format!("  Accepted:  {}\n", summary.accepted));
    out.push_str(&format!(
        "  Batches:   {} planned, {} succeeded, {} empty, {} failed\n",
        summary.batches_planned,
        summary.batches_succeeded,
        summary.batches_empty,
        summary.batches_failed
    ));
    out.push_str(&format!("  Output:    {}\n", summary.output.display()));
    if let Some(error) = &summary.output_error {
        out.push_str(&format!(
            "\n{}\n",
            format!("Error: output write failed, run stopped early: {}", error).red()
        ));
    }

    if !summary.is_exact() {
        let note = if summary.shortfall() > 0 {
            format!(
                "Warning: {} sentence(s) short of the requested {}",
                summary.shortfall(),
                summary.requested
            )
        } else {
            format!(
                "Warning: {} sentence(s) more than the requested {}",
                summary.discrepancy(),
                summary.requested
            )
        };
        out.push_str(&format!("\n{}\n", note.yellow()));
        if summary.preview.is_empty() {
            out.push_str("  (no sentences collected)\n");
        } else {
            out.push_str("  Preview:\n");
            for line in &summary.preview {
                out.push_str(&format!("    {}\n", line));
            }
        }
    }

    if let Some(usage) = summary.usage.as_ref().filter(|u| !u.is_empty()) {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Usage")));
        out.push_str(&format!("{}\n", usage_table(usage)));
    }
    out
}

pub fn format_summary_json(summary: &RunSummary) -> String {
    let mut value = serde_json::to_value(summary).unwrap_or_else(|_| json!({}));
    if let Some(object) = value.as_object_mut() {
        object.insert("shortfall".to_string(), json!(summary.shortfall()));
    }
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_usage_text(usage: Option<&UsageReport>) -> String {
    match usage.filter(|u| !u.is_empty()) {
        Some(usage) => format!("{}\n\n{}", format_section_heading("Usage"), usage_table(usage)),
        None => "No usage reported.".to_string(),
    }
}

pub fn format_usage_json(usage: Option<&UsageReport>) -> String {
    let out = json!({ "usage": usage });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_topics_text(topics: &[Topic]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Topic", "Examples"]);
    for (index, topic) in topics.iter().enumerate() {
        table.add_row(vec![
            index.to_string(),
            topic.topic.clone(),
            topic.examples.len().to_string(),
        ]);
    }
    format!(
        "{}\n\n{}\n\nTotal: {} topic(s)",
        format_section_heading("Topics"),
        table,
        topics.len()
    )
}

pub fn format_topics_json(topics: &[Topic]) -> String {
    let out = json!({ "topics": topics, "total": topics.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
