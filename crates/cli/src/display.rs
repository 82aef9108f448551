//! Plain-text rendering of jobs and their results.

use extraction::{ExtractionJob, ExtractionResult, JobInfo, Table};
use std::fmt::Write;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Info block shown for a job.
pub fn render_info(info: &JobInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:             {}", info.id);
    let _ = writeln!(out, "Tool:           {}", info.config.tool.label());
    let _ = writeln!(out, "Status:         {}", info.status);
    let _ = writeln!(
        out,
        "Created:        {}",
        info.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Process Output: {}", yes_no(info.config.process_output));
    let _ = writeln!(out, "Extract Tables: {}", yes_no(info.config.extract_tables));
    let _ = writeln!(out, "Extract Text:   {}", yes_no(info.config.extract_text));
    out
}

/// Body of a job's result view: the payload, the error, or a pending marker.
pub fn render_job(job: &ExtractionJob, raw: bool) -> String {
    if let Some(message) = job.error_message() {
        return format!("Error extracting data\n{message}\n");
    }

    match job.result() {
        Some(result) if raw => serde_json::to_string_pretty(result)
            .map(|json| json + "\n")
            .unwrap_or_else(|e| format!("Failed to serialize result: {e}\n")),
        Some(result) => render_result(result),
        None => "Extracting...\n".to_string(),
    }
}

/// Paragraphs first, then each named table.
pub fn render_result(result: &ExtractionResult) -> String {
    if result.is_empty() {
        return "No content extracted.\n".to_string();
    }

    let mut out = String::new();
    if let Some(text) = result.text.as_ref().filter(|_| result.has_text()) {
        let _ = writeln!(out, "== Text ==");
        for paragraph in text {
            let _ = writeln!(out, "{paragraph}\n");
        }
    }

    if let Some(tables) = result.tables.as_ref().filter(|_| result.has_tables()) {
        let _ = writeln!(out, "== Tables ==");
        for (name, table) in tables {
            let _ = writeln!(out, "{name}");
            out.push_str(&render_table(table));
            out.push('\n');
        }
    }
    out
}

fn render_table(table: &Table) -> String {
    let columns = table
        .values
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.headers.len()))
        .max()
        .unwrap_or(0);

    let mut widths = vec![0usize; columns];
    for row in std::iter::once(&table.headers).chain(&table.values) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, &width)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                format!("{cell:<width$}")
            })
            .collect();
        format!("| {} |\n", cells.join(" | "))
    };

    let mut out = format_row(table.headers.as_slice());
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    let _ = writeln!(out, "|-{}-|", rule.join("-|-"));
    for row in &table.values {
        out.push_str(&format_row(row.as_slice()));
    }
    out
}
