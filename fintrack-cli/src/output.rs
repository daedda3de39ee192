//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

use fintrack_core::{AccountResult, IngestSummary, OverallStatus};

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn result_row(result: &AccountResult) -> Vec<Cell> {
    let status = if result.is_success() {
        Cell::new(result.status_label()).fg(Color::Green)
    } else {
        Cell::new(result.status_label()).fg(Color::Red)
    };
    let detail = match result.error() {
        Some(e) => e.to_string(),
        None => result.message().unwrap_or_default().to_string(),
    };
    vec![Cell::new(result.account().as_str()), status, Cell::new(detail)]
}

/// Print a run summary as a table plus totals
pub fn print_summary(summary: &IngestSummary) {
    let mut table = create_table();
    table.set_header(vec!["Account", "Status", "Detail"]);
    for result in &summary.results {
        table.add_row(result_row(result));
    }
    println!("{}", table);

    let totals = format!(
        "Processed: {}  Succeeded: {}  Failed: {}",
        summary.processed, summary.succeeded, summary.failed
    );
    match summary.status() {
        OverallStatus::Succeeded => success(&totals),
        OverallStatus::Partial => warning(&totals),
        OverallStatus::Failed => error(&totals),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
