//! Report rendering for stdout.

use census::CensusReport;
use clap::ValueEnum;
use comfy_table::{CellAlignment, Table};

/// Output format of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table followed by any warnings.
    Text,
    /// The full report as pretty-printed JSON.
    Json,
}

/// Renders `report` in the requested format.
pub fn render(report: &CensusReport, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Text => Ok(render_text(report)),
        OutputFormat::Json => serde_json::to_string_pretty(report),
    }
}

/// Rows are engineering functions, columns are size labels, with row totals.
pub fn render_text(report: &CensusReport) -> String {
    let sizes = report.table.size_labels();

    let mut table = Table::new();
    let mut header = vec!["Engineering function".to_string()];
    header.extend(sizes.iter().map(|s| s.to_string()));
    header.push("Total".to_string());
    table.set_header(header);

    for function in report.table.functions() {
        let counts: Vec<u64> = sizes
            .iter()
            .map(|size| {
                report
                    .table
                    .get(function.as_str(), size.as_str())
                    .unwrap_or(0)
            })
            .collect();
        let mut row = vec![function.to_string()];
        row.extend(counts.iter().map(u64::to_string));
        row.push(counts.iter().sum::<u64>().to_string());
        table.add_row(row);
    }
    for index in 1..=sizes.len() + 1 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    let mut out = format!(
        "Project: {} ({} columns, {} cards)\n{table}\n",
        report.project.name, report.columns_matched, report.cards_collected
    );
    if !report.warnings.is_empty() {
        out.push_str(&format!("\nWarnings ({}):\n", report.warnings.len()));
        for warning in &report.warnings {
            out.push_str(&format!("  - {warning}\n"));
        }
    }
    out
}
