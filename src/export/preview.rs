//! Data Preview Module
//! Human-readable overview of the cleaned source tables.

use crate::data::CleanTable;
use crate::stats::{ColumnSummary, StatsCalculator};

/// Key columns whose presence is reported for every table.
pub const KEY_COLUMNS: [&str; 5] = ["id", "client_id", "card_id", "user_id", "customer_id"];

const HEAD_ROWS: usize = 5;

pub struct PreviewBuilder;

impl PreviewBuilder {
    /// Previews of all tables, separated by a blank line.
    pub fn render(tables: &[CleanTable]) -> String {
        tables
            .iter()
            .map(Self::render_table)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn render_table(table: &CleanTable) -> String {
        let label = table.schema.name.to_uppercase();
        let df = &table.df;
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let mut lines = vec![
            format!("[{label}]  source: {}", table.path.display()),
            format!("[{label}]  shape: {} rows x {} cols", df.height(), df.width()),
            format!("[{label}]  columns: {}", names.join(", ")),
            format!("[{label}]  column types:"),
        ];
        lines.extend(df.get_columns().iter().map(|column| {
            format!(
                "    {:<28} {:<12} {:<24} nulls={}",
                column.name().as_str(),
                table.schema.kind_of(column.name()).label(),
                column.dtype().to_string(),
                column.null_count()
            )
        }));

        let summaries = StatsCalculator::summarize_numeric_columns(df);
        if !summaries.is_empty() {
            lines.push(format!("[{label}]  numeric summary:"));
            lines.extend(summaries.iter().map(|s| format!("    {}", format_summary(s))));
        }

        lines.push(format!("[{label}]  head({HEAD_ROWS}):\n{}", df.head(Some(HEAD_ROWS))));

        let present = KEY_COLUMNS
            .iter()
            .map(|k| format!("{k}={}", if names.iter().any(|n| n == k) { 'Y' } else { 'N' }))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("[{label}]  key columns present: {present}"));

        lines.join("\n")
    }
}

fn format_summary(s: &ColumnSummary) -> String {
    format!(
        "{:<28} count={} nulls={} mean={:.2} median={:.2} std={:.2} p05={:.2} p95={:.2} min={:.2} max={:.2}",
        s.column, s.count, s.nulls, s.mean, s.median, s.std, s.p05, s.p95, s.min, s.max
    )
}
