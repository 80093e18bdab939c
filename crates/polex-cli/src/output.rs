//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use polex_domain::{ResultCollection, RunSummary, Schema, Table};
use polex_extractor::KeywordCount;
use std::io::Write;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Widest cell shown in terminal tables
const MAX_CELL_CHARS: usize = 48;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Render results in the selected format.
    pub fn format_results(&self, results: &ResultCollection, schema: &Schema) -> Result<String> {
        match self.format {
            OutputFormat::Json => format_json(results),
            OutputFormat::Csv => {
                let mut buf = Vec::new();
                write_csv(&results.to_table(schema), &mut buf)?;
                Ok(String::from_utf8_lossy(&buf).into_owned())
            }
            OutputFormat::Table => Ok(self.format_table(&results.to_table(schema))),
        }
    }

    /// Render the flat table for a terminal, without raw model output.
    pub fn format_table(&self, table: &Table) -> String {
        if table.rows.is_empty() {
            return self.colorize("No chunks processed.", "yellow");
        }

        let keep: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_str() != polex_domain::record::RAW_OUTPUT_COLUMN)
            .map(|(i, _)| i)
            .collect();

        let mut builder = Builder::default();
        builder.push_record(keep.iter().map(|&i| table.columns[i].clone()));
        for row in &table.rows {
            builder.push_record(keep.iter().map(|&i| truncate(&row[i])));
        }

        let mut rendered = builder.build();
        rendered
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        rendered.to_string()
    }

    /// One-line run summary.
    pub fn summary(&self, summary: &RunSummary, interrupted: bool) -> String {
        let line = format!(
            "{} chunk(s): {} succeeded, {} unparseable, {} failed",
            summary.total, summary.succeeded, summary.parse_failures, summary.request_failures
        );
        if interrupted {
            self.warning(&format!("Stopped early. {}", line))
        } else if summary.succeeded == summary.total {
            self.success(&line)
        } else {
            self.warning(&line)
        }
    }

    /// Keyword counts as a two-column table.
    pub fn format_keywords(&self, counts: &[KeywordCount]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Keyword", "Count"]);
        for c in counts {
            builder.push_record([c.keyword.clone(), c.count.to_string()]);
        }
        let mut table = builder.build();
        table.with(Style::rounded());
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Pretty JSON array of records, each carrying its `chunk_id`.
pub fn format_json(results: &ResultCollection) -> Result<String> {
    Ok(serde_json::to_string_pretty(&results.to_json_records())?)
}

/// Write `table` as CSV with a header row.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(&table.columns)?;
    for row in &table.rows {
        csv.write_record(row)?;
    }
    csv.flush()?;
    Ok(())
}

fn truncate(cell: &str) -> String {
    let flat = cell.replace('\n', " ");
    if flat.chars().count() <= MAX_CELL_CHARS {
        return flat;
    }
    let mut short: String = flat.chars().take(MAX_CELL_CHARS - 1).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use polex_domain::{ChunkResult, ExtractionResult};
    use serde_json::json;

    fn results() -> ResultCollection {
        let record = json!({"category": "grant", "funding_amount": "HKD 10 million, matched"});
        ResultCollection::new(vec![
            ChunkResult::new(0, ExtractionResult::success(record.as_object().unwrap().clone())),
            ChunkResult::new(1, ExtractionResult::parse_failure("Invalid JSON", "oops")),
        ])
    }

    fn schema() -> Schema {
        Schema::from_names(["category", "funding_amount"])
    }

    #[test]
    fn test_csv_quotes_commas() {
        let formatter = Formatter::new(OutputFormat::Csv, false);
        let csv = formatter.format_results(&results(), &schema()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("chunk_id,category,funding_amount,error,raw_output"));
        assert_eq!(lines.next(), Some("0,grant,\"HKD 10 million, matched\",,"));
        assert_eq!(lines.next(), Some("1,,,Invalid JSON,oops"));
    }

    #[test]
    fn test_json_records() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let rendered = formatter.format_results(&results(), &schema()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value[0]["chunk_id"], json!(0));
        assert_eq!(value[0]["category"], json!("grant"));
        assert_eq!(value[1]["error"], json!("Invalid JSON"));
    }

    #[test]
    fn test_table_hides_raw_output() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let rendered = formatter.format_results(&results(), &schema()).unwrap();
        assert!(rendered.contains("category"));
        assert!(rendered.contains("Invalid JSON"));
        assert!(!rendered.contains("raw_output"));
        assert!(!rendered.contains("oops"));
    }

    #[test]
    fn test_empty_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let rendered = formatter
            .format_results(&ResultCollection::default(), &schema())
            .unwrap();
        assert_eq!(rendered, "No chunks processed.");
    }

    #[test]
    fn test_summary_line() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let summary = results().summary();
        assert_eq!(
            formatter.summary(&summary, false),
            "⚠ 2 chunk(s): 1 succeeded, 1 unparseable, 0 failed"
        );
        assert!(formatter.summary(&summary, true).starts_with("⚠ Stopped early."));
    }

    #[test]
    fn test_truncate_long_cells() {
        let long = "x".repeat(100);
        let short = truncate(&long);
        assert_eq!(short.chars().count(), MAX_CELL_CHARS);
        assert!(short.ends_with('…'));
        assert_eq!(truncate("a\nb"), "a b");
    }
}
