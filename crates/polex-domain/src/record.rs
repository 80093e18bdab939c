//! Extraction records and the index-aligned result collection

use crate::taxonomy::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recovered JSON object, keyed by schema field name
pub type Record = serde_json::Map<String, Value>;

/// Column carrying the chunk identifier
pub const CHUNK_ID_COLUMN: &str = "chunk_id";

/// Column carrying the failure description of a failed row
pub const ERROR_COLUMN: &str = "error";

/// Column carrying the truncated raw model output of a parse failure
pub const RAW_OUTPUT_COLUMN: &str = "raw_output";

/// Outcome of extracting one chunk
///
/// Failures are data, not errors: every chunk yields exactly one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionResult {
    /// The model output was recovered as a JSON object
    Success {
        /// Recovered object
        record: Record,
    },

    /// The model answered but no JSON object could be recovered
    ParseFailure {
        /// Failure tag
        error: String,

        /// Truncated copy of the raw model output, for diagnosis
        raw_output: String,
    },

    /// The gateway gave up on the request
    RequestFailure {
        /// Terminal gateway error, rendered
        error: String,
    },
}

impl ExtractionResult {
    /// Success with the given record
    pub fn success(record: Record) -> Self {
        ExtractionResult::Success { record }
    }

    /// Parse failure carrying a diagnostic sample
    pub fn parse_failure(error: impl Into<String>, raw_output: impl Into<String>) -> Self {
        ExtractionResult::ParseFailure {
            error: error.into(),
            raw_output: raw_output.into(),
        }
    }

    /// Request failure carrying the gateway error
    pub fn request_failure(error: impl Into<String>) -> Self {
        ExtractionResult::RequestFailure {
            error: error.into(),
        }
    }

    /// Whether a record was recovered
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }

    /// The recovered record, if any
    pub fn record(&self) -> Option<&Record> {
        match self {
            ExtractionResult::Success { record } => Some(record),
            _ => None,
        }
    }

    /// Value of `field` in the recovered record
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.record().and_then(|r| r.get(field))
    }

    /// Error description of a failed result
    pub fn error(&self) -> Option<&str> {
        match self {
            ExtractionResult::Success { .. } => None,
            ExtractionResult::ParseFailure { error, .. } => Some(error),
            ExtractionResult::RequestFailure { error } => Some(error),
        }
    }

    /// Raw output sample of a parse failure
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ExtractionResult::ParseFailure { raw_output, .. } => Some(raw_output),
            _ => None,
        }
    }
}

/// An extraction result tagged with the chunk it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Identifier of the source chunk
    pub chunk_id: usize,

    /// Outcome for that chunk
    #[serde(flatten)]
    pub result: ExtractionResult,
}

impl ChunkResult {
    /// Tag `result` with `chunk_id`
    pub fn new(chunk_id: usize, result: ExtractionResult) -> Self {
        Self { chunk_id, result }
    }

    /// Flat JSON object: the record's fields (on success) plus
    /// `chunk_id`, `error` and `raw_output`
    pub fn to_json(&self) -> Value {
        let mut object = self.result.record().cloned().unwrap_or_default();
        object.insert(CHUNK_ID_COLUMN.to_string(), Value::from(self.chunk_id));
        if let Some(error) = self.result.error() {
            object.insert(ERROR_COLUMN.to_string(), Value::from(error));
        }
        if let Some(raw) = self.result.raw_output() {
            object.insert(RAW_OUTPUT_COLUMN.to_string(), Value::from(raw));
        }
        Value::Object(object)
    }
}

/// Counts over a result collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    /// Number of results
    pub total: usize,

    /// Results carrying a record
    pub succeeded: usize,

    /// Results whose output could not be parsed
    pub parse_failures: usize,

    /// Results whose request failed
    pub request_failures: usize,
}

/// Ordered results, one per input chunk
///
/// Position `i` always holds the result for input chunk `i`, failures included.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultCollection {
    results: Vec<ChunkResult>,

    /// Set when a run was stopped before every chunk was processed
    #[serde(default)]
    interrupted: bool,
}

impl ResultCollection {
    /// Wrap results that are already in input order
    pub fn new(results: Vec<ChunkResult>) -> Self {
        Self {
            results,
            interrupted: false,
        }
    }

    /// Wrap the results of a run that was stopped early
    pub fn partial(results: Vec<ChunkResult>) -> Self {
        Self {
            results,
            interrupted: true,
        }
    }

    /// Whether the run stopped before processing every chunk
    pub fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Results in input order
    pub fn results(&self) -> &[ChunkResult] {
        &self.results
    }

    /// Result at position `index`
    pub fn get(&self, index: usize) -> Option<&ChunkResult> {
        self.results.get(index)
    }

    /// Iterate results in input order
    pub fn iter(&self) -> std::slice::Iter<'_, ChunkResult> {
        self.results.iter()
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Count successes and failures by kind
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            total: self.results.len(),
            ..RunSummary::default()
        };
        for item in &self.results {
            match item.result {
                ExtractionResult::Success { .. } => summary.succeeded += 1,
                ExtractionResult::ParseFailure { .. } => summary.parse_failures += 1,
                ExtractionResult::RequestFailure { .. } => summary.request_failures += 1,
            }
        }
        summary
    }

    /// Flat JSON records, one per result
    pub fn to_json_records(&self) -> Vec<Value> {
        self.results.iter().map(ChunkResult::to_json).collect()
    }

    /// Project the results onto a table whose columns are `chunk_id`, the
    /// schema fields, `error` and `raw_output`
    ///
    /// Keys the model emitted outside the schema are not projected.
    pub fn to_table(&self, schema: &Schema) -> Table {
        let reserved = [CHUNK_ID_COLUMN, ERROR_COLUMN, RAW_OUTPUT_COLUMN];
        let fields: Vec<&str> = schema
            .field_names()
            .into_iter()
            .filter(|name| !reserved.contains(name))
            .collect();

        let mut columns = Vec::with_capacity(fields.len() + 3);
        columns.push(CHUNK_ID_COLUMN.to_string());
        columns.extend(fields.iter().map(|f| f.to_string()));
        columns.push(ERROR_COLUMN.to_string());
        columns.push(RAW_OUTPUT_COLUMN.to_string());

        let rows = self
            .results
            .iter()
            .map(|item| {
                let mut row = Vec::with_capacity(columns.len());
                row.push(item.chunk_id.to_string());
                for field in &fields {
                    row.push(item.result.get(field).map(cell).unwrap_or_default());
                }
                row.push(item.result.error().unwrap_or_default().to_string());
                row.push(item.result.raw_output().unwrap_or_default().to_string());
                row
            })
            .collect();

        Table { columns, rows }
    }
}

impl<'a> IntoIterator for &'a ResultCollection {
    type Item = &'a ChunkResult;
    type IntoIter = std::slice::Iter<'a, ChunkResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Tabular projection of a result collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Column names
    pub columns: Vec<String>,

    /// One row per result, aligned with `columns`
    pub rows: Vec<Vec<String>>,
}

/// Render one JSON value as a table cell
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    fn sample_collection() -> ResultCollection {
        ResultCollection::new(vec![
            ChunkResult::new(
                0,
                ExtractionResult::success(record(json!({
                    "instrument_type": "grant",
                    "funding_amount_or_cap": "up to HKD 10 million",
                    "eligibility_rules": ["eligible firms"],
                    "confidence": 0.9,
                    "target_sector": null,
                    "unexpected": "dropped from table"
                }))),
            ),
            ChunkResult::new(
                1,
                ExtractionResult::parse_failure("Invalid JSON", "not json at all"),
            ),
            ChunkResult::new(2, ExtractionResult::request_failure("retries exhausted")),
        ])
    }

    #[test]
    fn test_summary_counts_each_kind() {
        let summary = sample_collection().summary();
        assert_eq!(
            summary,
            RunSummary {
                total: 3,
                succeeded: 1,
                parse_failures: 1,
                request_failures: 1,
            }
        );
    }

    #[test]
    fn test_table_columns_are_schema_plus_diagnostics() {
        let schema = Schema::from_names([
            "instrument_type",
            "confidence",
            "target_sector",
            "funding_amount_or_cap",
            "eligibility_rules",
        ]);
        let table = sample_collection().to_table(&schema);

        assert_eq!(
            table.columns,
            vec![
                "chunk_id",
                "instrument_type",
                "confidence",
                "target_sector",
                "funding_amount_or_cap",
                "eligibility_rules",
                "error",
                "raw_output",
            ]
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0],
            vec![
                "0",
                "grant",
                "0.9",
                "",
                "up to HKD 10 million",
                r#"["eligible firms"]"#,
                "",
                "",
            ]
        );
        assert_eq!(table.rows[1][6], "Invalid JSON");
        assert_eq!(table.rows[1][7], "not json at all");
        assert_eq!(table.rows[2][6], "retries exhausted");
        assert_eq!(table.rows[2][1], "");
    }

    #[test]
    fn test_table_skips_schema_fields_colliding_with_reserved_columns() {
        let schema = Schema::from_names(["error", "category"]);
        let table = sample_collection().to_table(&schema);
        assert_eq!(table.columns, vec!["chunk_id", "category", "error", "raw_output"]);
    }

    #[test]
    fn test_json_records_carry_chunk_id_and_error() {
        let records = sample_collection().to_json_records();
        assert_eq!(records[0]["chunk_id"], 0);
        assert_eq!(records[0]["instrument_type"], "grant");
        assert!(records[0].get("error").is_none());
        assert_eq!(records[1]["error"], "Invalid JSON");
        assert_eq!(records[1]["raw_output"], "not json at all");
        assert_eq!(records[2]["chunk_id"], 2);
    }

    #[test]
    fn test_chunk_result_serializes_with_status_tag() {
        let item = ChunkResult::new(4, ExtractionResult::request_failure("boom"));
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"chunk_id": 4, "status": "request_failure", "error": "boom"}));
    }

    #[test]
    fn test_empty_collection() {
        let collection = ResultCollection::default();
        assert!(collection.is_empty());
        assert!(!collection.is_interrupted());
        assert_eq!(collection.summary().total, 0);
        assert!(collection.to_table(&Schema::builtin()).rows.is_empty());
    }
}
