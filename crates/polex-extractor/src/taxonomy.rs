//! Taxonomy/schema resolution from analysis-stage artifacts
//!
//! The analysis stage persists its taxonomy proposal as
//! `taxonomy_plan_<YYYYmmdd_HHMMSS>.json` plus an alias
//! `taxonomy_plan_recent.json`. Resolution reads exactly one artifact: the
//! alias if present, otherwise the most recent timestamped file. Artifacts are
//! never merged.

use crate::error::ExtractorError;
use chrono::{Local, NaiveDateTime};
use polex_domain::{Category, FieldSpec, Schema, Taxonomy};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Alias always pointing at the latest saved artifact
pub const RECENT_ARTIFACT: &str = "taxonomy_plan_recent.json";

/// File name prefix of timestamped artifacts
pub const ARTIFACT_PREFIX: &str = "taxonomy_plan_";

/// Timestamp format embedded in artifact file names
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Where the active taxonomy and schema came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomySource {
    /// Built-in defaults
    Builtin,

    /// A persisted artifact
    Artifact(PathBuf),
}

/// Taxonomy and schema for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTaxonomy {
    /// Controlled vocabulary
    pub taxonomy: Taxonomy,

    /// Output fields
    pub schema: Schema,

    /// Provenance
    pub source: TaxonomySource,
}

impl ActiveTaxonomy {
    /// The built-in nine categories with the six default fields
    pub fn builtin() -> Self {
        Self {
            taxonomy: Taxonomy::builtin(),
            schema: Schema::builtin(),
            source: TaxonomySource::Builtin,
        }
    }

    /// Interpret an artifact object
    ///
    /// `taxonomy` entries may be `{category, definition}` objects or bare
    /// labels; `schema_fields` entries may be names or `{name}` objects. A
    /// missing or empty half falls back to the built-in value.
    pub fn from_artifact(value: &Value, source: TaxonomySource) -> Self {
        let categories: Vec<Category> = value
            .get("taxonomy")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(category_entry).collect())
            .unwrap_or_default();
        let taxonomy = Taxonomy::new(categories);

        let names: Vec<String> = value
            .get("schema_fields")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(field_entry).collect())
            .unwrap_or_default();
        let schema = Schema::new(names.into_iter().map(known_field).collect());

        Self {
            taxonomy: if taxonomy.is_empty() {
                Taxonomy::builtin()
            } else {
                taxonomy
            },
            schema: if schema.is_empty() {
                Schema::builtin()
            } else {
                schema
            },
            source,
        }
    }
}

fn category_entry(item: &Value) -> Option<Category> {
    match item {
        Value::String(label) => Some(Category::label(label.as_str())),
        Value::Object(map) => {
            let label = map
                .get("category")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)?;
            let definition = map.get("definition").and_then(Value::as_str).unwrap_or("");
            Some(Category::new(label, definition))
        }
        _ => None,
    }
}

fn field_entry(item: &Value) -> Option<String> {
    match item {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("field"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Field spec for `name`, borrowing the type of a preset field of that name
fn known_field(name: String) -> FieldSpec {
    [Schema::builtin(), Schema::instrument(), Schema::detailed()]
        .iter()
        .flat_map(|schema| schema.fields().iter())
        .find(|field| field.name == name.trim())
        .cloned()
        .unwrap_or_else(|| FieldSpec::named(name))
}

/// Resolves the active taxonomy from an artifact directory
#[derive(Debug, Clone, Default)]
pub struct TaxonomyProvider {
    dir: Option<PathBuf>,
}

impl TaxonomyProvider {
    /// Read artifacts from `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Always resolve to the built-in defaults
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// The artifact resolution would read, if any
    pub fn latest_artifact(&self) -> Result<Option<PathBuf>, ExtractorError> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        if !dir.is_dir() {
            return Ok(None);
        }

        let recent = dir.join(RECENT_ARTIFACT);
        if recent.is_file() {
            return Ok(Some(recent));
        }

        let mut latest: Option<String> = None;
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if artifact_timestamp(&name).is_some()
                && latest.as_ref().is_none_or(|current| name > *current)
            {
                latest = Some(name);
            }
        }
        Ok(latest.map(|name| dir.join(name)))
    }

    /// Resolve the taxonomy and schema for a run
    ///
    /// Never fails: a missing directory or artifact yields the built-in
    /// defaults, and an unreadable artifact is logged and replaced by them.
    pub fn resolve(&self) -> ActiveTaxonomy {
        let path = match self.latest_artifact() {
            Ok(Some(path)) => path,
            Ok(None) => {
                debug!("No taxonomy artifact found, using built-in taxonomy");
                return ActiveTaxonomy::builtin();
            }
            Err(e) => {
                warn!(error = %e, "Failed to scan taxonomy artifacts, using built-in taxonomy");
                return ActiveTaxonomy::builtin();
            }
        };

        match load_artifact(&path) {
            Ok(active) => {
                info!(
                    path = %path.display(),
                    categories = active.taxonomy.len(),
                    fields = active.schema.len(),
                    "Loaded taxonomy artifact"
                );
                active
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unusable taxonomy artifact, using built-in taxonomy");
                ActiveTaxonomy::builtin()
            }
        }
    }
}

/// Timestamp embedded in a timestamped artifact file name
pub fn artifact_timestamp(file_name: &str) -> Option<NaiveDateTime> {
    let stamp = file_name
        .strip_prefix(ARTIFACT_PREFIX)?
        .strip_suffix(".json")?;
    NaiveDateTime::parse_from_str(stamp, ARTIFACT_TIMESTAMP_FORMAT).ok()
}

/// Read one artifact file
pub fn load_artifact(path: &Path) -> Result<ActiveTaxonomy, ExtractorError> {
    let content = fs::read_to_string(path).map_err(|e| ExtractorError::Artifact {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| ExtractorError::Artifact {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(ExtractorError::Artifact {
            path: path.to_path_buf(),
            message: "artifact is not a JSON object".to_string(),
        });
    }
    Ok(ActiveTaxonomy::from_artifact(
        &value,
        TaxonomySource::Artifact(path.to_path_buf()),
    ))
}

/// Persist `artifact` as a timestamped file and refresh the recent alias
///
/// Returns the timestamped path.
pub fn save_artifact(dir: &Path, artifact: &Value) -> Result<PathBuf, ExtractorError> {
    fs::create_dir_all(dir)?;
    let stamp = Local::now().format(ARTIFACT_TIMESTAMP_FORMAT);
    let path = dir.join(format!("{}{}.json", ARTIFACT_PREFIX, stamp));
    let body = serde_json::to_string_pretty(artifact)?;

    fs::write(&path, &body)?;
    fs::write(dir.join(RECENT_ARTIFACT), &body)?;

    info!(path = %path.display(), "Saved taxonomy artifact");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polex_domain::FieldType;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: &Value) {
        fs::write(dir.join(name), serde_json::to_string(value).unwrap()).unwrap();
    }

    #[test]
    fn test_missing_directory_uses_builtin() {
        let provider = TaxonomyProvider::new("/nonexistent/polex/artifacts");
        assert_eq!(provider.resolve(), ActiveTaxonomy::builtin());
    }

    #[test]
    fn test_empty_directory_uses_builtin() {
        let dir = TempDir::new().unwrap();
        let active = TaxonomyProvider::new(dir.path()).resolve();
        assert_eq!(active.source, TaxonomySource::Builtin);
        assert_eq!(active.taxonomy.len(), 9);
        assert_eq!(active.schema.len(), 6);
    }

    #[test]
    fn test_recent_alias_is_preferred() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "taxonomy_plan_20990101_000000.json", &json!({"taxonomy": ["newer"]}));
        write(dir.path(), RECENT_ARTIFACT, &json!({"taxonomy": ["alias"]}));

        let active = TaxonomyProvider::new(dir.path()).resolve();
        assert_eq!(active.taxonomy.labels(), vec!["alias"]);
        assert_eq!(active.source, TaxonomySource::Artifact(dir.path().join(RECENT_ARTIFACT)));
    }

    #[test]
    fn test_most_recent_timestamped_artifact_wins() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "taxonomy_plan_20240101_120000.json", &json!({"taxonomy": ["old"]}));
        write(dir.path(), "taxonomy_plan_20250301_080000.json", &json!({"taxonomy": ["new"]}));
        write(dir.path(), "taxonomy_plan_draft.json", &json!({"taxonomy": ["ignored"]}));

        let active = TaxonomyProvider::new(dir.path()).resolve();
        assert_eq!(active.taxonomy.labels(), vec!["new"]);
    }

    #[test]
    fn test_artifact_categories_and_fields() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            RECENT_ARTIFACT,
            &json!({
                "taxonomy": [
                    {"category": "grant", "definition": "non-repayable funding"},
                    {"category": "loan"},
                    "standard"
                ],
                "schema_fields": ["instrument_type", {"name": "scheme_name"}],
                "coding_rules": ["prefer other when unclear"]
            }),
        );

        let active = TaxonomyProvider::new(dir.path()).resolve();
        assert_eq!(active.taxonomy.labels(), vec!["grant", "loan", "standard"]);
        assert_eq!(active.taxonomy.categories()[0].definition, "non-repayable funding");
        assert_eq!(active.schema.field_names(), vec!["instrument_type", "scheme_name"]);
        assert_eq!(active.schema.fields()[0].field_type, Some(FieldType::Category));
        assert_eq!(active.schema.fields()[1].field_type, None);
    }

    #[test]
    fn test_missing_half_falls_back_to_builtin() {
        let active = ActiveTaxonomy::from_artifact(
            &json!({"schema_fields": ["a", "b"]}),
            TaxonomySource::Builtin,
        );
        assert_eq!(active.taxonomy, Taxonomy::builtin());
        assert_eq!(active.schema.field_names(), vec!["a", "b"]);

        let active = ActiveTaxonomy::from_artifact(&json!({"taxonomy": ["x"]}), TaxonomySource::Builtin);
        assert_eq!(active.schema, Schema::builtin());
    }

    #[test]
    fn test_corrupt_artifact_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(RECENT_ARTIFACT), "{ not json").unwrap();

        let provider = TaxonomyProvider::new(dir.path());
        assert!(load_artifact(&dir.path().join(RECENT_ARTIFACT)).is_err());
        assert_eq!(provider.resolve(), ActiveTaxonomy::builtin());
    }

    #[test]
    fn test_save_artifact_writes_timestamped_file_and_alias() {
        let dir = TempDir::new().unwrap();
        let artifact = json!({"taxonomy": [{"category": "grant", "definition": "d"}], "schema_fields": ["category"]});

        let path = save_artifact(dir.path(), &artifact).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(artifact_timestamp(&name).is_some());
        assert!(dir.path().join(RECENT_ARTIFACT).is_file());

        let active = TaxonomyProvider::new(dir.path()).resolve();
        assert_eq!(active.taxonomy.labels(), vec!["grant"]);
        assert_eq!(active.schema.field_names(), vec!["category"]);
    }

    #[test]
    fn test_artifact_timestamp_parsing() {
        assert!(artifact_timestamp("taxonomy_plan_20250301_080000.json").is_some());
        assert!(artifact_timestamp("taxonomy_plan_recent.json").is_none());
        assert!(artifact_timestamp("taxonomy_plan_20251301_080000.json").is_none());
        assert!(artifact_timestamp("doc_analysis_20250301_080000.json").is_none());
    }

    #[test]
    fn test_builtin_provider_ignores_filesystem() {
        assert_eq!(TaxonomyProvider::builtin().latest_artifact().unwrap(), None);
    }
}
