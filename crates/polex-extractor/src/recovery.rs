//! Tolerant recovery of a JSON object from raw model output
//!
//! Models wrap answers in code fences, add chatty preambles, or echo an
//! example after the real answer. Recovery runs an ordered list of
//! [`RecoveryStrategy`]s over the fence-stripped text; the first strategy to
//! produce a JSON object wins. When every strategy fails the result is a
//! parse failure carrying a truncated copy of the text, never an error.

use polex_domain::{ExtractionResult, Record};
use regex::Regex;
use serde_json::{Deserializer, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Error tag recorded on a parse failure
pub const INVALID_JSON: &str = "Invalid JSON";

/// Default number of raw-output characters kept on a parse failure
pub const DEFAULT_RAW_OUTPUT_LIMIT: usize = 1_000;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^```(?:json)?\s*").expect("opening fence pattern is valid"));

static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("closing fence pattern is valid"));

/// Trim `text` and remove a leading ```` ``` ```` / ```` ```json ```` marker
/// and a trailing ```` ``` ```` marker, if present
pub fn strip_fences(text: &str) -> String {
    let trimmed = text.trim();
    let opened = OPENING_FENCE.replace(trimmed, "");
    CLOSING_FENCE.replace(&opened, "").into_owned()
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte, _)) => text[..byte].to_string(),
        None => text.to_string(),
    }
}

/// One way of finding a JSON object in model output
pub trait RecoveryStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// The recovered object, or `None` to defer to the next strategy
    fn recover(&self, text: &str) -> Option<Record>;
}

/// The whole text is a JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictParse;

impl RecoveryStrategy for StrictParse {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn recover(&self, text: &str) -> Option<Record> {
        as_object(serde_json::from_str(text).ok()?)
    }
}

/// The span from the first `{` to the last `}` is a JSON object
#[derive(Debug, Clone, Copy, Default)]
pub struct OuterBraces;

impl RecoveryStrategy for OuterBraces {
    fn name(&self) -> &'static str {
        "outer_braces"
    }

    fn recover(&self, text: &str) -> Option<Record> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end <= start {
            return None;
        }
        as_object(serde_json::from_str(&text[start..=end]).ok()?)
    }
}

/// The first complete JSON object starting at some `{`, ignoring whatever
/// follows it
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstBalancedObject;

impl RecoveryStrategy for FirstBalancedObject {
    fn name(&self) -> &'static str {
        "first_balanced_object"
    }

    fn recover(&self, text: &str) -> Option<Record> {
        text.match_indices('{').find_map(|(start, _)| {
            let mut values = Deserializer::from_str(&text[start..]).into_iter::<Value>();
            match values.next() {
                Some(Ok(value)) => as_object(value),
                _ => None,
            }
        })
    }
}

fn as_object(value: Value) -> Option<Record> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Ordered cascade of recovery strategies
pub struct JsonRecovery {
    strategies: Vec<Box<dyn RecoveryStrategy>>,
    raw_output_limit: usize,
}

impl JsonRecovery {
    /// Strict parse, then outer braces, then first balanced object
    pub fn new(raw_output_limit: usize) -> Self {
        Self {
            strategies: vec![
                Box::new(StrictParse),
                Box::new(OuterBraces),
                Box::new(FirstBalancedObject),
            ],
            raw_output_limit,
        }
    }

    /// A cascade with no strategies; add them with [`JsonRecovery::with_strategy`]
    pub fn empty(raw_output_limit: usize) -> Self {
        Self {
            strategies: Vec::new(),
            raw_output_limit,
        }
    }

    /// Append a strategy to the end of the cascade
    pub fn with_strategy(mut self, strategy: impl RecoveryStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Strategy names in the order they are tried
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Recovered object, or `None` if every strategy failed
    pub fn parse(&self, raw: &str) -> Option<Record> {
        let clean = strip_fences(raw);
        self.strategies.iter().find_map(|strategy| {
            let record = strategy.recover(&clean)?;
            debug!(strategy = strategy.name(), fields = record.len(), "Recovered JSON object");
            Some(record)
        })
    }

    /// Recover a record from raw model output
    ///
    /// # Examples
    ///
    /// ```
    /// use polex_extractor::JsonRecovery;
    ///
    /// let recovery = JsonRecovery::default();
    /// let result = recovery.recover("```json\n{\"a\": 1}\n```");
    /// assert_eq!(result.get("a"), Some(&serde_json::json!(1)));
    ///
    /// let failed = recovery.recover("not json at all");
    /// assert_eq!(failed.error(), Some("Invalid JSON"));
    /// ```
    pub fn recover(&self, raw: &str) -> ExtractionResult {
        match self.parse(raw) {
            Some(record) => ExtractionResult::success(record),
            None => {
                let clean = strip_fences(raw);
                warn!(
                    raw_chars = clean.chars().count(),
                    "No JSON object recovered from model output"
                );
                ExtractionResult::parse_failure(
                    INVALID_JSON,
                    truncate_chars(&clean, self.raw_output_limit),
                )
            }
        }
    }
}

impl Default for JsonRecovery {
    fn default() -> Self {
        Self::new(DEFAULT_RAW_OUTPUT_LIMIT)
    }
}

impl std::fmt::Debug for JsonRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRecovery")
            .field("strategies", &self.strategy_names())
            .field("raw_output_limit", &self.raw_output_limit)
            .finish()
    }
}
