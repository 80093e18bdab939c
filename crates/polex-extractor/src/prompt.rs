//! Extraction prompt composition

use polex_domain::{FieldType, Record, Schema, Taxonomy};
use serde_json::{json, Value};

const DATASET_INSTRUCTIONS: &str = r#"You are building a structured dataset of industrial policy and regulatory instruments.

A "policy instrument" is a concrete, actionable measure such as:
- financial support (grant/subsidy/loan) with clear support terms
- tax incentive (credit/deduction/allowance)
- export restriction or licensing requirement
- local content/sourcing requirement
- procurement preference/requirement
- mandatory standard/compliance requirement"#;

const BASE_RULES: &str = r#"Rules:
- Do NOT invent details.
- If information is not explicitly stated or is ambiguous, use null (or an empty list)."#;

/// An illustrative input/output pair shown to the model
#[derive(Debug, Clone, PartialEq)]
pub struct FewShotExample {
    /// Source sentence
    pub text: String,

    /// Expected output; keys outside the active schema are not shown
    pub output: Record,
}

impl FewShotExample {
    /// Create an example; a non-object `output` is treated as empty
    pub fn new(text: impl Into<String>, output: Value) -> Self {
        let output = match output {
            Value::Object(map) => map,
            _ => Record::new(),
        };
        Self {
            text: text.into(),
            output,
        }
    }

    /// Built-in examples covering narrative text and four instrument kinds
    ///
    /// Outputs carry the union of the built-in schemas' fields so that every
    /// preset projects to a complete example.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(
                "The Government aims to strengthen Hong Kong's innovation ecosystem and build a vibrant I&T hub.",
                json!({
                    "instrument_type": "other",
                    "category": "other",
                    "confidence": 0.8,
                    "enforceability": "nonbinding",
                    "eligibility_rules": [],
                    "evidence_spans": []
                }),
            ),
            Self::new(
                "Eligible firms may receive matching grants up to HKD 10 million for automation equipment upgrades.",
                json!({
                    "instrument_type": "grant",
                    "category": "grant",
                    "confidence": 0.9,
                    "description": "matching grants for automation equipment upgrades",
                    "target_sector": "manufacturing",
                    "beneficiary": "eligible firms",
                    "funding_amount": "up to HKD 10 million",
                    "funding_amount_or_cap": "up to HKD 10 million",
                    "cost_share_or_matching": "matching",
                    "enforceability": "binding",
                    "eligibility_rules": ["eligible firms", "automation equipment upgrades"],
                    "evidence_spans": ["matching grants up to HKD 10 million"]
                }),
            ),
            Self::new(
                "Exports of dual-use advanced chips require an export license before shipment.",
                json!({
                    "instrument_type": "export_control",
                    "category": "export_control",
                    "confidence": 0.9,
                    "description": "export licensing for dual-use advanced chips",
                    "target_sector": "semiconductors",
                    "enforceability": "binding",
                    "eligibility_rules": ["export license required"],
                    "evidence_spans": ["require an export license"]
                }),
            ),
            Self::new(
                "A tax deduction of 200% applies to qualifying R&D expenditures.",
                json!({
                    "instrument_type": "tax_credit",
                    "category": "tax_credit",
                    "confidence": 0.9,
                    "description": "enhanced tax deduction for R&D expenditure",
                    "target_sector": "R&D",
                    "enforceability": "binding",
                    "eligibility_rules": ["qualifying R&D expenditures"],
                    "evidence_spans": ["tax deduction of 200%"]
                }),
            ),
            Self::new(
                "Firms must meet 60% domestic content to qualify for incentives.",
                json!({
                    "instrument_type": "local_content",
                    "category": "local_content",
                    "confidence": 0.9,
                    "description": "domestic content threshold for incentive eligibility",
                    "enforceability": "binding",
                    "eligibility_rules": ["60% domestic content"],
                    "evidence_spans": ["60% domestic content"]
                }),
            ),
        ]
    }

    /// Output values in schema order; fields the example lacks are `null`
    pub fn project<'s>(&self, schema: &'s Schema) -> Vec<(&'s str, Value)> {
        schema
            .field_names()
            .into_iter()
            .map(|name| (name, self.output.get(name).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Whether every category-typed value in the projection is a label of
    /// `taxonomy`
    pub fn fits(&self, schema: &Schema, taxonomy: &Taxonomy) -> bool {
        schema
            .fields()
            .iter()
            .filter(|field| field.field_type == Some(FieldType::Category))
            .all(|field| match self.output.get(&field.name) {
                Some(Value::String(label)) => taxonomy.contains(label),
                _ => true,
            })
    }

    /// Compact JSON object with keys in schema order
    pub fn render_output(&self, schema: &Schema) -> String {
        let pairs: Vec<String> = self
            .project(schema)
            .into_iter()
            .map(|(name, value)| format!("{}:{}", Value::from(name), value))
            .collect();
        format!("{{{}}}", pairs.join(","))
    }
}

/// Builds the extraction prompt for one text window
///
/// The taxonomy, schema and examples are fixed for a run; only the window
/// text varies between calls, so identical windows always yield identical
/// prompts.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    taxonomy: Taxonomy,
    schema: Schema,
    examples: Vec<FewShotExample>,
}

impl PromptBuilder {
    /// Create a builder with the built-in examples
    pub fn new(taxonomy: Taxonomy, schema: Schema) -> Self {
        Self {
            taxonomy,
            schema,
            examples: FewShotExample::builtin(),
        }
    }

    /// Replace the few-shot examples
    pub fn with_examples(mut self, examples: Vec<FewShotExample>) -> Self {
        self.examples = examples;
        self
    }

    /// Taxonomy in use
    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Schema in use
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Examples that will actually be shown: those whose labels belong to the
    /// taxonomy
    pub fn active_examples(&self) -> Vec<&FewShotExample> {
        self.examples
            .iter()
            .filter(|example| example.fits(&self.schema, &self.taxonomy))
            .collect()
    }

    /// Build the complete extraction prompt for `chunk_text`
    pub fn build(&self, chunk_text: &str) -> String {
        let mut prompt = String::new();

        // 1. Task framing
        prompt.push_str(DATASET_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. Controlled vocabulary
        prompt.push_str("Use the following category choices exactly as provided:\n");
        for category in self.taxonomy.categories() {
            if category.definition.is_empty() {
                prompt.push_str(&format!("- {}\n", category.category));
            } else {
                prompt.push_str(&format!("- {}: {}\n", category.category, category.definition));
            }
        }
        prompt.push('\n');

        // 3. Output fields
        prompt.push_str(
            "Return ONLY valid JSON with the following keys (use null or empty list when missing):\n",
        );
        for field in self.schema.fields() {
            match &field.field_type {
                Some(field_type) => prompt.push_str(&format!(
                    "- {}: {}\n",
                    field.name,
                    field_type.describe(&self.taxonomy)
                )),
                None => prompt.push_str(&format!("- {}\n", field.name)),
            }
        }
        prompt.push('\n');

        // 4. Rules
        prompt.push_str(BASE_RULES);
        prompt.push('\n');
        if self.schema.contains("evidence_spans") {
            prompt.push_str(
                "- evidence_spans must be exact quotes (<= 20 words) copied verbatim from the text.\n",
            );
        }
        if self.taxonomy.contains("other") {
            prompt.push_str("- If the text is only strategy, vision or narrative, or unclear, use \"other\".\n");
        }
        prompt.push('\n');

        // 5. Few-shot examples
        let examples = self.active_examples();
        if !examples.is_empty() {
            prompt.push_str("Examples (illustrative):\n");
            for example in examples {
                prompt.push_str(&format!(
                    "Text: \"{}\"\nJSON: {}\n\n",
                    example.text,
                    example.render_output(&self.schema)
                ));
            }
        }

        // 6. The window itself
        prompt.push_str("Now process the next text.\n\nText:\n");
        prompt.push_str(chunk_text);
        prompt.push_str("\n\nReturn ONLY JSON:\n");

        prompt
    }
}

/// Compose an extraction prompt in one call
pub fn build_prompt(
    chunk_text: &str,
    taxonomy: &Taxonomy,
    schema: &Schema,
    few_shot_examples: &[FewShotExample],
) -> String {
    PromptBuilder::new(taxonomy.clone(), schema.clone())
        .with_examples(few_shot_examples.to_vec())
        .build(chunk_text)
}
