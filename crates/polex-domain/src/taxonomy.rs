//! Taxonomy and schema module - the controlled vocabulary and output shape
//!
//! A taxonomy is supplied once per pipeline run and injected into every
//! extraction prompt. The schema drives both the prompt's field list and the
//! columns of the output table.

use serde::{Deserialize, Serialize};

/// One instrument category label with an optional definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Label the model must use verbatim (e.g. `"grant"`)
    pub category: String,

    /// Short definition shown to the model; empty when unknown
    #[serde(default)]
    pub definition: String,
}

impl Category {
    /// Create a category with a definition
    pub fn new(category: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            definition: definition.into(),
        }
    }

    /// Create a category without a definition
    pub fn label(category: impl Into<String>) -> Self {
        Self::new(category, "")
    }
}

/// Labels of the built-in taxonomy, in prompt order
pub const BUILTIN_CATEGORIES: [&str; 9] = [
    "subsidy",
    "tax_credit",
    "grant",
    "loan",
    "export_control",
    "local_content",
    "procurement",
    "standard",
    "other",
];

/// Ordered set of category labels; immutable within a run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    categories: Vec<Category>,
}

impl Taxonomy {
    /// Build a taxonomy, dropping blank labels and repeated labels
    /// (first occurrence wins)
    pub fn new(categories: Vec<Category>) -> Self {
        let mut kept: Vec<Category> = Vec::with_capacity(categories.len());
        for category in categories {
            let label = category.category.trim();
            if label.is_empty() || kept.iter().any(|c| c.category == label) {
                continue;
            }
            kept.push(Category::new(label, category.definition.trim()));
        }
        Self { categories: kept }
    }

    /// Build a taxonomy from bare labels
    ///
    /// # Examples
    ///
    /// ```
    /// use polex_domain::Taxonomy;
    ///
    /// let taxonomy = Taxonomy::from_labels(["grant", "tax_credit", "other"]);
    /// assert_eq!(taxonomy.labels(), vec!["grant", "tax_credit", "other"]);
    /// ```
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(labels.into_iter().map(Category::label).collect())
    }

    /// The built-in nine-category instrument taxonomy
    pub fn builtin() -> Self {
        let definitions = [
            "financial support that may include rebates, price support or general aid",
            "tax deduction, credit or allowance tied to expenditures or investment",
            "non-repayable funding support, often with a cap",
            "repayable financing or concessional credit",
            "licensing, export restriction or dual-use controls",
            "domestic content, sourcing or production requirements",
            "government purchasing preference or requirements",
            "technical, quality or compliance standards",
            "strategy, vision or narrative without a concrete instrument, or unclear",
        ];
        Self::new(
            BUILTIN_CATEGORIES
                .iter()
                .zip(definitions)
                .map(|(label, definition)| Category::new(*label, definition))
                .collect(),
        )
    }

    /// Categories in prompt order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category labels in prompt order
    pub fn labels(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.category.as_str()).collect()
    }

    /// Whether `label` is one of the categories
    pub fn contains(&self, label: &str) -> bool {
        self.categories.iter().any(|c| c.category == label)
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether the taxonomy has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Expected type of a schema field, rendered into the prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A string, or null when absent
    Text,

    /// A number
    Number,

    /// A list of strings, empty when absent
    TextList,

    /// One of a fixed set of values
    Enum(Vec<String>),

    /// One of the active taxonomy's labels
    Category,
}

impl FieldType {
    /// Render the type tag as shown to the model
    pub fn describe(&self, taxonomy: &Taxonomy) -> String {
        match self {
            FieldType::Text => "string|null".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::TextList => "list[string]".to_string(),
            FieldType::Enum(values) => format!("one of {}", quoted_list(values)),
            FieldType::Category => format!("one of {}", quoted_list(&taxonomy.labels())),
        }
    }
}

fn quoted_list<S: AsRef<str>>(values: &[S]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

/// A named output field with an optional type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// JSON key the model must emit
    pub name: String,

    /// Expected type, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
}

impl FieldSpec {
    /// Untyped field
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: None,
        }
    }

    /// Typed field
    pub fn typed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type: Some(field_type),
        }
    }
}

/// Ordered list of output fields
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Build a schema, dropping blank and repeated field names
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        let mut kept: Vec<FieldSpec> = Vec::with_capacity(fields.len());
        for mut field in fields {
            field.name = field.name.trim().to_string();
            if field.name.is_empty() || kept.iter().any(|f| f.name == field.name) {
                continue;
            }
            kept.push(field);
        }
        Self { fields: kept }
    }

    /// Build an untyped schema from field names
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(FieldSpec::named).collect())
    }

    /// The six default fields used when no taxonomy artifact supplies its own
    pub fn builtin() -> Self {
        Self::new(vec![
            FieldSpec::typed("policy_name", FieldType::Text),
            FieldSpec::typed("category", FieldType::Category),
            FieldSpec::typed("description", FieldType::Text),
            FieldSpec::typed("implementing_body", FieldType::Text),
            FieldSpec::typed("target_sector", FieldType::Text),
            FieldSpec::typed("funding_amount", FieldType::Text),
        ])
    }

    /// Compact instrument schema with a confidence score and evidence spans
    pub fn instrument() -> Self {
        Self::new(vec![
            FieldSpec::typed("instrument_type", FieldType::Category),
            FieldSpec::typed("confidence", FieldType::Number),
            FieldSpec::typed("target_sector", FieldType::Text),
            FieldSpec::typed("funding_amount_or_cap", FieldType::Text),
            FieldSpec::typed("eligibility_rules", FieldType::TextList),
            FieldSpec::typed("evidence_spans", FieldType::TextList),
        ])
    }

    /// Field-rich instrument schema
    pub fn detailed() -> Self {
        Self::new(vec![
            FieldSpec::typed("instrument_name", FieldType::Text),
            FieldSpec::typed("instrument_type", FieldType::Category),
            FieldSpec::typed("administering_agency", FieldType::Text),
            FieldSpec::typed("target_sector", FieldType::Text),
            FieldSpec::typed("beneficiary", FieldType::Text),
            FieldSpec::typed("funding_amount_or_cap", FieldType::Text),
            FieldSpec::typed("cost_share_or_matching", FieldType::Text),
            FieldSpec::typed("eligibility_rules", FieldType::TextList),
            FieldSpec::typed("application_process", FieldType::TextList),
            FieldSpec::typed(
                "enforceability",
                FieldType::Enum(vec![
                    "binding".to_string(),
                    "nonbinding".to_string(),
                    "unclear".to_string(),
                ]),
            ),
            FieldSpec::typed("evidence_spans", FieldType::TextList),
        ])
    }

    /// Fields in output order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Field names in output order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Whether the schema declares `name`
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
