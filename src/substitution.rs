// invoice-design-service/src/substitution.rs

//! Per-render substitution data: labels, values and line-item rows.
//!
//! Everything here is built fresh for one render and dropped afterwards.
//! Ordered maps keep iteration (and therefore any serialized output)
//! byte-for-byte stable.

use serde::Serialize;
use std::collections::BTreeMap;

/// Non-fatal problem found while resolving placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionWarning {
    pub placeholder: String,
    pub reason: String,
}

impl std::fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.placeholder, self.reason)
    }
}

/// Label and value mappings for one document render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionSet {
    locale: String,
    labels: BTreeMap<String, String>,
    values: BTreeMap<String, String>,
    warnings: Vec<ResolutionWarning>,
}

fn placeholder_key(key: &str) -> String {
    if key.starts_with('$') {
        key.to_string()
    } else {
        format!("${}", key)
    }
}

impl SubstitutionSet {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            ..Self::default()
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Insert a label. A missing leading `$` is added.
    pub fn insert_label(&mut self, key: &str, text: impl Into<String>) {
        self.labels.insert(placeholder_key(key), text.into());
    }

    /// Insert a value. A missing leading `$` is added.
    pub fn insert_value(&mut self, key: &str, text: impl Into<String>) {
        self.values.insert(placeholder_key(key), text.into());
    }

    pub fn with_value(mut self, key: &str, text: impl Into<String>) -> Self {
        self.insert_value(key, text);
        self
    }

    pub fn with_label(mut self, key: &str, text: impl Into<String>) -> Self {
        self.insert_label(key, text);
        self
    }

    pub fn warn(&mut self, placeholder: &str, reason: impl Into<String>) {
        self.warnings.push(ResolutionWarning {
            placeholder: placeholder_key(placeholder),
            reason: reason.into(),
        });
    }

    /// Combined lookup. Values shadow labels with the same key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .or_else(|| self.labels.get(key))
            .map(String::as_str)
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn warnings(&self) -> &[ResolutionWarning] {
        &self.warnings
    }
}

/// One formatted row of a document's itemized content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineItemRow {
    fields: BTreeMap<String, String>,
}

impl LineItemRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<String>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// Ordered rows expanded by `@foreach($line_items as ...)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineItemContext {
    rows: Vec<LineItemRow>,
}

impl LineItemContext {
    pub fn new(rows: Vec<LineItemRow>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[LineItemRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
