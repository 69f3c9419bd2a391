//! Core domain types for SiteCMS content records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// The value stored under one field of a [`ContentRecord`].
///
/// Serialized without a tag, so a record is a plain JSON object: strings,
/// arrays of strings, or arrays of nested objects. Anything else read from
/// the store is kept verbatim in [`FieldValue::Other`] so it survives a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A single string (text, multiline text, select).
    Text(String),
    /// An ordered list of strings.
    List(Vec<String>),
    /// An ordered list of nested records.
    Records(Vec<ContentRecord>),
    /// Data the schema does not describe.
    Other(serde_json::Value),
}

impl FieldValue {
    /// The string value, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The string list, if this is a list value. An empty array decodes as
    /// `List`, so it also answers for an empty record list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The nested records, if this is a record list (or an empty list).
    pub fn as_records(&self) -> Option<&[ContentRecord]> {
        match self {
            Self::Records(items) => Some(items),
            Self::List(items) if items.is_empty() => Some(&[]),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<ContentRecord>> for FieldValue {
    fn from(items: Vec<ContentRecord>) -> Self {
        Self::Records(items)
    }
}

// ---------------------------------------------------------------------------
// ContentRecord
// ---------------------------------------------------------------------------

/// The full set of field values for one section (or one list entry).
///
/// Persisted wholesale: a save always replaces the stored record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRecord(BTreeMap<String, FieldValue>);

impl ContentRecord {
    /// An empty record, as used for sections that were never saved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Insert or replace a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Raw access to a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Text value of a field, `""` when absent or not text.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_text).unwrap_or("")
    }

    /// String list of a field, empty when absent or not a list.
    pub fn list(&self, name: &str) -> &[String] {
        self.get(name).and_then(FieldValue::as_list).unwrap_or(&[])
    }

    /// Nested records of a field, empty when absent or not a record list.
    pub fn records(&self, name: &str) -> &[ContentRecord] {
        self.get(name).and_then(FieldValue::as_records).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_as_plain_object() {
        let record = ContentRecord::new()
            .with("title", "Hello")
            .with("tags", vec!["a".to_string(), "b".to_string()]);
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json, serde_json::json!({"title": "Hello", "tags": ["a", "b"]}));
    }

    #[test]
    fn nested_records_deserialize() {
        let json = r#"{
            "title": "Our Services",
            "services": [
                {"title": "Web Design", "features": ["Responsive", "Fast"]},
                {"title": "SEO", "features": []}
            ]
        }"#;
        let record: ContentRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(record.text("title"), "Our Services");
        let services = record.records("services");
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].list("features"), ["Responsive", "Fast"]);
        assert!(services[1].list("features").is_empty());
    }

    #[test]
    fn unknown_shapes_are_preserved() {
        let json = serde_json::json!({"title": "x", "count": 3, "flags": {"a": true}});
        let record: ContentRecord = serde_json::from_value(json.clone()).expect("deserialize");
        assert!(matches!(record.get("count"), Some(FieldValue::Other(_))));
        assert_eq!(serde_json::to_value(&record).expect("serialize"), json);
    }

    #[test]
    fn accessors_default_on_wrong_shape() {
        let record = ContentRecord::new().with("services", "[{\"legacy\": \"json text\"}]");
        assert!(record.records("services").is_empty());
        assert!(record.list("services").is_empty());
        assert_eq!(record.text("missing"), "");
    }

    #[test]
    fn empty_array_reads_as_empty_record_list() {
        let record: ContentRecord =
            serde_json::from_str(r#"{"projects": []}"#).expect("deserialize");
        assert!(record.records("projects").is_empty());
        assert_eq!(record.get("projects").and_then(FieldValue::as_records), Some(&[][..]));
    }
}
