use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::FetchError;

/// One content item: an ordered field -> value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self { Self(Map::new()) }

    /// Builder-style insert, handy for fixtures and blank rows.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> { self.0.get(field) }
    pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> { self.0.iter() }

    /// Display form of a field. Missing and null fields read as "".
    pub fn text(&self, field: &str) -> String {
        self.0.get(field).map(value_text).unwrap_or_default()
    }

    /// Truthiness of a flag field (`true`, `"true"`, `"1"`, `"si"`).
    pub fn flag(&self, field: &str) -> bool {
        match self.0.get(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "si" | "sí"),
            _ => false,
        }
    }

    /// Trims every string value in place.
    pub(crate) fn trim_strings(&mut self) {
        for value in self.0.values_mut() {
            if let Value::String(s) = value {
                let trimmed = s.trim();
                if trimmed.len() != s.len() { *s = trimmed.to_string(); }
            }
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self { Self(map) }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self { Value::Object(record.0) }
}

pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Synthetic identity for an editor row, assigned at load/add time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowKey(Uuid);

impl RowKey {
    pub(crate) fn generate() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

/// Pulls the record list out of a response document: either a top-level
/// array, or the array stored under `field` of an object document.
pub fn extract_collection(doc: Value, field: Option<&str>) -> Result<Vec<Record>, FetchError> {
    let items = match (doc, field) {
        (Value::Array(items), _) => items,
        (Value::Object(mut map), Some(field)) => match map.remove(field) {
            Some(Value::Array(items)) => items,
            Some(_) => return Err(FetchError::NotACollection),
            None => return Err(FetchError::MissingField(field.to_string())),
        },
        _ => return Err(FetchError::NotACollection),
    };
    Ok(serde_json::from_value(Value::Array(items))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_reads_primitives_and_blanks_missing() {
        let r: Record = serde_json::from_value(json!({"titulo": "Final", "orden": 3, "destacado": true, "extra": null})).unwrap();
        assert_eq!(r.text("titulo"), "Final");
        assert_eq!(r.text("orden"), "3");
        assert_eq!(r.text("destacado"), "true");
        assert_eq!(r.text("extra"), "");
        assert_eq!(r.text("nope"), "");
    }

    #[test]
    fn flag_accepts_common_spellings() {
        let r = Record::new().with("a", true).with("b", "si").with("c", "no").with("d", 1);
        assert!(r.flag("a"));
        assert!(r.flag("b"));
        assert!(!r.flag("c"));
        assert!(r.flag("d"));
        assert!(!r.flag("missing"));
    }

    #[test]
    fn fields_keep_document_order() {
        let r: Record = serde_json::from_str(r#"{"zeta": "1", "alfa": "2", "medio": "3"}"#).unwrap();
        let names: Vec<_> = r.fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alfa", "medio"]);
    }

    #[test]
    fn extract_reads_flat_and_nested_documents() {
        let flat = extract_collection(json!([{"titulo": "a"}, {"titulo": "b"}]), None).unwrap();
        assert_eq!(flat.len(), 2);

        let nested = extract_collection(json!({"eventos": [{"titulo": "x"}]}), Some("eventos")).unwrap();
        assert_eq!(nested[0].text("titulo"), "x");

        // a nested loader still accepts a bare array
        let bare = extract_collection(json!([{"titulo": "y"}]), Some("eventos")).unwrap();
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn extract_reports_shape_problems() {
        assert!(matches!(extract_collection(json!({"otros": []}), Some("eventos")), Err(FetchError::MissingField(f)) if f == "eventos"));
        assert!(matches!(extract_collection(json!({"eventos": {}}), Some("eventos")), Err(FetchError::NotACollection)));
        assert!(matches!(extract_collection(json!({"a": 1}), None), Err(FetchError::NotACollection)));
        assert!(matches!(extract_collection(json!([1, 2]), None), Err(FetchError::InvalidRecords(_))));
    }

    #[test]
    fn row_keys_are_unique() {
        assert_ne!(RowKey::generate(), RowKey::generate());
    }
}
