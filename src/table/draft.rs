use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::row::Row;

/// A pending value for one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// A newly chosen file for a `File` column
    File(PathBuf),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Value(Value::String(value.into()))
    }

    /// Checkbox fields always emit the "1"/"0" sentinels
    pub fn checkbox(checked: bool) -> Self {
        FieldValue::text(if checked { "1" } else { "0" })
    }

    /// Null and blank strings count as "not set"
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Value(Value::Null) => true,
            FieldValue::Value(Value::String(s)) => s.trim().is_empty(),
            FieldValue::Value(_) => false,
            FieldValue::File(path) => path.as_os_str().is_empty(),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::File(_) => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Value(v) => v.serialize(serializer),
            FieldValue::File(path) => path.serialize(serializer),
        }
    }
}

/// Column key to pending value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Draft(BTreeMap<String, FieldValue>);

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a draft with every value of an existing row
    pub fn from_row(row: &Row) -> Self {
        Self(
            row.iter()
                .map(|(k, v)| (k.clone(), FieldValue::Value(v.clone())))
                .collect(),
        )
    }

    pub fn set(&mut self, key: &str, value: FieldValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Copy without null or blank entries
    pub fn sanitized(&self) -> Draft {
        Draft(
            self.0
                .iter()
                .filter(|(_, v)| !v.is_blank())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// JSON body for the draft, or the first key holding a file
    pub fn to_json(&self) -> Result<Map<String, Value>, String> {
        self.0
            .iter()
            .map(|(k, v)| match v {
                FieldValue::Value(value) => Ok((k.clone(), value.clone())),
                FieldValue::File(_) => Err(k.clone()),
            })
            .collect()
    }
}

impl FromIterator<(String, FieldValue)> for Draft {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Draft(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sanitized_drops_null_and_blank() {
        let mut draft = Draft::new();
        draft.set("name", FieldValue::text("Oak"));
        draft.set("price", FieldValue::text("  "));
        draft.set("note", FieldValue::Value(Value::Null));
        draft.set("stock", FieldValue::Value(json!(0)));
        let clean = draft.sanitized();
        assert_eq!(clean.len(), 2);
        assert!(clean.contains("name"));
        assert!(clean.contains("stock"), "zero is a real value");
    }

    #[test]
    fn from_row_keeps_types() {
        let row = json!({"id": 3, "active": true}).as_object().cloned().unwrap();
        let draft = Draft::from_row(&row);
        assert_eq!(draft.get("id"), Some(&FieldValue::Value(json!(3))));
        assert_eq!(serde_json::to_value(&draft).unwrap(), json!({"id": 3, "active": true}));
    }

    #[test]
    fn to_json_reports_file_fields() {
        let mut draft = Draft::new();
        draft.set("name", FieldValue::text("Oak"));
        assert!(draft.to_json().is_ok());
        draft.set("image_path", FieldValue::File(PathBuf::from("/tmp/oak.png")));
        assert_eq!(draft.to_json().unwrap_err(), "image_path");
    }

    #[test]
    fn checkbox_emits_sentinels() {
        assert_eq!(FieldValue::checkbox(true), FieldValue::text("1"));
        assert_eq!(FieldValue::checkbox(false), FieldValue::text("0"));
    }
}
