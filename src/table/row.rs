use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A fetched record: column key to raw JSON value
pub type Row = Map<String, Value>;

/// Fields consulted, in order, to identify a row
pub const ID_FIELDS: [&str; 3] = ["id", "product_id", "_id"];

/// Row identifier as sent back to the mutation endpoints.
///
/// Numeric ids stay numeric on the wire so `ids=[3,7]` round-trips as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Str(String),
}

impl RowId {
    /// First non-null of `id`, `product_id`, `_id`
    pub fn of(row: &Row) -> Option<RowId> {
        ID_FIELDS
            .iter()
            .filter_map(|field| row.get(*field))
            .find(|value| !value.is_null())
            .and_then(RowId::from_value)
    }

    pub fn from_value(value: &Value) -> Option<RowId> {
        match value {
            Value::Null => None,
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => RowId::Int(i),
                None => RowId::Str(n.to_string()),
            }),
            Value::String(s) => Some(RowId::Str(s.clone())),
            other => Some(RowId::Str(other.to_string())),
        }
    }

    /// Parse user input; integers become `Int` so they match numeric row ids
    pub fn parse(input: &str) -> RowId {
        let trimmed = input.trim();
        match trimmed.parse::<i64>() {
            Ok(i) => RowId::Int(i),
            Err(_) => RowId::Str(trimmed.to_string()),
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(i) => write!(f, "{}", i),
            RowId::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        RowId::Int(value)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        RowId::Str(value.to_string())
    }
}
