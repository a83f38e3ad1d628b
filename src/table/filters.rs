use std::collections::BTreeMap;

/// Sanitized filters: only entries with a non-blank value
pub type Filters = BTreeMap<String, String>;

/// Raw per-column filter inputs, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    values: BTreeMap<String, String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the raw value; an empty value removes the entry
    pub fn set(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn has_active(&self) -> bool {
        self.values.values().any(|v| is_active_value(v))
    }

    /// Entries whose trimmed value is non-empty, values kept as entered
    pub fn active(&self) -> Filters {
        self.values
            .iter()
            .filter(|(_, v)| is_active_value(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The active value for one column, if any
    pub fn active_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|v| is_active_value(v))
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

fn is_active_value(value: &str) -> bool {
    !value.trim().is_empty()
}
