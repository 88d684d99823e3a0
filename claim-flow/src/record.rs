use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WizardError;

/// Field values collected on one form, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord {
    fields: Map<String, Value>,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of a field, if it holds one
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Shallow merge: keys in `partial` overwrite, everything else survives.
    pub fn merge(&mut self, partial: FormRecord) {
        for (key, value) in partial.fields {
            self.fields.insert(key, value);
        }
    }

    /// Drops every key listed in `keys`, returning how many were present.
    pub fn retain_keys_not_in(&mut self, keys: &[&str]) -> usize {
        let before = self.fields.len();
        self.fields.retain(|key, _| !keys.contains(&key.as_str()));
        before - self.fields.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for FormRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl TryFrom<Value> for FormRecord {
    type Error = WizardError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(WizardError::NotAnObject),
        }
    }
}

impl From<FormRecord> for Value {
    fn from(record: FormRecord) -> Self {
        Value::Object(record.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> FormRecord {
        FormRecord::try_from(value).unwrap()
    }

    #[test]
    fn test_merge_later_keys_win_and_untouched_keys_survive() {
        let mut data = record(json!({"a": 1, "b": "x"}));
        data.merge(record(json!({"b": "y", "c": true})));

        assert_eq!(data, record(json!({"a": 1, "b": "y", "c": true})));
    }

    #[test]
    fn test_retain_keys_not_in() {
        let mut data = record(json!({"keep": 1, "drop": 2, "also": 3}));
        let removed = data.retain_keys_not_in(&["drop", "also", "missing"]);

        assert_eq!(removed, 2);
        assert_eq!(data, record(json!({"keep": 1})));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(
            FormRecord::try_from(json!(["a"])),
            Err(WizardError::NotAnObject)
        ));
    }
}
