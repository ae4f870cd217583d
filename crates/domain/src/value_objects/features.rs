//! Ordered service feature list with tolerant decoding.
//!
//! Older service records stored their feature list double-encoded: a single
//! element holding the JSON text of the real array (`["[\"A\",\"B\"]"]`).
//! Decoding unwraps such elements instead of rejecting them; a one-element
//! inner array becomes its scalar, longer arrays are joined with ", ".

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Features(Vec<String>);

impl Features {
    /// Build from raw entries, applying the same tolerance as decoding.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(|entry| unwrap_encoded(entry.into()))
                .filter(|entry| !entry.trim().is_empty())
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encoding used by the multipart `features` field: a JSON array of the
    /// non-blank entries.
    pub fn to_form_value(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl<'de> Deserialize<'de> for Features {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Self::new(raw.into_iter().map(value_text)))
    }
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn unwrap_encoded(entry: String) -> String {
    if !entry.starts_with('[') {
        return entry;
    }
    match serde_json::from_str::<Vec<Value>>(&entry) {
        Ok(inner) => inner
            .into_iter()
            .map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Err(_) => entry,
    }
}
