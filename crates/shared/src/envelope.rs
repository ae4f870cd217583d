//! Uniform response envelope returned by every remote endpoint.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("response body is neither an envelope nor an array: {0}")]
    Shape(String),
    #[error("failed to decode envelope data: {0}")]
    Data(#[from] serde_json::Error),
}

/// `{ success, message, data?, count? }`
///
/// A body without a `success` field is treated as successful; only an
/// explicit `false` is a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default = "accepted")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

fn accepted() -> bool {
    true
}

impl Envelope {
    /// A successful envelope carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            message: String::new(),
            data: Some(data),
            count: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            count: None,
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Interpret a raw response body.
    ///
    /// Some endpoints answer with a bare JSON array instead of an envelope;
    /// such a body is accepted as a successful envelope wrapping the array.
    pub fn from_body(body: Value) -> Result<Self, EnvelopeError> {
        match body {
            Value::Array(_) => Ok(Self::ok(body)),
            Value::Object(_) => Ok(serde_json::from_value(body)?),
            other => Err(EnvelopeError::Shape(other.to_string())),
        }
    }

    /// Decode `data` as `T`. A missing or null `data` decodes as `T`'s
    /// representation of `null`, so `Option<_>` targets yield `None`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        let data = self.data.clone().unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Decode `data` as a list; a missing `data` is an empty list.
    pub fn list_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, EnvelopeError> {
        match &self.data {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(data) => Ok(serde_json::from_value(data.clone())?),
        }
    }

    /// Server message, or `fallback` when the server sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        if self.message.trim().is_empty() {
            fallback.to_string()
        } else {
            self.message.clone()
        }
    }
}
