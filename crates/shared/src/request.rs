//! Request bodies: plain JSON or a multipart form with an optional file.

use serde::Serialize;
use serde_json::Value;

/// In-memory file attached to a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// Ordered multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
    file: Option<(String, FileAttachment)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds the field only when `value` is present.
    pub fn optional_text(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    pub fn file(mut self, name: impl Into<String>, attachment: Option<FileAttachment>) -> Self {
        self.file = attachment.map(|a| (name.into(), a));
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attachment(&self) -> Option<(&str, &FileAttachment)> {
        self.file.as_ref().map(|(name, file)| (name.as_str(), file))
    }
}

/// Body of a POST or PUT.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    /// Sent without an explicit content type so the transport sets the
    /// boundary.
    Multipart(FormPayload),
}

impl RequestBody {
    pub fn json<T: Serialize>(payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::Json(serde_json::to_value(payload)?))
    }

    pub fn empty() -> Self {
        Self::Json(Value::Object(Default::default()))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Multipart(_) => None,
        }
    }

    pub fn as_form(&self) -> Option<&FormPayload> {
        match self {
            Self::Multipart(form) => Some(form),
            Self::Json(_) => None,
        }
    }
}
