//! RequestGateway - object-safe HTTP boundary to the remote admin API
//!
//! Stores hold an `Arc<dyn RequestGateway>` and never see the transport.
//! Every call resolves to a parsed [`Envelope`] or a [`GatewayError`]; a
//! rejection carried inside the envelope (`success: false`) is not a
//! gateway error and is left to the caller.

use async_trait::async_trait;
use fixdesk_shared::{Envelope, RequestBody};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, I/O).
    #[error("transport failure: {0}")]
    Transport(String),

    /// Non-2xx response. `message` is the server's message when the body
    /// carried one, otherwise empty.
    #[error("remote returned {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body is not an envelope.
    #[error("undecodable response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::Status { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RequestGateway: Send + Sync {
    async fn get(&self, path: &str) -> Result<Envelope, GatewayError>;

    /// Multipart bodies are sent without an explicit content type.
    async fn post(&self, path: &str, body: RequestBody) -> Result<Envelope, GatewayError>;

    async fn put(&self, path: &str, body: RequestBody) -> Result<Envelope, GatewayError>;

    async fn delete(&self, path: &str) -> Result<Envelope, GatewayError>;
}

/// Source of the bearer credential attached to every gateway call.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}
