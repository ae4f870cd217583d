//! Store layer error types
//!
//! Every store operation resolves to a snapshot update or one of these
//! errors. The same error is also rendered with [`StoreError::user_message`]
//! into the owning store's `error` field, where it stays until the screen
//! layer clears it.

use fixdesk_domain::EngineerId;
use fixdesk_shared::EnvelopeError;

use crate::ports::GatewayError;

/// Authentication failures. Display strings are shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Token verification failed")]
    TokenRejected,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// The gateway call could not complete.
    #[error("Failed to {action}: {source}")]
    Gateway {
        action: &'static str,
        #[source]
        source: GatewayError,
    },

    /// The remote answered with `success: false`.
    #[error("{message}")]
    Rejected {
        action: &'static str,
        message: String,
    },

    /// The envelope arrived but its data could not be decoded.
    #[error("Failed to {action}: {message}")]
    Parse {
        action: &'static str,
        message: String,
    },

    #[error("Engineer {0} is not in the roster")]
    UnknownEngineer(EngineerId),
}

impl StoreError {
    pub fn gateway(action: &'static str, source: GatewayError) -> Self {
        Self::Gateway { action, source }
    }

    pub fn parse(action: &'static str, source: EnvelopeError) -> Self {
        Self::Parse {
            action,
            message: source.to_string(),
        }
    }

    /// Message surfaced in the store's `error` field.
    ///
    /// Prefers the server's own message and falls back to
    /// "Failed to <action>".
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Gateway { action, source } => source
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Failed to {action}")),
            StoreError::Parse { action, .. } => format!("Failed to {action}"),
            other => other.to_string(),
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, StoreError::Auth(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_errors_prefer_the_server_message() {
        let with_message = StoreError::gateway(
            "delete service",
            GatewayError::Status {
                status: 409,
                message: "Service has bookings".into(),
            },
        );
        assert_eq!(with_message.user_message(), "Service has bookings");

        let transport = StoreError::gateway("delete service", GatewayError::Transport("refused".into()));
        assert_eq!(transport.user_message(), "Failed to delete service");
    }

    #[test]
    fn auth_failures_render_operator_messages() {
        let error = StoreError::from(AuthFailure::InvalidCredentials);
        assert!(error.is_auth());
        assert_eq!(error.user_message(), "Invalid username or password");
    }
}
