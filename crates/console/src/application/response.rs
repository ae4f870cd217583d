//! Envelope acceptance and typed decoding for store operations.

use serde::de::DeserializeOwned;

use fixdesk_shared::Envelope;

use super::StoreError;
use crate::ports::GatewayError;

/// Turn a gateway result into an accepted envelope.
///
/// Transport failures become [`StoreError::Gateway`]; an envelope with
/// `success: false` becomes [`StoreError::Rejected`] carrying the server
/// message or "Failed to <action>".
pub fn accept(
    result: Result<Envelope, GatewayError>,
    action: &'static str,
) -> Result<Envelope, StoreError> {
    let envelope = result.map_err(|source| StoreError::gateway(action, source))?;
    if envelope.success {
        Ok(envelope)
    } else {
        Err(StoreError::Rejected {
            action,
            message: envelope.message_or(&format!("Failed to {action}")),
        })
    }
}

/// Helper trait for decoding an accepted envelope's data.
pub trait ParseEnvelope {
    /// Decode `data` as a list; missing data is an empty list.
    fn parse_list<T: DeserializeOwned>(&self, action: &'static str) -> Result<Vec<T>, StoreError>;

    /// Decode `data` as a single entity; missing data is `None`.
    fn parse_optional<T: DeserializeOwned>(
        &self,
        action: &'static str,
    ) -> Result<Option<T>, StoreError>;
}

impl ParseEnvelope for Envelope {
    fn parse_list<T: DeserializeOwned>(&self, action: &'static str) -> Result<Vec<T>, StoreError> {
        self.list_as().map_err(|e| StoreError::parse(action, e))
    }

    fn parse_optional<T: DeserializeOwned>(
        &self,
        action: &'static str,
    ) -> Result<Option<T>, StoreError> {
        self.data_as::<Option<T>>()
            .map_err(|e| StoreError::parse(action, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn rejected_envelope_uses_fallback_message() {
        let error = accept(Ok(Envelope::rejected("")), "fetch services").unwrap_err();
        assert_eq!(error.user_message(), "Failed to fetch services");
    }

    #[test]
    fn rejected_envelope_keeps_server_message() {
        let error = accept(Ok(Envelope::rejected("Category in use")), "delete category").unwrap_err();
        assert!(matches!(error, StoreError::Rejected { action: "delete category", .. }));
        assert_eq!(error.user_message(), "Category in use");
    }

    #[test]
    fn transport_error_maps_to_gateway_error() {
        let error = accept(Err(GatewayError::Transport("down".into())), "fetch bookings").unwrap_err();
        assert!(matches!(error, StoreError::Gateway { .. }));
    }

    #[test]
    fn undecodable_data_is_a_parse_error() {
        let envelope = Envelope::ok(json!({"unexpected": true}));
        let result: Result<Vec<Value>, _> = envelope.parse_list("fetch engineers");
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }
}
