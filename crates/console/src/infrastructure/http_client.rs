//! reqwest-backed RequestGateway for the remote admin API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use url::Url;

use fixdesk_shared::{Envelope, FormPayload, RequestBody};

use super::config::ConsoleConfig;
use crate::ports::{CredentialProvider, GatewayError, RequestGateway};

/// HTTP client for the admin API.
///
/// Attaches `Authorization: Bearer <token>` whenever the credential
/// provider has a token.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpGateway {
    pub fn new(base_url: Url, timeout: Duration, credentials: Arc<dyn CredentialProvider>) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url,
            credentials,
        }
    }

    pub fn from_config(config: &ConsoleConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::new(config.api_url.clone(), config.request_timeout, credentials)
    }

    fn url_for(&self, path: &str) -> Result<Url, GatewayError> {
        endpoint(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, GatewayError> {
        let builder = self.client.request(method, self.url_for(path)?);
        Ok(match self.credentials.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn with_body(builder: RequestBuilder, body: RequestBody) -> Result<RequestBuilder, GatewayError> {
        match body {
            RequestBody::Json(json) => Ok(builder.json(&json)),
            // reqwest sets the multipart content type and boundary itself.
            RequestBody::Multipart(form) => Ok(builder.multipart(multipart_form(form)?)),
        }
    }

    async fn send(&self, method: Method, path: &str, builder: RequestBuilder) -> Result<Envelope, GatewayError> {
        tracing::debug!(%method, path, "Sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(%method, path, status = status.as_u16(), "Request failed");
            return Err(status_error(status.as_u16(), &text));
        }
        decode_envelope(&text)
    }
}

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn get(&self, path: &str) -> Result<Envelope, GatewayError> {
        let builder = self.request(Method::GET, path)?;
        self.send(Method::GET, path, builder).await
    }

    async fn post(&self, path: &str, body: RequestBody) -> Result<Envelope, GatewayError> {
        let builder = Self::with_body(self.request(Method::POST, path)?, body)?;
        self.send(Method::POST, path, builder).await
    }

    async fn put(&self, path: &str, body: RequestBody) -> Result<Envelope, GatewayError> {
        let builder = Self::with_body(self.request(Method::PUT, path)?, body)?;
        self.send(Method::PUT, path, builder).await
    }

    async fn delete(&self, path: &str) -> Result<Envelope, GatewayError> {
        let builder = self.request(Method::DELETE, path)?;
        self.send(Method::DELETE, path, builder).await
    }
}

/// Join `path` (which may carry a query string) onto `base`, keeping any
/// path prefix `base` already has.
fn endpoint(base: &Url, path: &str) -> Result<Url, GatewayError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| GatewayError::Transport(format!("invalid url {joined}: {e}")))
}

fn multipart_form(payload: FormPayload) -> Result<Form, GatewayError> {
    let mut form = payload
        .fields()
        .iter()
        .fold(Form::new(), |form, (name, value)| form.text(name.clone(), value.clone()));

    if let Some((name, attachment)) = payload.attachment() {
        let part = Part::bytes(attachment.bytes.clone())
            .file_name(attachment.file_name.clone())
            .mime_str(&attachment.mime_type)
            .map_err(|e| GatewayError::Transport(format!("invalid attachment type: {e}")))?;
        form = form.part(name.to_string(), part);
    }
    Ok(form)
}

/// A blank 2xx body counts as a bare success.
fn decode_envelope(text: &str) -> Result<Envelope, GatewayError> {
    if text.trim().is_empty() {
        return Ok(Envelope::ok(Value::Null));
    }
    let body: Value = serde_json::from_str(text).map_err(|e| GatewayError::Decode(e.to_string()))?;
    Envelope::from_body(body).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn status_error(status: u16, text: &str) -> GatewayError {
    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();
    GatewayError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoint_keeps_base_prefix_and_query() {
        let base = Url::parse("http://localhost:3000/").unwrap();
        let url = endpoint(&base, "/api/services/allServicesDashboard?search=fan").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/api/services/allServicesDashboard?search=fan");

        let prefixed = Url::parse("https://admin.example.com/v1").unwrap();
        let url = endpoint(&prefixed, "/api/engineer/getEngineers").unwrap();
        assert_eq!(url.path(), "/v1/api/engineer/getEngineers");
    }

    #[test]
    fn non_success_status_carries_server_message() {
        let error = status_error(409, r#"{"success": false, "message": "Category in use"}"#);
        assert_eq!(
            error,
            GatewayError::Status {
                status: 409,
                message: "Category in use".into()
            }
        );
        assert_eq!(error.server_message(), Some("Category in use"));

        let opaque = status_error(502, "<html>Bad Gateway</html>");
        assert_eq!(opaque.server_message(), None);
    }

    #[test]
    fn decodes_envelopes_arrays_and_blank_bodies() {
        let envelope = decode_envelope(r#"{"success": true, "data": [], "count": 0}"#).unwrap();
        assert_eq!(envelope.count, Some(0));

        let bare = decode_envelope(r#"[{"_id": "e1", "name": "Amit"}]"#).unwrap();
        assert!(bare.success);
        assert_eq!(bare.data, Some(json!([{"_id": "e1", "name": "Amit"}])));

        assert!(decode_envelope("   ").unwrap().success);
        assert!(matches!(decode_envelope("42"), Err(GatewayError::Decode(_))));
        assert!(matches!(decode_envelope("{oops"), Err(GatewayError::Decode(_))));
    }
}
