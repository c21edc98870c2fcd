//! HTTP plumbing shared by all backend operations.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, header};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::{ApiErrorKind, BackendError};
use crate::config::BackendConfig;
use crate::session::SessionManager;

/// Whether a request carries the operator's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Authenticated with the current session.
    Session,
    /// Unauthenticated (token resolution).
    Public,
}

/// Client for the backend's serverless functions.
///
/// Cheap to clone; clones share the HTTP connection pool and the session.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    functions_url: Url,
    anon_key: Option<SecretString>,
    session: SessionManager,
}

/// Error body returned by the functions.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl BackendClient {
    /// Create a client for `config`, authenticating with `session`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` if the HTTP client cannot be built or the
    /// configured URL cannot carry a path.
    pub fn new(config: &BackendConfig, session: SessionManager) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                BackendError::api(
                    ApiErrorKind::Transport,
                    format!("Failed to create HTTP client: {e}"),
                )
            })?;
        let functions_url = Url::parse(&config.functions_url()).map_err(|e| {
            BackendError::api(ApiErrorKind::Transport, format!("Invalid backend URL: {e}"))
        })?;
        if functions_url.cannot_be_a_base() {
            return Err(BackendError::api(
                ApiErrorKind::Transport,
                "Invalid backend URL: cannot carry a path",
            ));
        }

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                functions_url,
                anon_key: config.anon_key.clone(),
                session,
            }),
        })
    }

    /// The session this client authenticates with.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Absolute URL of a function path; segments are percent-encoded.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.inner.functions_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start a request, attaching the bearer token for [`Access::Session`].
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` when a session is required but missing or
    /// expired; no request is sent in that case.
    pub(crate) async fn request(
        &self,
        method: Method,
        segments: &[&str],
        access: Access,
    ) -> Result<RequestBuilder, BackendError> {
        let mut builder = self
            .inner
            .client
            .request(method, self.endpoint(segments))
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(key) = &self.inner.anon_key {
            builder = builder.header("apikey", key.expose_secret());
        }
        if access == Access::Session {
            let auth = self.inner.session.auth_header().await?;
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        Ok(builder)
    }

    /// Send and decode a successful JSON response.
    ///
    /// Non-success statuses become `BackendError::Api` carrying the body's
    /// `message` field, or `fallback` when there is none.
    pub(crate) async fn call<T: DeserializeOwned>(
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<T, BackendError> {
        let response = Self::send(builder, fallback).await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response, fallback).await);
        }
        Self::decode(response, fallback).await
    }

    /// Send without interpreting the status.
    pub(crate) async fn send(
        builder: RequestBuilder,
        fallback: &str,
    ) -> Result<Response, BackendError> {
        builder
            .send()
            .await
            .map_err(|e| transport_error(&e, fallback))
    }

    /// Build the error for a non-success response.
    pub(crate) async fn error_from(response: Response, fallback: &str) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| fallback.to_string());

        tracing::warn!(status, message = %message, "Backend returned error status");
        BackendError::api(ApiErrorKind::Status(status), message)
    }

    /// Decode a JSON body.
    pub(crate) async fn decode<T: DeserializeOwned>(
        response: Response,
        fallback: &str,
    ) -> Result<T, BackendError> {
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(&e, fallback))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to decode backend response"
            );
            BackendError::api(ApiErrorKind::Decode, format!("{fallback}: {e}"))
        })
    }
}

/// `message` field of an error body, if present and non-blank.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
}

fn transport_error(e: &reqwest::Error, fallback: &str) -> BackendError {
    let kind = if e.is_timeout() {
        ApiErrorKind::Timeout
    } else if e.is_decode() {
        ApiErrorKind::Decode
    } else {
        ApiErrorKind::Transport
    };
    tracing::error!(error = %e, kind = %kind, "Backend request failed");
    BackendError::api(kind, format!("{fallback}: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(url: &str) -> BackendClient {
        let config = BackendConfig::new(url).unwrap();
        BackendClient::new(&config, SessionManager::new("unused-session.json")).unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes_segments() {
        let client = client("https://abc.supabase.co");
        assert_eq!(
            client.endpoint(&["orders", "0190a1", "state"]).as_str(),
            "https://abc.supabase.co/functions/v1/orders/0190a1/state"
        );
        assert_eq!(
            client.endpoint(&["order-links", "a/b c"]).as_str(),
            "https://abc.supabase.co/functions/v1/order-links/a%2Fb%20c"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Order not found"}"#).as_deref(),
            Some("Order not found")
        );
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
        assert_eq!(error_message(r#"{"error":"boom"}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[tokio::test]
    async fn test_session_request_without_session_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = client(&server.url())
            .request(Method::GET, &["orders"], Access::Session)
            .await;

        assert!(matches!(result, Err(BackendError::Auth(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anon_key_header_is_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/functions/v1/order-links/public-order/tok")
            .match_header("apikey", "anon-key-value")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let mut config = BackendConfig::new(&server.url()).unwrap();
        config.anon_key = Some(SecretString::from("anon-key-value"));
        let client = BackendClient::new(&config, SessionManager::new("unused.json")).unwrap();

        let builder = client
            .request(
                Method::GET,
                &["order-links", "public-order", "tok"],
                Access::Public,
            )
            .await
            .unwrap();
        let value: serde_json::Value = BackendClient::call(builder, "fallback").await.unwrap();
        assert!(value.is_object());
        mock.assert_async().await;
    }
}
