//! Deep-link token calls.
//!
//! Issuing, listing and revoking need the operator session. Resolving a
//! token is what an external viewer does and is sent without credentials;
//! the backend counts every successful resolution.

use kiezbett_core::{LinkScope, LinkToken, NewLink, OrderLinkToken};
use reqwest::{Method, StatusCode};
use tracing::instrument;

use super::client::{Access, BackendClient};
use super::types::{CreateLinkBody, CreatedLink, ResolvedOrder, ResolvedOrders, RevokeAck, TokenList};
use super::BackendError;

const CREATE_ERROR: &str = "Error creating order link";
const LIST_ERROR: &str = "Error fetching order tokens";
const REVOKE_ERROR: &str = "Error revoking token";
const RESOLVE_ORDER_ERROR: &str = "Error fetching order";
const RESOLVE_ORDERS_ERROR: &str = "Error fetching orders";

/// Statuses meaning the token does not (or no longer) grant access.
const INVALID_TOKEN_STATUSES: [StatusCode; 4] = [
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::GONE,
];

impl BackendClient {
    /// Issue a deep link.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// when the backend refuses (e.g. unknown order id).
    #[instrument(skip(self, link), fields(scope = link.scope.token_type(), ttl_days = link.ttl_days))]
    pub async fn create_link(&self, link: &NewLink) -> Result<CreatedLink, BackendError> {
        let order_id = match &link.scope {
            LinkScope::Order(id) => Some(id.as_str()),
            LinkScope::Global => None,
        };
        let request = self
            .request(Method::POST, &["order-links"], Access::Session)
            .await?
            .json(&CreateLinkBody {
                order_id,
                expiration_days: link.ttl_days,
                created_by: link.created_by.as_deref(),
                token_type: link.scope.token_type(),
            });

        let created: CreatedLink = Self::call(request, CREATE_ERROR).await?;
        tracing::info!(
            token = %created.token.redacted(),
            expires_at = %created.expires_at,
            "Deep link issued"
        );
        Ok(created)
    }

    /// Tokens issued for one order, or the global tokens.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// when the backend fails.
    #[instrument(skip(self), fields(scope = scope.lookup_key()))]
    pub async fn list_links(&self, scope: &LinkScope) -> Result<Vec<OrderLinkToken>, BackendError> {
        let request = self
            .request(
                Method::GET,
                &["order-links", "order", scope.lookup_key()],
                Access::Session,
            )
            .await?;

        let list: TokenList = Self::call(request, LIST_ERROR).await?;
        Ok(list.tokens)
    }

    /// Revoke a token.
    ///
    /// Revoking is idempotent: a token the backend no longer knows (404) or
    /// reports as gone (410) counts as revoked.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// for any other failure.
    #[instrument(skip(self, token), fields(token = %token.redacted()))]
    pub async fn revoke_link(&self, token: &LinkToken) -> Result<(), BackendError> {
        let request = self
            .request(
                Method::DELETE,
                &["order-links", token.expose()],
                Access::Session,
            )
            .await?;
        let response = Self::send(request, REVOKE_ERROR).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            tracing::info!(status = status.as_u16(), "Token already revoked");
            return Ok(());
        }
        if !status.is_success() {
            return Err(Self::error_from(response, REVOKE_ERROR).await);
        }

        // The acknowledgement body is informational only.
        let ack: RevokeAck = Self::decode(response, REVOKE_ERROR)
            .await
            .unwrap_or_default();
        tracing::info!(message = ?ack.message, "Token revoked");
        Ok(())
    }

    /// The order behind a single-order token. Unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::TokenInvalid` for unknown, expired or revoked
    /// tokens and `BackendError::Api` for other failures.
    #[instrument(skip(self, token), fields(token = %token.redacted()))]
    pub async fn resolve_order(&self, token: &LinkToken) -> Result<ResolvedOrder, BackendError> {
        self.resolve(&["order-links", "public-order", token.expose()], RESOLVE_ORDER_ERROR)
            .await
    }

    /// Every order, through a global token. Unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::TokenInvalid` for unknown, expired or revoked
    /// tokens and `BackendError::Api` for other failures.
    #[instrument(skip(self, token), fields(token = %token.redacted()))]
    pub async fn resolve_orders(&self, token: &LinkToken) -> Result<ResolvedOrders, BackendError> {
        self.resolve(&["order-links", "public-orders", token.expose()], RESOLVE_ORDERS_ERROR)
            .await
    }

    async fn resolve<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        fallback: &str,
    ) -> Result<T, BackendError> {
        let request = self.request(Method::GET, segments, Access::Public).await?;
        let response = Self::send(request, fallback).await?;
        let status = response.status();

        if INVALID_TOKEN_STATUSES.contains(&status) {
            tracing::info!(status = status.as_u16(), "Token rejected by backend");
            return Err(BackendError::TokenInvalid);
        }
        if !status.is_success() {
            return Err(Self::error_from(response, fallback).await);
        }
        Self::decode(response, fallback).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kiezbett_core::{Actor, ActorId, OrderId, Role};
    use mockito::Matcher;
    use secrecy::SecretString;

    use super::*;
    use crate::config::BackendConfig;
    use crate::session::{Session, SessionManager};

    fn session_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "kiezbett-links-{name}-{}.json",
            std::process::id()
        ))
    }

    async fn signed_in_client(server: &mockito::Server, name: &str) -> BackendClient {
        let session = SessionManager::new(session_path(name));
        session
            .save(Session {
                access_token: SecretString::from("jwt-test"),
                expires_at: None,
                actor: Actor {
                    id: ActorId::new("u-1"),
                    email: Some("ops@kiezbett.de".to_string()),
                    role: Some(Role::Admin),
                },
            })
            .await
            .unwrap();
        BackendClient::new(&BackendConfig::new(&server.url()).unwrap(), session).unwrap()
    }

    fn anonymous_client(server: &mockito::Server) -> BackendClient {
        BackendClient::new(
            &BackendConfig::new(&server.url()).unwrap(),
            SessionManager::new(session_path("anonymous")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_order_link() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/functions/v1/order-links")
            .match_body(Matcher::Json(serde_json::json!({
                "orderId": "o-1",
                "expirationDays": 7,
                "createdBy": "ops@kiezbett.de",
                "tokenType": "single"
            })))
            .with_status(200)
            .with_body(
                r#"{"success":true,"token":"tok_123","url":"https://toolbox/public/order/tok_123",
                    "expires_at":"2026-02-01T00:00:00Z","order_id":"o-1"}"#,
            )
            .create_async()
            .await;

        let client = signed_in_client(&server, "create").await;
        let link = NewLink::for_order(OrderId::new("o-1"), 7)
            .unwrap()
            .created_by("ops@kiezbett.de");
        let created = client.create_link(&link).await.unwrap();

        assert_eq!(created.token.expose(), "tok_123");
        assert_eq!(created.order_id, Some(OrderId::new("o-1")));
        mock.assert_async().await;
        client.session().clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_create_failure_uses_fallback_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/functions/v1/order-links")
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;

        let client = signed_in_client(&server, "create-fail").await;
        let err = client
            .create_link(&NewLink::global(30).unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error creating order link");
        client.session().clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_global_links_uses_marker() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/functions/v1/order-links/order/global")
            .with_status(200)
            .with_body(
                r#"{"success":true,"tokens":[{"id":"l-1","order_id":null,"token":"g1",
                    "expires_at":"2030-01-01T00:00:00Z","created_at":"2026-01-01T00:00:00Z",
                    "used_count":2}]}"#,
            )
            .create_async()
            .await;

        let client = signed_in_client(&server, "list-global").await;
        let tokens = client.list_links(&LinkScope::Global).await.unwrap();

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].scope(), LinkScope::Global);
        assert_eq!(tokens[0].used_count, 2);
        mock.assert_async().await;
        client.session().clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_treats_gone_as_success() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/functions/v1/order-links/tok_old")
            .with_status(410)
            .with_body(r#"{"message":"Token already revoked"}"#)
            .create_async()
            .await;
        server
            .mock("DELETE", "/functions/v1/order-links/tok_missing")
            .with_status(404)
            .create_async()
            .await;

        let client = signed_in_client(&server, "revoke-gone").await;
        assert!(client
            .revoke_link(&LinkToken::parse("tok_old").unwrap())
            .await
            .is_ok());
        assert!(client
            .revoke_link(&LinkToken::parse("tok_missing").unwrap())
            .await
            .is_ok());
        client.session().clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_server_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/functions/v1/order-links/tok_1")
            .with_status(500)
            .with_body("")
            .create_async()
            .await;

        let client = signed_in_client(&server, "revoke-fail").await;
        let err = client
            .revoke_link(&LinkToken::parse("tok_1").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error revoking token");
        client.session().clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_is_unauthenticated() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/functions/v1/order-links/public-order/tok_1")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(
                r#"{"success":true,
                    "order":{"id":"o-1","orderNumber":"1001","stateMachineState":{"technicalName":"open"}},
                    "token_info":{"created_at":"2026-01-01T00:00:00Z","expires_at":"2030-01-01T00:00:00Z","used_count":1}}"#,
            )
            .create_async()
            .await;

        let resolved = anonymous_client(&server)
            .resolve_order(&LinkToken::parse("tok_1").unwrap())
            .await
            .unwrap();

        assert_eq!(resolved.order.order_number, "1001");
        assert_eq!(resolved.token_info.used_count, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_maps_rejections_to_token_invalid() {
        let mut server = mockito::Server::new_async().await;
        for (token, status) in [("t401", 401), ("t403", 403), ("t404", 404), ("t410", 410)] {
            server
                .mock("GET", format!("/functions/v1/order-links/public-orders/{token}").as_str())
                .with_status(status)
                .with_body(r#"{"message":"Token expired"}"#)
                .create_async()
                .await;
        }
        server
            .mock("GET", "/functions/v1/order-links/public-orders/t500")
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;

        let client = anonymous_client(&server);
        for token in ["t401", "t403", "t404", "t410"] {
            let err = client
                .resolve_orders(&LinkToken::parse(token).unwrap())
                .await
                .unwrap_err();
            assert!(matches!(err, BackendError::TokenInvalid), "{token}");
        }

        let err = client
            .resolve_orders(&LinkToken::parse("t500").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Error fetching orders");
    }
}
