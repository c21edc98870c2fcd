//! Public order pages reached through deep links.
//!
//! These routes take no session. The token in the path is the only
//! credential and is never logged in full.

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kiezbett_core::{LinkToken, TokenInfo};
use tracing::instrument;

use super::render;
use super::views::{OrderDetailView, format_datetime};
use crate::{backend::BackendError, error::AppError, state::AppState};

/// Token facts shown under a public page.
#[derive(Debug, Clone)]
pub struct TokenInfoView {
    pub expires_at: String,
    pub used_count: u64,
}

impl From<&TokenInfo> for TokenInfoView {
    fn from(info: &TokenInfo) -> Self {
        Self {
            expires_at: format_datetime(&info.expires_at),
            used_count: info.used_count,
        }
    }
}

/// One order through a single-order link.
#[derive(Template)]
#[template(path = "public/order.html")]
pub struct PublicOrderTemplate {
    pub order: OrderDetailView,
    pub token_info: TokenInfoView,
}

/// All orders through a global link.
#[derive(Template)]
#[template(path = "public/orders.html")]
pub struct PublicOrdersTemplate {
    pub orders: Vec<OrderDetailView>,
    pub token_info: TokenInfoView,
}

/// Shown for unknown, expired and revoked links.
#[derive(Template)]
#[template(path = "public/invalid.html")]
pub struct LinkInvalidTemplate;

/// Turn a resolution failure into a page. Dead links get the friendly 410.
fn failure(err: AppError) -> Response {
    match err {
        AppError::Backend(BackendError::TokenInvalid) | AppError::Validation(_) => {
            (StatusCode::GONE, render(&LinkInvalidTemplate)).into_response()
        }
        other => other.into_response(),
    }
}

/// Public page for a single-order link.
#[instrument(skip_all)]
pub async fn order(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let result = match LinkToken::parse(&token) {
        Ok(token) => state.links().resolve_order(&token).await,
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(resolved) => render(&PublicOrderTemplate {
            order: OrderDetailView::new(&resolved.order, false),
            token_info: TokenInfoView::from(&resolved.token_info),
        })
        .into_response(),
        Err(err) => failure(err),
    }
}

/// Public page for a global link.
#[instrument(skip_all)]
pub async fn orders(State(state): State<AppState>, Path(token): Path<String>) -> Response {
    let result = match LinkToken::parse(&token) {
        Ok(token) => state.links().resolve_orders(&token).await,
        Err(err) => Err(err.into()),
    };

    match result {
        Ok(resolved) => render(&PublicOrdersTemplate {
            orders: resolved
                .orders
                .iter()
                .map(|order| OrderDetailView::new(order, false))
                .collect(),
            token_info: TokenInfoView::from(&resolved.token_info),
        })
        .into_response(),
        Err(err) => failure(err),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use kiezbett_core::ValidationError;

    use super::*;

    #[tokio::test]
    async fn test_invalid_token_renders_gone_page() {
        let response = failure(AppError::Backend(BackendError::TokenInvalid));
        assert_eq!(response.status(), StatusCode::GONE);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap_or_default();
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("nicht mehr gültig"));
    }

    #[test]
    fn test_blank_token_is_gone_not_bad_request() {
        let response = failure(AppError::Validation(ValidationError::EmptyToken));
        assert_eq!(response.status(), StatusCode::GONE);
    }

    #[test]
    fn test_backend_failure_keeps_its_status() {
        let response = failure(AppError::Backend(BackendError::api(
            crate::backend::ApiErrorKind::Status(500),
            "Error fetching order",
        )));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
