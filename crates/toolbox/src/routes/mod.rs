//! HTTP route handlers for the toolbox.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Health check
//!
//! # Dashboard (view_orders)
//! GET  /                             - Category counts
//! GET  /orders/{category}            - Orders of one category with transition menus
//! GET  /order/{id}                   - Order detail
//!
//! # Transitions
//! POST /order/{id}/transition        - Request a transition (change_order_state)
//! GET  /order/{id}/transitions       - Backend transition graph as JSON (developer)
//!
//! # Deep links
//! GET  /order/{id}/links             - Links of one order (manage_links)
//! POST /order/{id}/links             - Issue an order link (manage_links)
//! GET  /links/global                 - Global links (manage_global_links)
//! POST /links/global                 - Issue a global link (manage_global_links)
//! POST /links/{token}/revoke         - Revoke a link
//!
//! # Public (no session)
//! GET  /public/order/{token}         - One order through a single-order link
//! GET  /public/orders/{token}        - All orders through a global link
//! ```

pub mod dashboard;
pub mod links;
pub mod orders;
pub mod public;
pub mod views;

use askama::Template;
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};

use crate::middleware::security_headers;
use crate::state::AppState;

/// Build the toolbox router.
pub fn routes() -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health))
        // Dashboard
        .route("/", get(dashboard::dashboard))
        .route("/orders/{category}", get(orders::index))
        .route("/order/{id}", get(orders::show))
        // Transitions
        .route("/order/{id}/transition", post(orders::transition))
        .route("/order/{id}/transitions", get(orders::transitions))
        // Deep links
        .route(
            "/order/{id}/links",
            get(links::order_links).post(links::create_order_link),
        )
        .route(
            "/links/global",
            get(links::global_links).post(links::create_global_link),
        )
        .route("/links/{token}/revoke", post(links::revoke))
        // Public
        .route("/public/order/{token}", get(public::order))
        .route("/public/orders/{token}", get(public::orders));

    security_headers::layers()
        .into_iter()
        .fold(router, |router, layer| router.layer(layer))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

/// Render a template, falling back to a plain error body.
pub(crate) fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Only allow same-site relative redirect targets.
pub(crate) fn safe_return_to(return_to: Option<&str>, fallback: &str) -> String {
    return_to
        .filter(|path| path.starts_with('/') && !path.starts_with("//"))
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_return_to() {
        assert_eq!(safe_return_to(Some("/orders/paid"), "/"), "/orders/paid");
        assert_eq!(safe_return_to(Some("//evil.example"), "/"), "/");
        assert_eq!(safe_return_to(Some("https://evil.example"), "/"), "/");
        assert_eq!(safe_return_to(None, "/order/o-1"), "/order/o-1");
    }
}
