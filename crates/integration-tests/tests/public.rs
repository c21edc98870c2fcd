//! Public order pages reached through deep links.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use kiezbett_integration_tests::{TestContext, order};
use mockito::Matcher;

const TOKEN_INFO: &str = r#""token_info":{"created_at":"2026-01-01T00:00:00Z","expires_at":"2099-01-01T00:00:00Z","used_count":4,"token_type":"single"}"#;

#[tokio::test]
async fn test_public_order_needs_no_session() {
    let mut ctx = TestContext::signed_out().await;
    let body = format!(
        r#"{{"success":true,"order":{},{TOKEN_INFO}}}"#,
        order("o-1", "1001", "in_progress", Some("paid"), Some("shipped"))
    );
    let resolve = ctx
        .server
        .mock(
            "GET",
            TestContext::backend_path("/order-links/public-order/tok_1").as_str(),
        )
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let response = ctx.get("/public/order/tok_1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Bestellung 1001"));
    assert!(response.body.contains("Ada Lovelace"));
    assert!(response.body.contains("4 Aufrufe"));
    // No internal affordances on public pages.
    assert!(!response.body.contains("/transition"));
    assert!(!response.body.contains("/links"));
    resolve.assert_async().await;
}

#[tokio::test]
async fn test_public_orders_lists_everything() {
    let mut ctx = TestContext::signed_out().await;
    let body = format!(
        r#"{{"success":true,"orders":[{},{}],{TOKEN_INFO}}}"#,
        order("o-1", "1001", "open", Some("paid"), None),
        order("o-2", "1002", "completed", Some("paid"), Some("shipped")),
    );
    ctx.server
        .mock(
            "GET",
            TestContext::backend_path("/order-links/public-orders/g_1").as_str(),
        )
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let response = ctx.get("/public/orders/g_1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Bestellung 1001"));
    assert!(response.body.contains("Bestellung 1002"));
}

#[tokio::test]
async fn test_dead_links_render_gone_page() {
    let mut ctx = TestContext::signed_out().await;
    for (token, status) in [("t401", 401), ("t403", 403), ("t404", 404), ("t410", 410)] {
        ctx.server
            .mock(
                "GET",
                TestContext::backend_path(&format!("/order-links/public-order/{token}")).as_str(),
            )
            .with_status(status)
            .with_body(r#"{"message":"Token expired"}"#)
            .create_async()
            .await;

        let response = ctx.get(&format!("/public/order/{token}")).await;
        assert_eq!(response.status, StatusCode::GONE, "{token}");
        assert!(response.body.contains("nicht mehr gültig"));
    }
}

#[tokio::test]
async fn test_backend_outage_is_not_reported_as_dead_link() {
    let mut ctx = TestContext::signed_out().await;
    ctx.server
        .mock(
            "GET",
            TestContext::backend_path("/order-links/public-orders/g_1").as_str(),
        )
        .with_status(500)
        .with_body("{}")
        .create_async()
        .await;

    let response = ctx.get("/public/orders/g_1").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body, "Error fetching orders");
}
