//! Session and capability gating of the internal pages.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use kiezbett_core::Role;
use kiezbett_integration_tests::{TestContext, order, orders_body};
use mockito::Matcher;

async fn mock_list(ctx: &mut TestContext, state: &str, body: String) -> mockito::Mock {
    ctx.server
        .mock("GET", TestContext::backend_path("/orders").as_str())
        .match_query(Matcher::UrlEncoded("state".into(), state.into()))
        .match_header("authorization", "Bearer jwt-integration")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_internal_pages_require_a_session() {
    let mut ctx = TestContext::signed_out().await;
    let backend = ctx
        .server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    for path in ["/", "/orders/paid", "/order/o-1", "/links/global"] {
        let response = ctx.get(path).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
    }
    backend.assert_async().await;
}

#[tokio::test]
async fn test_health_needs_no_session() {
    let ctx = TestContext::signed_out().await;
    let response = ctx.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_dashboard_counts_categories() {
    let mut ctx = TestContext::signed_in(Role::Viewer).await;
    let open = mock_list(
        &mut ctx,
        "open",
        orders_body(&[
            order("o-1", "1001", "open", Some("paid"), None),
            order("o-2", "1002", "open", Some("open"), None),
            order("o-3", "1003", "open", Some("paid"), None),
        ]),
    )
    .await;
    mock_list(
        &mut ctx,
        "in_progress",
        orders_body(&[
            order("o-4", "1004", "in_progress", Some("paid"), Some("open")),
            order("o-5", "1005", "in_progress", Some("paid"), Some("shipped")),
        ]),
    )
    .await;
    mock_list(&mut ctx, "completed", orders_body(&[])).await;

    let response = ctx.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Bezahlt"));
    assert!(response.body.contains(r#"href="/orders/paid""#));
    // Viewers do not see the global link page.
    assert!(!response.body.contains("/links/global"));
    open.assert_async().await;
}

#[tokio::test]
async fn test_category_page_lists_matching_orders() {
    let mut ctx = TestContext::signed_in(Role::Editor).await;
    mock_list(
        &mut ctx,
        "open",
        orders_body(&[
            order("o-1", "1001", "open", Some("paid"), None),
            order("o-2", "1002", "open", Some("open"), None),
        ]),
    )
    .await;

    let response = ctx.get("/orders/paid").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("1001"));
    assert!(!response.body.contains("1002"));
    // Editors get transition buttons.
    assert!(response.body.contains(r#"action="/order/o-1/transition""#));
}

#[tokio::test]
async fn test_viewer_sees_no_transition_buttons() {
    let mut ctx = TestContext::signed_in(Role::Viewer).await;
    mock_list(
        &mut ctx,
        "open",
        orders_body(&[order("o-1", "1001", "open", Some("paid"), None)]),
    )
    .await;

    let response = ctx.get("/orders/paid").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("/transition"));
}

#[tokio::test]
async fn test_unknown_category_is_not_found() {
    let ctx = TestContext::signed_in(Role::Viewer).await;
    let response = ctx.get("/orders/lost").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pages_carry_security_headers() {
    let ctx = TestContext::signed_out().await;
    let response = ctx.get("/health").await;
    assert_eq!(response.headers["x-frame-options"], "DENY");
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
    assert_eq!(response.headers["x-robots-tag"], "noindex, nofollow");
}

#[tokio::test]
async fn test_backend_failure_is_bad_gateway() {
    let mut ctx = TestContext::signed_in(Role::Viewer).await;
    ctx.server
        .mock("GET", TestContext::backend_path("/orders").as_str())
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"database unavailable"}"#)
        .create_async()
        .await;

    let response = ctx.get("/orders/open").await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body, "database unavailable");
}
