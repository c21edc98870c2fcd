//! Transition requests through the order pages.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::http::StatusCode;
use kiezbett_core::Role;
use kiezbett_integration_tests::{TestContext, TestOptions, order, orders_body};
use mockito::Matcher;

#[tokio::test]
async fn test_transition_redirects_and_refreshes_list() {
    let mut ctx = TestContext::signed_in(Role::Editor).await;
    let list = ctx
        .server
        .mock("GET", TestContext::backend_path("/orders").as_str())
        .match_query(Matcher::UrlEncoded("state".into(), "open".into()))
        .with_status(200)
        .with_body(orders_body(&[order("o-1", "1001", "open", Some("open"), None)]))
        .expect(2)
        .create_async()
        .await;
    let change = ctx
        .server
        .mock(
            "POST",
            TestContext::backend_path("/orders/t-o-1/payment-state").as_str(),
        )
        .match_body(Matcher::Json(serde_json::json!({ "newState": "paid" })))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    assert_eq!(ctx.get("/orders/open").await.status, StatusCode::OK);
    // Served from cache.
    assert_eq!(ctx.get("/orders/open").await.status, StatusCode::OK);

    let response = ctx
        .post_form(
            "/order/o-1/transition",
            "axis=payment&action=paid&subject_id=t-o-1&return_to=%2Forders%2Fopen",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/orders/open"));

    // The change invalidated the cached list.
    assert_eq!(ctx.get("/orders/open").await.status, StatusCode::OK);
    change.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn test_transition_ignores_foreign_return_to() {
    let mut ctx = TestContext::signed_in(Role::Editor).await;
    ctx.server
        .mock("POST", TestContext::backend_path("/orders/o-1/state").as_str())
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let response = ctx
        .post_form(
            "/order/o-1/transition",
            "axis=order&action=process&return_to=https%3A%2F%2Fevil.example",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/order/o-1"));
}

#[tokio::test]
async fn test_viewer_cannot_transition() {
    let mut ctx = TestContext::signed_in(Role::Viewer).await;
    let backend = ctx
        .server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let response = ctx
        .post_form("/order/o-1/transition", "axis=order&action=process")
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.body.contains("change_order_state"));
    backend.assert_async().await;
}

#[tokio::test]
async fn test_unknown_action_is_rejected_before_backend() {
    let mut ctx = TestContext::signed_in(Role::Editor).await;
    let backend = ctx
        .server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let response = ctx
        .post_form("/order/o-1/transition", "axis=order&action=teleport")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = ctx
        .post_form("/order/o-1/transition", "axis=warehouse&action=process")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    backend.assert_async().await;
}

#[tokio::test]
async fn test_rejected_transition_is_bad_gateway() {
    let mut ctx = TestContext::signed_in(Role::Editor).await;
    ctx.server
        .mock("POST", TestContext::backend_path("/orders/o-1/state").as_str())
        .with_status(400)
        .with_body(r#"{"message":"Transition not allowed"}"#)
        .create_async()
        .await;

    let response = ctx
        .post_form("/order/o-1/transition", "axis=order&action=complete")
        .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(response.body, "Transition not allowed");
}

#[tokio::test]
async fn test_transition_graph_is_developer_only() {
    let ctx = TestContext::signed_in(Role::Admin).await;
    let response = ctx.get("/order/o-1/transitions?type=order").await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let mut ctx = TestContext::start(TestOptions {
        signed_in: true,
        role: Some(Role::Viewer),
        developer: true,
    })
    .await;
    ctx.server
        .mock(
            "GET",
            TestContext::backend_path("/orders/o-1/transitions").as_str(),
        )
        .match_query(Matcher::UrlEncoded("type".into(), "order".into()))
        .with_status(200)
        .with_body(
            r#"{"order":{"transitions":[
                {"actionName":"process","fromStateName":"open","toStateName":"in_progress"}
            ]}}"#,
        )
        .create_async()
        .await;

    let response = ctx.get("/order/o-1/transitions?type=order").await;
    assert_eq!(response.status, StatusCode::OK);
    let transitions: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(transitions[0]["actionName"], "process");
}
