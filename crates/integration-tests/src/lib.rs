//! Integration tests for the Kiezbett toolbox.
//!
//! Each test drives the real router in-process against a mockito server
//! standing in for the backend functions.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kiezbett-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `dashboard` - Session and capability gating, category pages
//! - `transitions` - Transition requests and cache invalidation
//! - `links` - Deep-link lifecycle through the internal pages
//! - `public` - Public order pages

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use kiezbett_core::{Actor, ActorId, Role};
use kiezbett_toolbox::config::{BackendConfig, ToolboxConfig};
use kiezbett_toolbox::routes::routes;
use kiezbett_toolbox::session::{Session, SessionManager};
use kiezbett_toolbox::state::AppState;
use secrecy::SecretString;
use tower::ServiceExt;

static NEXT_SESSION: AtomicUsize = AtomicUsize::new(0);

/// Access token stored in every signed-in test session.
pub const ACCESS_TOKEN: &str = "jwt-integration";

/// Actor id of the signed-in operator.
pub const ACTOR_ID: &str = "u-ops";

/// A toolbox router wired to a mock backend.
pub struct TestContext {
    pub server: mockito::ServerGuard,
    pub state: AppState,
    app: Router,
    session_file: PathBuf,
}

/// A collected response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Location` header of a redirect.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// Options for [`TestContext::start`].
#[derive(Debug, Default)]
pub struct TestOptions {
    /// Write a session before the toolbox starts.
    pub signed_in: bool,
    /// Role of the signed-in operator.
    pub role: Option<Role>,
    /// Grant developer tooling to the operator.
    pub developer: bool,
}

impl TestContext {
    /// Signed in with `role`.
    pub async fn signed_in(role: Role) -> Self {
        Self::start(TestOptions {
            signed_in: true,
            role: Some(role),
            developer: false,
        })
        .await
    }

    /// No session on disk.
    pub async fn signed_out() -> Self {
        Self::start(TestOptions::default()).await
    }

    pub async fn start(options: TestOptions) -> Self {
        let server = mockito::Server::new_async().await;
        let session_file = std::env::temp_dir().join(format!(
            "kiezbett-it-{}-{}.json",
            std::process::id(),
            NEXT_SESSION.fetch_add(1, Ordering::Relaxed)
        ));

        let session = SessionManager::new(&session_file);
        if options.signed_in {
            session
                .save(Session {
                    access_token: SecretString::from(ACCESS_TOKEN),
                    expires_at: None,
                    actor: Actor {
                        id: ActorId::new(ACTOR_ID),
                        email: Some("ops@kiezbett.de".to_string()),
                        role: options.role,
                    },
                })
                .await
                .expect("Failed to save test session");
        }

        let backend = BackendConfig::new(&server.url()).expect("Invalid mock server URL");
        let mut config = ToolboxConfig::local(backend, session_file.clone());
        config.base_url = "https://toolbox.test".to_string();
        if options.developer {
            config.developer_ids.push(ActorId::new(ACTOR_ID));
        }

        let state = AppState::new(config, session).expect("Failed to create application state");
        let app = routes().with_state(state.clone());

        Self {
            server,
            state,
            app,
            session_file,
        }
    }

    /// Functions path on the mock backend.
    #[must_use]
    pub fn backend_path(path: &str) -> String {
        format!("/functions/v1{path}")
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    /// POST a url-encoded form.
    pub async fn post_form(&self, path: &str, form: &str) -> TestResponse {
        self.send(Method::POST, path, Some(form.to_string())).await
    }

    async fn send(&self, method: Method, path: &str, form: Option<String>) -> TestResponse {
        let mut request = Request::builder().method(method).uri(path);
        if form.is_some() {
            request = request.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        }
        let request = request
            .body(form.map_or_else(Body::empty, Body::from))
            .expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.session_file);
    }
}

/// Order list envelope as returned by `GET /orders`.
#[must_use]
pub fn orders_body(orders: &[serde_json::Value]) -> String {
    serde_json::json!({ "orders": { "data": orders } }).to_string()
}

/// A minimal order in the given states.
#[must_use]
pub fn order(
    id: &str,
    number: &str,
    order_state: &str,
    payment_state: Option<&str>,
    delivery_state: Option<&str>,
) -> serde_json::Value {
    let mut order = serde_json::json!({
        "id": id,
        "orderNumber": number,
        "stateMachineState": { "technicalName": order_state },
    });
    if let Some(state) = payment_state {
        order["transactions"] = serde_json::json!([
            { "id": format!("t-{id}"), "stateMachineState": { "technicalName": state } }
        ]);
    }
    if let Some(state) = delivery_state {
        order["deliveries"] = serde_json::json!([{
            "id": format!("d-{id}"),
            "shippingMethod": { "name": "Lastenrad Berlin" },
            "shippingOrderAddress": { "firstName": "Ada", "lastName": "Lovelace", "city": "Berlin" },
            "stateMachineState": { "technicalName": state }
        }]);
    }
    order
}
