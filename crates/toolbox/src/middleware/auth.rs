//! Actor extraction and capability checks.
//!
//! The toolbox acts with the operator session on disk; there is no login
//! page. Internal routes extract the session's actor and then check the
//! capability they need.

use axum::{extract::FromRequestParts, http::request::Parts};
use kiezbett_core::{Actor, Capability};

use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires a signed-in operator.
///
/// Rejects with 401 when there is no session or it has expired.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     State(state): State<AppState>,
///     actor: RequireActor,
/// ) -> Result<Html<String>, AppError> {
///     actor.require(&state, Capability::ViewOrders)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireActor(pub Actor);

impl RequireActor {
    /// Fail with 403 unless the actor holds `capability`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` naming the missing capability.
    pub fn require(&self, state: &AppState, capability: Capability) -> Result<(), AppError> {
        if state.capabilities().has_capability(&self.0, capability) {
            Ok(())
        } else {
            tracing::warn!(actor = %self.0.id, %capability, "Capability check failed");
            Err(AppError::Forbidden(capability))
        }
    }

    /// Whether the actor holds `capability`, for hiding affordances.
    #[must_use]
    pub fn can(&self, state: &AppState, capability: Capability) -> bool {
        state.capabilities().has_capability(&self.0, capability)
    }
}

impl FromRequestParts<AppState> for RequireActor {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let actor = state.session().actor().await?;
        set_sentry_user(&actor);
        tracing::Span::current().record("actor", tracing::field::display(&actor.id));
        Ok(Self(actor))
    }
}
