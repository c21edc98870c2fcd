//! Unified error handling for the toolbox.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use kiezbett_core::{Capability, ValidationError};
use thiserror::Error;

use crate::backend::BackendError;
use crate::session::SessionError;

/// Application-level error type for the toolbox.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Malformed input, rejected before any request.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Operator lacks a capability.
    #[error("Forbidden: missing capability `{0}`")]
    Forbidden(Capability),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::Backend(BackendError::Auth(err))
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Backend(BackendError::Api { .. }) => StatusCode::BAD_GATEWAY,
            Self::Backend(BackendError::Auth(SessionError::NoSession | SessionError::Expired(_))) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Backend(BackendError::Auth(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Backend(BackendError::TokenInvalid) => StatusCode::GONE,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server-side failures with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Toolbox request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Backend(BackendError::Auth(SessionError::Io(_) | SessionError::Corrupt(_))) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Set the Sentry user context from the signed-in actor.
pub fn set_sentry_user(actor: &kiezbett_core::Actor) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(actor.id.to_string()),
            email: actor.email.clone(),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ApiErrorKind;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

        let err = AppError::Backend(BackendError::api(
            ApiErrorKind::Status(400),
            "Transition not allowed",
        ));
        assert_eq!(err.to_string(), "Transition not allowed");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Backend(BackendError::api(
                ApiErrorKind::Timeout,
                "slow"
            ))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::from(SessionError::NoSession)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Backend(BackendError::TokenInvalid)),
            StatusCode::GONE
        );
        assert_eq!(
            get_status(AppError::Forbidden(Capability::ManageGlobalLinks)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationError::EmptyToken)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_forbidden_names_capability() {
        let err = AppError::Forbidden(Capability::Developer);
        assert_eq!(err.to_string(), "Forbidden: missing capability `developer`");
    }
}
