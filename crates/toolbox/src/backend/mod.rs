//! Hosted backend client.
//!
//! Thin typed wrappers around the backend's serverless functions under
//! `{BACKEND_URL}/functions/v1`. The backend owns all order data, decides
//! whether a transition is legal and manages deep-link tokens; this module
//! only builds requests and maps responses.
//!
//! # Architecture
//!
//! - [`client`] - `BackendClient`, request building and error mapping
//! - [`orders`] - Order reads and per-axis state changes
//! - [`links`] - Deep-link token issue, listing, revocation and resolution
//! - [`types`] - Wire envelopes
//!
//! Every authenticated call reads the bearer token from the
//! [`SessionManager`](crate::session::SessionManager) right before the request;
//! without a session no request is sent. Token resolution is unauthenticated.

pub mod client;
pub mod links;
pub mod orders;
pub mod types;

pub use client::BackendClient;
pub use types::{CreatedLink, ResolvedOrder, ResolvedOrders};

use thiserror::Error;

use crate::session::SessionError;

/// What went wrong talking to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The backend answered with a non-success status.
    Status(u16),
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connection or protocol failure.
    Transport,
    /// The response body did not have the expected shape.
    Decode,
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Timeout => write!(f, "timeout"),
            Self::Transport => write!(f, "transport"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// Errors returned by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend rejected the request or could not be reached.
    #[error("{message}")]
    Api {
        /// Failure class.
        kind: ApiErrorKind,
        /// Server-provided message or the operation's fallback.
        message: String,
    },

    /// No usable session; nothing was sent.
    #[error("Authentication required: {0}")]
    Auth(#[from] SessionError),

    /// The deep-link token is unknown, expired or revoked.
    #[error("This link is invalid, expired or revoked")]
    TokenInvalid,
}

impl BackendError {
    /// An API error of the given kind.
    pub fn api(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self::Api {
            kind,
            message: message.into(),
        }
    }

    /// HTTP status of an API error, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api {
                kind: ApiErrorKind::Status(code),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}
