//! Client-side input validation errors.
//!
//! These never reach the backend: they reject malformed input before a
//! request is built.

/// Malformed input to a toolbox operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An order id was required but empty.
    #[error("order id cannot be empty")]
    EmptyOrderId,
    /// A deep-link token was required but empty.
    #[error("link token cannot be empty")]
    EmptyToken,
    /// Link lifetime outside the accepted range.
    #[error("link lifetime must be between {min} and {max} days (got {got})")]
    TtlOutOfRange {
        /// Smallest accepted value.
        min: u16,
        /// Largest accepted value.
        max: u16,
        /// Rejected value.
        got: u16,
    },
    /// A transition action that does not exist on the given axis.
    #[error("`{action}` is not a {axis} transition")]
    UnknownTransition {
        /// Axis the action was parsed for.
        axis: String,
        /// Rejected action.
        action: String,
    },
    /// The order has no transaction/delivery to act on.
    #[error("order has no active {0}")]
    MissingSubject(String),
}
