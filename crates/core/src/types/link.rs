//! Deep-link tokens for unauthenticated order access.
//!
//! A token is an opaque bearer string that grants read access to one order
//! or, for global tokens, to all orders. Issuing, storing and expiring
//! tokens is the backend's job; the types here describe what the toolbox
//! sees and the lifecycle it can infer from that.
//!
//! ```text
//! active --(expires_at passes)--> expired
//! active --(revoke)-------------> revoked
//! ```
//!
//! Both `expired` and `revoked` are terminal.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{LinkId, OrderId};
use super::validation::ValidationError;

/// Opaque deep-link token.
///
/// `Debug` only shows a short prefix so tokens do not end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkToken(String);

impl LinkToken {
    /// Parse a token, rejecting empty input.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyToken`] for empty or whitespace input.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The raw token, for building URLs.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First characters of the token, safe for logs.
    #[must_use]
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{prefix}…")
    }
}

impl fmt::Debug for LinkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LinkToken").field(&self.redacted()).finish()
    }
}

/// What a token grants access to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// A single order.
    Order(OrderId),
    /// Every order.
    Global,
}

impl LinkScope {
    /// Wire value of the `tokenType` field.
    #[must_use]
    pub const fn token_type(&self) -> &'static str {
        match self {
            Self::Order(_) => "single",
            Self::Global => "global",
        }
    }

    /// Path segment used when listing tokens (`global` is the backend's marker).
    #[must_use]
    pub fn lookup_key(&self) -> &str {
        match self {
            Self::Order(id) => id.as_str(),
            Self::Global => "global",
        }
    }

    /// Path of the public page that renders this scope.
    #[must_use]
    pub fn public_path(&self, token: &LinkToken) -> String {
        match self {
            Self::Order(_) => format!("/public/order/{}", token.expose()),
            Self::Global => format!("/public/orders/{}", token.expose()),
        }
    }
}

/// Request to issue a new deep link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub scope: LinkScope,
    pub ttl_days: u16,
    pub created_by: Option<String>,
}

impl NewLink {
    /// Shortest accepted lifetime.
    pub const MIN_TTL_DAYS: u16 = 1;
    /// Longest accepted lifetime.
    pub const MAX_TTL_DAYS: u16 = 365;

    /// A link for one order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyOrderId`] for a blank id and
    /// [`ValidationError::TtlOutOfRange`] for a lifetime outside 1..=365 days.
    pub fn for_order(order_id: OrderId, ttl_days: u16) -> Result<Self, ValidationError> {
        if order_id.is_blank() {
            return Err(ValidationError::EmptyOrderId);
        }
        Self::new(LinkScope::Order(order_id), ttl_days)
    }

    /// A link for all orders.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TtlOutOfRange`] for a lifetime outside 1..=365 days.
    pub fn global(ttl_days: u16) -> Result<Self, ValidationError> {
        Self::new(LinkScope::Global, ttl_days)
    }

    fn new(scope: LinkScope, ttl_days: u16) -> Result<Self, ValidationError> {
        if !(Self::MIN_TTL_DAYS..=Self::MAX_TTL_DAYS).contains(&ttl_days) {
            return Err(ValidationError::TtlOutOfRange {
                min: Self::MIN_TTL_DAYS,
                max: Self::MAX_TTL_DAYS,
                got: ttl_days,
            });
        }
        Ok(Self {
            scope,
            ttl_days,
            created_by: None,
        })
    }

    /// Record who issued the link.
    #[must_use]
    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = Some(actor.into());
        self
    }
}

/// Lifecycle state of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Active,
    Expired,
    Revoked,
}

impl LinkState {
    /// Derive the state from what is known about a token at `now`.
    ///
    /// Revocation wins over expiry; a token expiring exactly at `now` is expired.
    #[must_use]
    pub fn at(expires_at: DateTime<Utc>, revoked: bool, now: DateTime<Utc>) -> Self {
        if revoked {
            Self::Revoked
        } else if expires_at <= now {
            Self::Expired
        } else {
            Self::Active
        }
    }

    /// Whether a token in this state may still be resolved.
    #[must_use]
    pub const fn is_resolvable(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

/// A token as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLinkToken {
    pub id: LinkId,
    /// `None` for global tokens.
    #[serde(default)]
    pub order_id: Option<OrderId>,
    pub token: LinkToken,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub used_count: u64,
}

impl OrderLinkToken {
    /// Scope derived from the bound order.
    #[must_use]
    pub fn scope(&self) -> LinkScope {
        self.order_id
            .clone()
            .map_or(LinkScope::Global, LinkScope::Order)
    }

    /// Lifecycle state at `now`. Listed tokens are never revoked.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> LinkState {
        LinkState::at(self.expires_at, false, now)
    }
}

/// Token metadata returned alongside a resolved order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub used_count: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Split listed tokens into (active, expired) at `now`, keeping order.
#[must_use]
pub fn partition_by_state(
    tokens: Vec<OrderLinkToken>,
    now: DateTime<Utc>,
) -> (Vec<OrderLinkToken>, Vec<OrderLinkToken>) {
    tokens
        .into_iter()
        .partition(|t| t.state_at(now) == LinkState::Active)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn token(order: Option<&str>, expires_in_hours: i64, now: DateTime<Utc>) -> OrderLinkToken {
        OrderLinkToken {
            id: LinkId::new("l-1"),
            order_id: order.map(OrderId::new),
            token: LinkToken::parse("tok_abcdefgh").unwrap(),
            expires_at: now + Duration::hours(expires_in_hours),
            created_at: now - Duration::days(1),
            created_by: None,
            used_count: 0,
        }
    }

    #[test]
    fn test_expired_token_is_not_resolvable_without_revocation() {
        let now = Utc::now();
        let state = LinkState::at(now - Duration::seconds(1), false, now);
        assert_eq!(state, LinkState::Expired);
        assert!(!state.is_resolvable());
    }

    #[test]
    fn test_revoked_wins_over_active() {
        let now = Utc::now();
        let state = LinkState::at(now + Duration::days(3), true, now);
        assert_eq!(state, LinkState::Revoked);
        assert!(!state.is_resolvable());
    }

    #[test]
    fn test_boundary_is_expired() {
        let now = Utc::now();
        assert_eq!(LinkState::at(now, false, now), LinkState::Expired);
    }

    #[test]
    fn test_new_link_validation() {
        assert_eq!(
            NewLink::for_order(OrderId::new("  "), 7),
            Err(ValidationError::EmptyOrderId)
        );
        assert!(matches!(
            NewLink::global(0),
            Err(ValidationError::TtlOutOfRange { got: 0, .. })
        ));
        assert!(matches!(
            NewLink::global(366),
            Err(ValidationError::TtlOutOfRange { got: 366, .. })
        ));
        let link = NewLink::for_order(OrderId::new("o-1"), 7)
            .unwrap()
            .created_by("ops@kiezbett.de");
        assert_eq!(link.scope.token_type(), "single");
        assert_eq!(link.created_by.as_deref(), Some("ops@kiezbett.de"));
    }

    #[test]
    fn test_scope_from_listed_token() {
        let now = Utc::now();
        assert_eq!(token(None, 1, now).scope(), LinkScope::Global);
        assert_eq!(
            token(Some("o-9"), 1, now).scope(),
            LinkScope::Order(OrderId::new("o-9"))
        );
    }

    #[test]
    fn test_partition_by_state() {
        let now = Utc::now();
        let (active, expired) =
            partition_by_state(vec![token(None, 5, now), token(None, -5, now)], now);
        assert_eq!(active.len(), 1);
        assert_eq!(expired.len(), 1);
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let token = LinkToken::parse("supersecrettoken").unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("supersecrettoken"));
        assert!(debug.contains("supers"));
    }

    #[test]
    fn test_public_path() {
        let token = LinkToken::parse("abc").unwrap();
        assert_eq!(
            LinkScope::Order(OrderId::new("o")).public_path(&token),
            "/public/order/abc"
        );
        assert_eq!(LinkScope::Global.public_path(&token), "/public/orders/abc");
    }
}
