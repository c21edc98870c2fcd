//! Deep-link management and public resolution.
//!
//! Besides wrapping the backend, the service remembers tokens it has seen
//! revoked or expired so that a dead link is refused without another round
//! trip. That memory is only a shortcut: a token it does not know about is
//! always checked with the backend.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kiezbett_core::{
    Actor, LinkScope, LinkState, LinkToken, NewLink, OrderId, OrderLinkToken, partition_by_state,
};
use moka::future::Cache;
use tracing::{info, instrument};

use crate::backend::{BackendClient, BackendError, CreatedLink, ResolvedOrder, ResolvedOrders};
use crate::cache::OrderCache;
use crate::config::LinkDefaults;
use crate::error::AppError;

/// A link that was just issued, with the toolbox URL to hand out.
#[derive(Debug, Clone)]
pub struct IssuedLink {
    pub created: CreatedLink,
    pub scope: LinkScope,
    /// `{TOOLBOX_BASE_URL}/public/order/{token}` or `/public/orders/{token}`.
    pub public_url: String,
}

/// Links of one scope split by lifecycle state.
#[derive(Debug, Clone, Default)]
pub struct LinkOverview {
    pub active: Vec<OrderLinkToken>,
    pub expired: Vec<OrderLinkToken>,
}

/// Deep-link operations.
#[derive(Clone)]
pub struct LinkService {
    backend: BackendClient,
    cache: OrderCache,
    defaults: LinkDefaults,
    base_url: String,
    /// Tokens known to be terminal.
    dead: Cache<LinkToken, LinkState>,
}

impl LinkService {
    /// Create a new link service.
    #[must_use]
    pub fn new(
        backend: BackendClient,
        cache: OrderCache,
        defaults: LinkDefaults,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            cache,
            defaults,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            dead: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(60 * 60 * 24))
                .build(),
        }
    }

    /// Default lifetimes used when the caller gives none.
    #[must_use]
    pub const fn defaults(&self) -> LinkDefaults {
        self.defaults
    }

    /// Base the public URLs are built on.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a link for one order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank order id or a lifetime
    /// outside 1..=365 days, and `AppError::Backend` if issuing fails.
    pub async fn create_for_order(
        &self,
        actor: &Actor,
        order_id: OrderId,
        ttl_days: Option<u16>,
    ) -> Result<IssuedLink, AppError> {
        let link = NewLink::for_order(order_id, ttl_days.unwrap_or(self.defaults.order_ttl_days))?
            .created_by(actor.display_name());
        self.issue(link).await
    }

    /// Issue a global link.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a lifetime outside 1..=365 days and
    /// `AppError::Backend` if issuing fails.
    pub async fn create_global(
        &self,
        actor: &Actor,
        ttl_days: Option<u16>,
    ) -> Result<IssuedLink, AppError> {
        let link = NewLink::global(ttl_days.unwrap_or(self.defaults.global_ttl_days))?
            .created_by(actor.display_name());
        self.issue(link).await
    }

    #[instrument(skip(self, link), fields(scope = link.scope.lookup_key()))]
    async fn issue(&self, link: NewLink) -> Result<IssuedLink, AppError> {
        let created = self.backend.create_link(&link).await?;
        self.cache.invalidate_links();

        let public_url = format!("{}{}", self.base_url, link.scope.public_path(&created.token));
        Ok(IssuedLink {
            created,
            scope: link.scope,
            public_url,
        })
    }

    /// Links of `scope`, split into active and expired at the current time.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the backend call fails.
    #[instrument(skip(self), fields(scope = scope.lookup_key()))]
    pub async fn list(&self, scope: &LinkScope) -> Result<LinkOverview, AppError> {
        let tokens = match self.cache.links(scope.lookup_key()).await {
            Some(tokens) => tokens,
            None => {
                let generation = self.cache.link_generation();
                let tokens = Arc::new(self.backend.list_links(scope).await?);
                self.cache
                    .insert_links(generation, scope.lookup_key(), Arc::clone(&tokens))
                    .await;
                tokens
            }
        };

        let (active, expired) = partition_by_state(tokens.as_ref().clone(), Utc::now());
        for token in &expired {
            self.dead.insert(token.token.clone(), LinkState::Expired).await;
        }
        Ok(LinkOverview { active, expired })
    }

    /// Revoke a token. Revoking an already revoked token succeeds.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the backend refuses.
    #[instrument(skip(self, token), fields(token = %token.redacted()))]
    pub async fn revoke(&self, token: &LinkToken) -> Result<(), AppError> {
        self.backend.revoke_link(token).await?;
        self.dead.insert(token.clone(), LinkState::Revoked).await;
        self.cache.invalidate_links();
        info!("Link revoked");
        Ok(())
    }

    /// Revoke a token that must belong to `scope`.
    ///
    /// The scope decides which capability the caller was checked for, so a
    /// token listed under another scope is refused. A token this service
    /// already saw revoked counts as revoked again without a backend call.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if `scope` does not list the token and
    /// `AppError::Backend` if listing or revoking fails.
    #[instrument(skip(self, token), fields(scope = scope.lookup_key(), token = %token.redacted()))]
    pub async fn revoke_in_scope(
        &self,
        scope: &LinkScope,
        token: &LinkToken,
    ) -> Result<(), AppError> {
        let overview = self.list(scope).await?;
        let listed = overview
            .active
            .iter()
            .chain(&overview.expired)
            .any(|t| &t.token == token);

        if !listed {
            if self.known_state(token).await == Some(LinkState::Revoked) {
                return Ok(());
            }
            return Err(AppError::NotFound(format!(
                "link {} in {}",
                token.redacted(),
                scope.lookup_key()
            )));
        }
        self.revoke(token).await
    }

    /// Lifecycle state of a token this service has seen die.
    pub async fn known_state(&self, token: &LinkToken) -> Option<LinkState> {
        self.dead.get(token).await
    }

    /// Resolve a single-order token for the public page.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend(BackendError::TokenInvalid)` for dead tokens
    /// and other `AppError::Backend` errors if the backend fails.
    pub async fn resolve_order(&self, token: &LinkToken) -> Result<ResolvedOrder, AppError> {
        self.refuse_dead(token).await?;
        Ok(self.backend.resolve_order(token).await?)
    }

    /// Resolve a global token for the public list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend(BackendError::TokenInvalid)` for dead tokens
    /// and other `AppError::Backend` errors if the backend fails.
    pub async fn resolve_orders(&self, token: &LinkToken) -> Result<ResolvedOrders, AppError> {
        self.refuse_dead(token).await?;
        Ok(self.backend.resolve_orders(token).await?)
    }

    async fn refuse_dead(&self, token: &LinkToken) -> Result<(), BackendError> {
        match self.dead.get(token).await {
            Some(state) if !state.is_resolvable() => {
                tracing::debug!(token = %token.redacted(), state = %state, "Refusing known dead token");
                Err(BackendError::TokenInvalid)
            }
            _ => Ok(()),
        }
    }
}
