//! Application state shared across handlers.

use std::sync::Arc;

use kiezbett_core::CapabilityMap;

use crate::backend::{BackendClient, BackendError};
use crate::cache::OrderCache;
use crate::config::ToolboxConfig;
use crate::services::{LinkService, OrderService};
use crate::session::SessionManager;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ToolboxConfig,
    session: SessionManager,
    capabilities: CapabilityMap,
    orders: OrderService,
    links: LinkService,
}

impl AppState {
    /// Wire up the backend client, cache and services for `config`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the HTTP client cannot be created.
    pub fn new(config: ToolboxConfig, session: SessionManager) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend, session.clone())?;
        let cache = OrderCache::new(config.cache_ttl);
        let orders = OrderService::new(backend.clone(), cache.clone());
        let links = LinkService::new(backend, cache, config.links, config.base_url.clone());
        let capabilities = config.capabilities();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                capabilities,
                orders,
                links,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ToolboxConfig {
        &self.inner.config
    }

    /// The operator session the toolbox acts with.
    #[must_use]
    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    #[must_use]
    pub fn capabilities(&self) -> &CapabilityMap {
        &self.inner.capabilities
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn links(&self) -> &LinkService {
        &self.inner.links
    }
}
