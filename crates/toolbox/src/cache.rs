//! Read cache for backend responses.
//!
//! Entries are keyed by the query that produced them and dropped wholesale
//! when something may have changed: any order mutation invalidates every
//! order entry (results are never patched in place) and any link mutation
//! invalidates every link list.
//!
//! Each side carries a generation that every invalidation bumps. A reader
//! captures it before going to the backend and hands it back with the
//! result, so a response fetched before a write is never stored after it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use kiezbett_core::{Order, OrderId, OrderLinkToken, OrderState};
use moka::future::Cache;

/// Cache key for order reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum OrderKey {
    /// `list_orders(state)`.
    List(OrderState),
    /// `get_order(id)`.
    Single(OrderId),
}

/// Cached order read.
#[derive(Debug, Clone)]
pub enum OrderValue {
    List(Arc<Vec<Order>>),
    Single(Arc<Order>),
}

/// Shared cache for order and link reads.
#[derive(Clone)]
pub struct OrderCache {
    orders: Cache<OrderKey, OrderValue>,
    /// Keyed by the link scope's lookup key (order id or `global`).
    links: Cache<String, Arc<Vec<OrderLinkToken>>>,
    order_generation: Arc<AtomicU64>,
    link_generation: Arc<AtomicU64>,
}

impl OrderCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            orders: Cache::builder()
                .max_capacity(500)
                .time_to_live(ttl)
                .build(),
            links: Cache::builder()
                .max_capacity(500)
                .time_to_live(ttl)
                .build(),
            order_generation: Arc::new(AtomicU64::new(0)),
            link_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current order generation. Capture before fetching.
    #[must_use]
    pub fn order_generation(&self) -> u64 {
        self.order_generation.load(Ordering::Acquire)
    }

    /// Current link generation. Capture before fetching.
    #[must_use]
    pub fn link_generation(&self) -> u64 {
        self.link_generation.load(Ordering::Acquire)
    }

    pub async fn orders(&self, state: OrderState) -> Option<Arc<Vec<Order>>> {
        match self.orders.get(&OrderKey::List(state)).await {
            Some(OrderValue::List(orders)) => Some(orders),
            _ => None,
        }
    }

    /// Store a list fetched at `generation`. Returns whether it was kept.
    pub async fn insert_orders(
        &self,
        generation: u64,
        state: OrderState,
        orders: Arc<Vec<Order>>,
    ) -> bool {
        self.insert_order_value(generation, OrderKey::List(state), OrderValue::List(orders))
            .await
    }

    pub async fn order(&self, id: &OrderId) -> Option<Arc<Order>> {
        match self.orders.get(&OrderKey::Single(id.clone())).await {
            Some(OrderValue::Single(order)) => Some(order),
            _ => None,
        }
    }

    /// Store an order fetched at `generation`. Returns whether it was kept.
    pub async fn insert_order(&self, generation: u64, order: Arc<Order>) -> bool {
        self.insert_order_value(
            generation,
            OrderKey::Single(order.id.clone()),
            OrderValue::Single(order),
        )
        .await
    }

    async fn insert_order_value(&self, generation: u64, key: OrderKey, value: OrderValue) -> bool {
        if self.order_generation() != generation {
            return false;
        }
        self.orders.insert(key.clone(), value).await;
        // An invalidation may have slipped in between the check and the insert.
        if self.order_generation() != generation {
            self.orders.invalidate(&key).await;
            return false;
        }
        true
    }

    pub async fn links(&self, lookup_key: &str) -> Option<Arc<Vec<OrderLinkToken>>> {
        self.links.get(lookup_key).await
    }

    /// Store a link list fetched at `generation`. Returns whether it was kept.
    pub async fn insert_links(
        &self,
        generation: u64,
        lookup_key: &str,
        tokens: Arc<Vec<OrderLinkToken>>,
    ) -> bool {
        if self.link_generation() != generation {
            return false;
        }
        self.links.insert(lookup_key.to_string(), tokens).await;
        if self.link_generation() != generation {
            self.links.invalidate(lookup_key).await;
            return false;
        }
        true
    }

    /// Drop every order entry.
    pub fn invalidate_orders(&self) {
        self.order_generation.fetch_add(1, Ordering::AcqRel);
        self.orders.invalidate_all();
        tracing::debug!("Order cache invalidated");
    }

    /// Drop every link list.
    pub fn invalidate_links(&self) {
        self.link_generation.fetch_add(1, Ordering::AcqRel);
        self.links.invalidate_all();
        tracing::debug!("Link cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalidate_orders_drops_lists_and_singles() {
        let cache = OrderCache::new(Duration::from_secs(60));
        let order = Order::new("o-1", "1001", "open");
        let generation = cache.order_generation();
        cache
            .insert_orders(generation, OrderState::Open, Arc::new(vec![order.clone()]))
            .await;
        cache.insert_order(generation, Arc::new(order)).await;
        assert!(cache.orders(OrderState::Open).await.is_some());

        cache.invalidate_orders();

        assert!(cache.orders(OrderState::Open).await.is_none());
        assert!(cache.order(&OrderId::new("o-1")).await.is_none());
    }

    #[tokio::test]
    async fn test_link_and_order_entries_are_independent() {
        let cache = OrderCache::new(Duration::from_secs(60));
        cache
            .insert_links(cache.link_generation(), "global", Arc::new(Vec::new()))
            .await;
        cache
            .insert_orders(
                cache.order_generation(),
                OrderState::Completed,
                Arc::new(Vec::new()),
            )
            .await;

        cache.invalidate_orders();
        assert!(cache.links("global").await.is_some());

        cache.invalidate_links();
        assert!(cache.links("global").await.is_none());
    }

    #[tokio::test]
    async fn test_keys_distinguish_states() {
        let cache = OrderCache::new(Duration::from_secs(60));
        cache
            .insert_orders(
                cache.order_generation(),
                OrderState::Open,
                Arc::new(vec![Order::new("o", "1", "open")]),
            )
            .await;
        assert!(cache.orders(OrderState::InProgress).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_started_before_invalidation_is_not_stored() {
        let cache = OrderCache::new(Duration::from_secs(60));
        let before_write = cache.order_generation();

        // A write lands while the read is still waiting on the backend.
        cache.invalidate_orders();

        let stale = Arc::new(vec![Order::new("o-1", "1001", "open")]);
        assert!(!cache.insert_orders(before_write, OrderState::Open, stale).await);
        assert!(
            !cache
                .insert_order(before_write, Arc::new(Order::new("o-1", "1001", "open")))
                .await
        );
        assert!(cache.orders(OrderState::Open).await.is_none());
        assert!(cache.order(&OrderId::new("o-1")).await.is_none());

        let fresh = Arc::new(vec![Order::new("o-1", "1001", "in_progress")]);
        assert!(
            cache
                .insert_orders(cache.order_generation(), OrderState::Open, fresh)
                .await
        );
        assert!(cache.orders(OrderState::Open).await.is_some());
    }

    #[tokio::test]
    async fn test_link_list_fetched_before_revoke_is_not_stored() {
        let cache = OrderCache::new(Duration::from_secs(60));
        let before_write = cache.link_generation();

        cache.invalidate_links();

        assert!(
            !cache
                .insert_links(before_write, "o-1", Arc::new(Vec::new()))
                .await
        );
        assert!(cache.links("o-1").await.is_none());
    }
}
