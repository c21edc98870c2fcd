//! Order reads and transitions for the dashboard and the CLI.

use std::sync::Arc;

use kiezbett_core::{
    Category, CategoryCounts, Order, OrderId, OrderState, StateAxis, Transition, TransitionAction,
    ValidationError, allowed_transitions_for, filter_category,
};
use tracing::{info, instrument, warn};

use crate::backend::BackendClient;
use crate::cache::OrderCache;
use crate::error::AppError;

/// A transition requested from the dashboard or the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Order the transition belongs to.
    pub order_id: OrderId,
    /// Transaction or delivery id for payment and delivery actions; looked
    /// up from the order when absent.
    pub subject_id: Option<String>,
    pub action: TransitionAction,
}

/// Cached access to orders.
#[derive(Clone)]
pub struct OrderService {
    backend: BackendClient,
    cache: OrderCache,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub const fn new(backend: BackendClient, cache: OrderCache) -> Self {
        Self { backend, cache }
    }

    /// Orders in order state `state`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the backend call fails.
    #[instrument(skip(self))]
    pub async fn list_by_state(&self, state: OrderState) -> Result<Arc<Vec<Order>>, AppError> {
        if let Some(orders) = self.cache.orders(state).await {
            tracing::debug!("Cache hit for order list");
            return Ok(orders);
        }

        let generation = self.cache.order_generation();
        let orders = Arc::new(self.backend.list_orders(state).await?);
        if !self
            .cache
            .insert_orders(generation, state, Arc::clone(&orders))
            .await
        {
            tracing::debug!("Order list changed while fetching, not cached");
        }
        Ok(orders)
    }

    /// Orders classified as `category`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the backend call fails.
    pub async fn list_category(&self, category: Category) -> Result<Vec<Order>, AppError> {
        let orders = self.list_by_state(category.list_filter()).await?;
        Ok(filter_category(orders.as_ref().clone(), category))
    }

    /// Per-category counts across all listable order states.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if any backend call fails.
    #[instrument(skip(self))]
    pub async fn counts(&self) -> Result<CategoryCounts, AppError> {
        let (open, in_progress, completed) = tokio::try_join!(
            self.list_by_state(OrderState::Open),
            self.list_by_state(OrderState::InProgress),
            self.list_by_state(OrderState::Completed),
        )?;

        Ok(CategoryCounts::tally(
            open.iter().chain(in_progress.iter()).chain(completed.iter()),
        ))
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for a blank id and `AppError::Backend`
    /// if the backend call fails.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<Arc<Order>, AppError> {
        if id.is_blank() {
            return Err(ValidationError::EmptyOrderId.into());
        }
        if let Some(order) = self.cache.order(id).await {
            tracing::debug!("Cache hit for order");
            return Ok(order);
        }

        let generation = self.cache.order_generation();
        let order = Arc::new(self.backend.get_order(id).await?);
        self.cache.insert_order(generation, Arc::clone(&order)).await;
        Ok(order)
    }

    /// Ask the backend to apply a transition, then drop every cached order.
    ///
    /// The local transition table is not enforced: an action it does not
    /// offer is logged and still sent, and the backend has the final say.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when no subject id is given and the
    /// order has no active transaction or delivery for the action's axis,
    /// and `AppError::Backend` when the backend rejects the transition.
    #[instrument(skip(self), fields(order_id = %request.order_id, action = %request.action))]
    pub async fn transition(&self, request: TransitionRequest) -> Result<Vec<Order>, AppError> {
        let axis = request.action.axis();
        let subject_id = match request.subject_id.filter(|s| !s.trim().is_empty()) {
            Some(subject_id) => subject_id,
            None if axis == StateAxis::Order => request.order_id.to_string(),
            None => {
                let order = self.get(&request.order_id).await?;
                if !allowed_transitions_for(&order, axis).contains(&request.action) {
                    warn!("Requested transition is not offered in the current state");
                }
                order
                    .subject_id(axis)
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::MissingSubject(axis_subject(axis).to_string()))?
            }
        };

        let orders = self
            .backend
            .apply_transition(&subject_id, request.action)
            .await?;
        self.cache.invalidate_orders();
        info!(subject_id = %subject_id, "Order transition accepted");
        Ok(orders)
    }

    /// The backend's transition graph for one axis (developer tooling).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Backend` if the backend call fails.
    pub async fn transitions(
        &self,
        id: &OrderId,
        axis: StateAxis,
    ) -> Result<Vec<Transition>, AppError> {
        Ok(self.backend.list_transitions(id, axis).await?)
    }
}

/// Name of the sub-entity an axis acts on.
const fn axis_subject(axis: StateAxis) -> &'static str {
    match axis {
        StateAxis::Order => "order",
        StateAxis::Payment => "transaction",
        StateAxis::Delivery => "delivery",
    }
}
