//! Order reads and state changes.
//!
//! The three state-change calls send the transition's wire payload as
//! `newState` and return whatever the backend reports afterwards. The local
//! transition table is never consulted here: the backend decides.

use kiezbett_core::{
    DeliveryTransition, Order, OrderId, OrderState, OrderTransition, PaymentTransition, StateAxis,
    Transition, TransitionAction,
};
use reqwest::Method;
use tracing::instrument;

use super::client::{Access, BackendClient};
use super::types::{NewStateBody, OrdersEnvelope, TransitionsEnvelope};
use super::BackendError;

const EDGE_FUNCTION_ERROR: &str = "Error calling edge function";

impl BackendClient {
    /// Orders whose order state is `state`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// when the backend fails.
    #[instrument(skip(self), fields(state = %state))]
    pub async fn list_orders(&self, state: OrderState) -> Result<Vec<Order>, BackendError> {
        let request = self
            .request(Method::GET, &["orders"], Access::Session)
            .await?
            .query(&[("state", state.as_str())]);

        let envelope: OrdersEnvelope = Self::call(request, EDGE_FUNCTION_ERROR).await?;
        tracing::debug!(count = envelope.orders.data.len(), "Fetched orders");
        Ok(envelope.orders.data)
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// when the backend fails (including unknown ids).
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: &OrderId) -> Result<Order, BackendError> {
        let request = self
            .request(Method::GET, &["orders", id.as_str()], Access::Session)
            .await?;
        Self::call(request, EDGE_FUNCTION_ERROR).await
    }

    /// Request an order-axis transition.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` when the backend rejects the transition.
    pub async fn set_order_state(
        &self,
        id: &str,
        transition: OrderTransition,
    ) -> Result<Vec<Order>, BackendError> {
        self.apply_transition(id, TransitionAction::Order(transition))
            .await
    }

    /// Request a payment-axis transition; `transaction_id` is the active transaction.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` when the backend rejects the transition.
    pub async fn set_payment_state(
        &self,
        transaction_id: &str,
        transition: PaymentTransition,
    ) -> Result<Vec<Order>, BackendError> {
        self.apply_transition(transaction_id, TransitionAction::Payment(transition))
            .await
    }

    /// Request a delivery-axis transition; `delivery_id` is the active delivery.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` when the backend rejects the transition.
    pub async fn set_delivery_state(
        &self,
        delivery_id: &str,
        transition: DeliveryTransition,
    ) -> Result<Vec<Order>, BackendError> {
        self.apply_transition(delivery_id, TransitionAction::Delivery(transition))
            .await
    }

    /// Request `action` on `subject_id`, routed to the endpoint of the action's axis.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// when the backend rejects the transition.
    #[instrument(skip(self), fields(subject_id = %subject_id, action = %action))]
    pub async fn apply_transition(
        &self,
        subject_id: &str,
        action: TransitionAction,
    ) -> Result<Vec<Order>, BackendError> {
        let path = match action.axis() {
            StateAxis::Order => "state",
            StateAxis::Payment => "payment-state",
            StateAxis::Delivery => "delivery-state",
        };
        let request = self
            .request(Method::POST, &["orders", subject_id, path], Access::Session)
            .await?
            .json(&NewStateBody {
                new_state: action.payload(),
            });

        let orders: Vec<Order> = Self::call(request, EDGE_FUNCTION_ERROR).await?;
        tracing::info!(subject_id, action = %action, "Transition applied");
        Ok(orders)
    }

    /// The backend's transition graph for one axis of an order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Auth` without a session and `BackendError::Api`
    /// when the backend fails.
    #[instrument(skip(self), fields(order_id = %id, axis = %axis))]
    pub async fn list_transitions(
        &self,
        id: &OrderId,
        axis: StateAxis,
    ) -> Result<Vec<Transition>, BackendError> {
        let request = self
            .request(
                Method::GET,
                &["orders", id.as_str(), "transitions"],
                Access::Session,
            )
            .await?
            .query(&[("type", axis.as_str())]);

        let envelope: TransitionsEnvelope = Self::call(request, EDGE_FUNCTION_ERROR).await?;
        Ok(envelope.order.transitions)
    }
}
