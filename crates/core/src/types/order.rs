//! Order model as returned by the backend's order endpoints.
//!
//! Field names follow the backend's camelCase JSON. Everything except the
//! identifiers and the order's own state is optional on the wire, so the
//! structs default aggressively rather than failing to decode an order that
//! is missing, say, a shipping address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{DeliveryId, LineItemId, OrderId, TransactionId};
use super::state::{StateAxis, StateMachineState};

/// An order with its three state axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: String,
    #[serde(default)]
    pub customer_comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Deliveries; the first one is the active delivery.
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub state_machine_state: StateMachineState,
    #[serde(default)]
    pub order_customer: Option<OrderCustomer>,
    /// Transactions; the first one is the active transaction.
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Order {
    /// Create a bare order in the given order state, without deliveries or transactions.
    #[must_use]
    pub fn new(id: impl Into<OrderId>, order_number: impl Into<String>, state: &str) -> Self {
        Self {
            id: id.into(),
            order_number: order_number.into(),
            customer_comment: None,
            created_at: None,
            deliveries: Vec::new(),
            line_items: Vec::new(),
            state_machine_state: StateMachineState::technical(state),
            order_customer: None,
            transactions: Vec::new(),
        }
    }

    /// The active delivery, if any.
    #[must_use]
    pub fn active_delivery(&self) -> Option<&Delivery> {
        self.deliveries.first()
    }

    /// The active transaction, if any.
    #[must_use]
    pub fn active_transaction(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// Technical name of the order's own state.
    #[must_use]
    pub fn order_state(&self) -> &str {
        &self.state_machine_state.technical_name
    }

    /// Technical name of the active transaction's state.
    #[must_use]
    pub fn payment_state(&self) -> Option<&str> {
        self.active_transaction()
            .map(|t| t.state_machine_state.technical_name.as_str())
    }

    /// Technical name of the active delivery's state.
    #[must_use]
    pub fn delivery_state(&self) -> Option<&str> {
        self.active_delivery()
            .map(|d| d.state_machine_state.technical_name.as_str())
    }

    /// Current technical state on `axis`, `None` when the sub-entity is missing.
    #[must_use]
    pub fn state_on(&self, axis: StateAxis) -> Option<&str> {
        match axis {
            StateAxis::Order => Some(self.order_state()),
            StateAxis::Payment => self.payment_state(),
            StateAxis::Delivery => self.delivery_state(),
        }
    }

    /// Identifier the backend expects when changing state on `axis`.
    ///
    /// Order transitions address the order, payment transitions the active
    /// transaction and delivery transitions the active delivery.
    #[must_use]
    pub fn subject_id(&self, axis: StateAxis) -> Option<&str> {
        match axis {
            StateAxis::Order => Some(self.id.as_str()),
            StateAxis::Payment => self.active_transaction().map(|t| t.id.as_str()),
            StateAxis::Delivery => self.active_delivery().map(|d| d.id.as_str()),
        }
    }

    /// Customer email, if the backend included it.
    #[must_use]
    pub fn customer_email(&self) -> Option<&str> {
        self.order_customer.as_ref().map(|c| c.email.as_str())
    }

    /// Name of the active delivery's shipping method.
    #[must_use]
    pub fn shipping_method_name(&self) -> Option<&str> {
        self.active_delivery()
            .and_then(|d| d.shipping_method.as_ref())
            .map(|m| m.name.as_str())
    }
}

/// The customer attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    #[serde(default)]
    pub email: String,
}

/// A delivery of (part of) an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: DeliveryId,
    #[serde(default)]
    pub shipping_order_address: Option<ShippingAddress>,
    #[serde(default)]
    pub shipping_method: Option<ShippingMethod>,
    /// Latest promised shipping date, as sent by the backend.
    #[serde(default)]
    pub shipping_date_latest: Option<String>,
    #[serde(default)]
    pub state_machine_state: StateMachineState,
}

impl Delivery {
    /// A delivery in the given state with no address or method.
    #[must_use]
    pub fn new(id: impl Into<DeliveryId>, state: &str) -> Self {
        Self {
            id: id.into(),
            shipping_order_address: None,
            shipping_method: None,
            shipping_date_latest: None,
            state_machine_state: StateMachineState::technical(state),
        }
    }
}

/// Shipping address of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub zipcode: String,
    pub city: String,
    pub country: Option<String>,
    pub phone_number: Option<String>,
}

impl ShippingAddress {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Shipping method of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingMethod {
    #[serde(default)]
    pub name: String,
}

/// A payment transaction of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(default)]
    pub state_machine_state: StateMachineState,
}

impl Transaction {
    /// A transaction in the given state.
    #[must_use]
    pub fn new(id: impl Into<TransactionId>, state: &str) -> Self {
        Self {
            id: id.into(),
            state_machine_state: StateMachineState::technical(state),
        }
    }
}

/// A line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: LineItemId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub payload: LineItemPayload,
}

/// Product configuration carried on a line item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineItemPayload {
    #[serde(default)]
    pub options: Vec<LineItemOption>,
}

/// A single "group: option" pair, e.g. "Holz: Eiche".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineItemOption {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub option: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "id": "0190a1",
        "orderNumber": "10042",
        "customerComment": null,
        "createdAt": "2024-11-03T09:15:00.000+00:00",
        "deliveries": [{
            "id": "d-1",
            "shippingOrderAddress": {"firstName": "Ada", "lastName": "Lovelace", "city": "Berlin", "street": "Kiezweg 1", "zipcode": "10999"},
            "shippingMethod": {"name": "Lastenrad Berlin"},
            "shippingDateLatest": "2024-11-20",
            "stateMachineState": {"technicalName": "open", "name": "Offen"}
        }],
        "lineItems": [{"id": "li-1", "label": "Hochbett", "quantity": 1, "payload": {"options": [{"group": "Holz", "option": "Eiche"}]}}],
        "stateMachineState": {"technicalName": "in_progress", "name": "In Bearbeitung"},
        "orderCustomer": {"email": "ada@example.com"},
        "transactions": [{"id": "t-1", "stateMachineState": {"technicalName": "paid", "name": "Bezahlt"}}]
    }"#;

    #[test]
    fn test_decodes_backend_order() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.order_number, "10042");
        assert_eq!(order.order_state(), "in_progress");
        assert_eq!(order.payment_state(), Some("paid"));
        assert_eq!(order.delivery_state(), Some("open"));
        assert_eq!(order.customer_email(), Some("ada@example.com"));
        assert_eq!(order.shipping_method_name(), Some("Lastenrad Berlin"));
        let address = order
            .active_delivery()
            .and_then(|d| d.shipping_order_address.as_ref())
            .unwrap();
        assert_eq!(address.full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_minimal_order_decodes_with_empty_lists() {
        let order: Order = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert!(order.deliveries.is_empty());
        assert!(order.transactions.is_empty());
        assert_eq!(order.state_on(StateAxis::Delivery), None);
        assert_eq!(order.subject_id(StateAxis::Payment), None);
    }

    #[test]
    fn test_subject_id_per_axis() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.subject_id(StateAxis::Order), Some("0190a1"));
        assert_eq!(order.subject_id(StateAxis::Payment), Some("t-1"));
        assert_eq!(order.subject_id(StateAxis::Delivery), Some("d-1"));
    }
}
