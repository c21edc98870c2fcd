//! Per-axis transition actions and the table of actions offered in each state.
//!
//! The table is a UI affordance: it decides which actions the dashboard
//! offers, not which ones are legal. The backend checks every request
//! against the order's current state and computes the resulting state.
//! A state that is not in the table (terminal, or simply unknown to this
//! build) offers no actions.
//!
//! ```text
//! order     open           -> cancel, process
//!           in_progress    -> cancel, complete
//!           completed      -> reopen
//!           cancelled      -> reopen
//! payment   open           -> paid
//!           paid           -> cancel, refund, reopen
//! delivery  open           -> cancel, shipment_ready
//!           shipment_ready -> shipped
//!           shipped        -> reopen
//! ```

use core::fmt;

use serde::Serialize;

use crate::types::order::Order;
use crate::types::state::{DeliveryState, OrderState, PaymentState, StateAxis, technical_names};
use crate::types::validation::ValidationError;

technical_names! {
    /// Actions on the order axis.
    OrderTransition ("order transition") {
        Cancel => "cancel",
        Process => "process",
        Complete => "complete",
        Reopen => "reopen",
    }
}

technical_names! {
    /// Actions on the payment axis.
    PaymentTransition ("payment transition") {
        Cancel => "cancel",
        Process => "process",
        Paid => "paid",
        Refund => "refund",
        Reopen => "reopen",
    }
}

technical_names! {
    /// Actions on the delivery axis.
    ///
    /// The wire payloads for `ShipmentReady` and `Shipped` are custom
    /// backend action names and are kept exactly as the backend expects them.
    DeliveryTransition ("delivery transition") {
        Cancel => "cancel",
        ShipmentReady => "nbtoolboxtransto",
        Shipped => "nbtoolboxtransfrom",
        Reopen => "reopen",
    }
}

impl DeliveryTransition {
    /// Human-facing name, independent of the wire payload.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::ShipmentReady => "shipment_ready",
            Self::Shipped => "shipped",
            Self::Reopen => "reopen",
        }
    }

    /// Parse either the wire payload or the human-facing name.
    #[must_use]
    pub fn from_label_or_payload(s: &str) -> Option<Self> {
        Self::from_technical_name(s).or_else(|| Self::ALL.iter().copied().find(|t| t.label() == s))
    }
}

/// A transition action on any axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionAction {
    Order(OrderTransition),
    Payment(PaymentTransition),
    Delivery(DeliveryTransition),
}

impl TransitionAction {
    /// Axis the action applies to.
    #[must_use]
    pub const fn axis(self) -> StateAxis {
        match self {
            Self::Order(_) => StateAxis::Order,
            Self::Payment(_) => StateAxis::Payment,
            Self::Delivery(_) => StateAxis::Delivery,
        }
    }

    /// Value sent as `newState` to the backend.
    #[must_use]
    pub const fn payload(self) -> &'static str {
        match self {
            Self::Order(t) => t.as_str(),
            Self::Payment(t) => t.as_str(),
            Self::Delivery(t) => t.as_str(),
        }
    }

    /// Name shown to users.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Order(t) => t.as_str(),
            Self::Payment(t) => t.as_str(),
            Self::Delivery(t) => t.label(),
        }
    }

    /// Parse an action for `axis` from its payload or label.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTransition`] when the action does not
    /// exist on that axis.
    pub fn parse(axis: StateAxis, s: &str) -> Result<Self, ValidationError> {
        let parsed = match axis {
            StateAxis::Order => OrderTransition::from_technical_name(s).map(Self::Order),
            StateAxis::Payment => PaymentTransition::from_technical_name(s).map(Self::Payment),
            StateAxis::Delivery => DeliveryTransition::from_label_or_payload(s).map(Self::Delivery),
        };
        parsed.ok_or_else(|| ValidationError::UnknownTransition {
            axis: axis.to_string(),
            action: s.to_owned(),
        })
    }
}

impl fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.axis(), self.label())
    }
}

impl Serialize for TransitionAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.payload())
    }
}

const NONE: &[TransitionAction] = &[];

/// Actions offered on `axis` when it is in `current_state`.
///
/// Unknown axis/state combinations yield an empty slice. Each slice is free
/// of duplicates.
#[must_use]
pub fn allowed_transitions(axis: StateAxis, current_state: &str) -> &'static [TransitionAction] {
    use TransitionAction::{Delivery, Order, Payment};

    match axis {
        StateAxis::Order => match OrderState::from_technical_name(current_state) {
            Some(OrderState::Open) => &[
                Order(OrderTransition::Cancel),
                Order(OrderTransition::Process),
            ],
            Some(OrderState::InProgress) => &[
                Order(OrderTransition::Cancel),
                Order(OrderTransition::Complete),
            ],
            Some(OrderState::Completed | OrderState::Cancelled) => {
                &[Order(OrderTransition::Reopen)]
            }
            None => NONE,
        },
        StateAxis::Payment => match PaymentState::from_technical_name(current_state) {
            Some(PaymentState::Open) => &[Payment(PaymentTransition::Paid)],
            Some(PaymentState::Paid) => &[
                Payment(PaymentTransition::Cancel),
                Payment(PaymentTransition::Refund),
                Payment(PaymentTransition::Reopen),
            ],
            _ => NONE,
        },
        StateAxis::Delivery => match DeliveryState::from_technical_name(current_state) {
            Some(DeliveryState::Open) => &[
                Delivery(DeliveryTransition::Cancel),
                Delivery(DeliveryTransition::ShipmentReady),
            ],
            Some(DeliveryState::ShipmentReady) => &[Delivery(DeliveryTransition::Shipped)],
            Some(DeliveryState::Shipped) => &[Delivery(DeliveryTransition::Reopen)],
            _ => NONE,
        },
    }
}

/// Actions offered on `axis` for `order`'s current state on that axis.
///
/// An order without a transaction or delivery offers nothing on that axis.
#[must_use]
pub fn allowed_transitions_for(order: &Order, axis: StateAxis) -> &'static [TransitionAction] {
    order
        .state_on(axis)
        .map_or(NONE, |state| allowed_transitions(axis, state))
}

/// One edge of the backend's transition graph, as exposed for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(default)]
    pub action_name: String,
    #[serde(default)]
    pub from_state_name: String,
    #[serde(default)]
    pub to_state_name: String,
}
