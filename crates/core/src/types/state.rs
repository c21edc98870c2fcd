//! State axes and technical state names.
//!
//! An order moves along three independent axes. Each axis has its own set of
//! machine-readable state names as reported by the backend's state machine.
//! Technical names on the wire are plain strings; the enums here are used
//! whenever the toolbox has to reason about a state, and unknown names are
//! kept as strings rather than rejected.

use serde::{Deserialize, Serialize};

/// Error returned when a technical name does not belong to the expected set.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownNameError {
    /// What was being parsed (e.g. "order state").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Defines a closed enum of technical names with string conversions.
///
/// Every generated type gets `ALL`, `as_str()`, `from_technical_name()`,
/// `Display` and `FromStr`.
macro_rules! technical_names {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $tech:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $tech)]
                $variant,
            )+
        }

        impl $name {
            /// Every known value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The technical name as used by the backend.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $tech,)+
                }
            }

            /// Look up a technical name; `None` for names this build does not know.
            #[must_use]
            pub fn from_technical_name(name: &str) -> Option<Self> {
                match name {
                    $($tech => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::types::state::UnknownNameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_technical_name(s).ok_or_else(|| $crate::types::state::UnknownNameError {
                    kind: $kind,
                    value: s.to_owned(),
                })
            }
        }
    };
}

pub(crate) use technical_names;

technical_names! {
    /// One of the three independent state dimensions of an order.
    StateAxis ("state axis") {
        /// The order itself.
        Order => "order",
        /// The active transaction.
        Payment => "payment",
        /// The active delivery.
        Delivery => "delivery",
    }
}

technical_names! {
    /// Technical names on the order axis.
    OrderState ("order state") {
        Open => "open",
        InProgress => "in_progress",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

technical_names! {
    /// Technical names on the payment (transaction) axis.
    PaymentState ("payment state") {
        Open => "open",
        Failed => "failed",
        Authorized => "authorized",
        RefundedPartially => "refunded_partially",
        Refunded => "refunded",
        InProgress => "in_progress",
        Paid => "paid",
        PaidPartially => "paid_partially",
        Reminded => "reminded",
        Cancelled => "cancelled",
    }
}

technical_names! {
    /// Technical names on the delivery axis.
    DeliveryState ("delivery state") {
        Open => "open",
        Shipped => "shipped",
        ShippedPartially => "shipped_partially",
        Cancelled => "cancelled",
        Returned => "returned",
        ReturnedPartially => "returned_partially",
        ShipmentReady => "shipment_ready",
    }
}

/// A state-machine node as reported by the backend.
///
/// `technical_name` is machine readable; `name` is the shop's display name
/// and may be localized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMachineState {
    /// Machine-readable state identifier.
    #[serde(default)]
    pub technical_name: String,
    /// Human-readable state name.
    #[serde(default)]
    pub name: String,
}

impl StateMachineState {
    /// Build a state with the display name equal to the technical name.
    #[must_use]
    pub fn technical(name: impl Into<String>) -> Self {
        let technical_name = name.into();
        Self {
            name: technical_name.clone(),
            technical_name,
        }
    }

    /// Whether this node carries the given technical name.
    #[must_use]
    pub fn is(&self, technical_name: &str) -> bool {
        self.technical_name == technical_name
    }
}
