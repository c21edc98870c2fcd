//! Display buckets for order lists.
//!
//! A category is derived from an order's three current states and never
//! stored. Predicates are evaluated in a fixed priority order and the first
//! match wins; an order matching none of them is uncategorized and appears
//! in no filtered list.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::order::Order;
use crate::types::state::{DeliveryState, OrderState, PaymentState};

/// A list-view bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Open and not yet paid.
    Open,
    /// Open and paid, waiting to be processed.
    Paid,
    /// Being produced; delivery not started.
    InProgress,
    /// Being produced and shipped or ready to ship.
    Shipping,
    /// Done.
    Completed,
}

impl Category {
    /// All categories in priority order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Paid,
        Self::InProgress,
        Self::Shipping,
        Self::Completed,
    ];

    /// URL segment for this category.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paid => "paid",
            Self::InProgress => "in-progress",
            Self::Shipping => "shipping",
            Self::Completed => "completed",
        }
    }

    /// Heading used by the dashboard.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Open => "Offen",
            Self::Paid => "Bezahlt",
            Self::InProgress => "In Produktion",
            Self::Shipping => "Im Versand",
            Self::Completed => "Abgeschlossen",
        }
    }

    /// Which order-state list holds the orders of this category.
    #[must_use]
    pub const fn list_filter(self) -> OrderState {
        match self {
            Self::Open | Self::Paid => OrderState::Open,
            Self::InProgress | Self::Shipping => OrderState::InProgress,
            Self::Completed => OrderState::Completed,
        }
    }

    /// Whether `order` satisfies this category's predicate on its own.
    ///
    /// Use [`categorize`] to get the first-match-wins classification.
    #[must_use]
    pub fn matches(self, order: &Order) -> bool {
        let in_state = |state: OrderState| order.state_machine_state.is(state.as_str());
        match self {
            Self::Open => {
                in_state(OrderState::Open)
                    && order.payment_state() != Some(PaymentState::Paid.as_str())
            }
            Self::Paid => {
                in_state(OrderState::Open)
                    && order.payment_state() == Some(PaymentState::Paid.as_str())
            }
            Self::InProgress => {
                in_state(OrderState::InProgress)
                    && order.delivery_state() == Some(DeliveryState::Open.as_str())
            }
            Self::Shipping => {
                in_state(OrderState::InProgress)
                    && order
                        .delivery_state()
                        .and_then(DeliveryState::from_technical_name)
                        .is_some_and(|s| {
                            matches!(
                                s,
                                DeliveryState::ShippedPartially
                                    | DeliveryState::Shipped
                                    | DeliveryState::ShipmentReady
                            )
                        })
            }
            Self::Completed => in_state(OrderState::Completed),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == s)
            .ok_or_else(|| format!("invalid category: {s}"))
    }
}

/// Classify `order`; `None` means uncategorized.
#[must_use]
pub fn categorize(order: &Order) -> Option<Category> {
    Category::ALL.into_iter().find(|c| c.matches(order))
}

/// Keep the orders that classify as `category`.
#[must_use]
pub fn filter_category(orders: Vec<Order>, category: Category) -> Vec<Order> {
    orders
        .into_iter()
        .filter(|o| categorize(o) == Some(category))
        .collect()
}

/// Per-category order counts for dashboard badges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub open: usize,
    pub paid: usize,
    pub in_progress: usize,
    pub shipping: usize,
    pub completed: usize,
    pub uncategorized: usize,
}

impl CategoryCounts {
    /// Count `orders` by category.
    #[must_use]
    pub fn tally<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        orders
            .into_iter()
            .fold(Self::default(), |mut acc, order| {
                match categorize(order) {
                    Some(Category::Open) => acc.open += 1,
                    Some(Category::Paid) => acc.paid += 1,
                    Some(Category::InProgress) => acc.in_progress += 1,
                    Some(Category::Shipping) => acc.shipping += 1,
                    Some(Category::Completed) => acc.completed += 1,
                    None => acc.uncategorized += 1,
                }
                acc
            })
    }

    /// Count for one category.
    #[must_use]
    pub const fn get(&self, category: Category) -> usize {
        match category {
            Category::Open => self.open,
            Category::Paid => self.paid,
            Category::InProgress => self.in_progress,
            Category::Shipping => self.shipping,
            Category::Completed => self.completed,
        }
    }
}

/// Coarse shipping method, derived from the method's display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ShippingKind {
    Freight,
    ParcelEu,
    ParcelDe,
    CargoBike,
    Pickup,
    Basic,
    BulkyDe,
    Unknown,
}

impl ShippingKind {
    /// Keyword rules checked in order; the first keyword found in the name wins.
    const RULES: [(&'static str, Self); 7] = [
        ("Spedition", Self::Freight),
        ("Postversand", Self::ParcelEu),
        ("Standardversand", Self::ParcelDe),
        ("Lastenrad", Self::CargoBike),
        ("Selbstabholung", Self::Pickup),
        ("BASIS", Self::Basic),
        ("Sperrgut", Self::BulkyDe),
    ];

    /// Classify a shipping method name.
    #[must_use]
    pub fn classify(method_name: &str) -> Self {
        Self::RULES
            .iter()
            .find(|(keyword, _)| method_name.contains(keyword))
            .map_or(Self::Unknown, |(_, kind)| *kind)
    }

    /// Classify an order's active delivery.
    #[must_use]
    pub fn of(order: &Order) -> Self {
        order
            .shipping_method_name()
            .map_or(Self::Unknown, Self::classify)
    }

    /// Label used in the order list.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Freight => "Spedition",
            Self::ParcelEu => "Postversand EU",
            Self::ParcelDe => "Postversand DE",
            Self::CargoBike => "Lastenrad",
            Self::Pickup => "Selbstabholung",
            Self::Basic => "Basis",
            Self::BulkyDe => "Sperrgut DE",
            Self::Unknown => "???",
        }
    }
}
