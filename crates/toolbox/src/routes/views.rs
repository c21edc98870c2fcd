//! View models shared by the internal and public pages.
//!
//! Templates only see plain strings and flags; everything that needs domain
//! knowledge (active delivery, offered actions, shipping kind) is resolved
//! here.

use chrono::{DateTime, Utc};
use kiezbett_core::{
    Category, Order, OrderLinkToken, ShippingKind, StateAxis, StateMachineState,
    allowed_transitions_for, categorize,
};

/// Format a timestamp for display.
pub fn format_datetime(at: &DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

fn state_label(state: &StateMachineState) -> String {
    if state.name.is_empty() {
        state.technical_name.clone()
    } else {
        state.name.clone()
    }
}

/// Navigation entry for a category list.
#[derive(Debug, Clone)]
pub struct NavItem {
    pub href: String,
    pub title: &'static str,
    pub active: bool,
}

/// Data every internal page needs for its layout.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub actor_name: String,
    pub current_path: String,
    pub nav: Vec<NavItem>,
    pub can_manage_global_links: bool,
}

impl PageContext {
    #[must_use]
    pub fn new(actor_name: &str, current_path: &str, can_manage_global_links: bool) -> Self {
        let nav = Category::ALL
            .into_iter()
            .map(|c| {
                let href = format!("/orders/{}", c.slug());
                NavItem {
                    active: href == current_path,
                    href,
                    title: c.title(),
                }
            })
            .collect();
        Self {
            actor_name: actor_name.to_string(),
            current_path: current_path.to_string(),
            nav,
            can_manage_global_links,
        }
    }
}

/// One transition button.
#[derive(Debug, Clone)]
pub struct ActionView {
    pub axis: &'static str,
    /// Value posted back as `action`.
    pub action: &'static str,
    pub label: &'static str,
    /// Transaction or delivery id the action applies to.
    pub subject_id: String,
}

/// Current state and offered actions on one axis.
#[derive(Debug, Clone)]
pub struct AxisView {
    pub axis: &'static str,
    pub state: String,
    pub actions: Vec<ActionView>,
}

impl AxisView {
    fn new(order: &Order, axis: StateAxis, with_actions: bool) -> Self {
        let state = match axis {
            StateAxis::Order => Some(state_label(&order.state_machine_state)),
            StateAxis::Payment => order
                .active_transaction()
                .map(|t| state_label(&t.state_machine_state)),
            StateAxis::Delivery => order
                .active_delivery()
                .map(|d| state_label(&d.state_machine_state)),
        };
        let actions = match order.subject_id(axis) {
            Some(subject_id) if with_actions => allowed_transitions_for(order, axis)
                .iter()
                .map(|a| ActionView {
                    axis: axis.as_str(),
                    action: a.label(),
                    label: a.label(),
                    subject_id: subject_id.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            axis: axis.as_str(),
            state: state.unwrap_or_else(|| "-".to_string()),
            actions,
        }
    }
}

/// Row in an order list.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub id: String,
    pub number: String,
    pub created_at: String,
    pub customer: String,
    pub city: String,
    pub shipping: &'static str,
    pub shipping_date: String,
    pub category: &'static str,
    pub axes: Vec<AxisView>,
}

impl OrderRowView {
    /// Build a row; `with_actions` controls whether transition buttons are offered.
    #[must_use]
    pub fn new(order: &Order, with_actions: bool) -> Self {
        let address = order
            .active_delivery()
            .and_then(|d| d.shipping_order_address.as_ref());
        let customer = address
            .map(kiezbett_core::ShippingAddress::full_name)
            .filter(|n| !n.is_empty())
            .or_else(|| order.customer_email().map(str::to_string))
            .unwrap_or_else(|| "-".to_string());

        Self {
            id: order.id.to_string(),
            number: order.order_number.clone(),
            created_at: order
                .created_at
                .as_ref()
                .map_or_else(String::new, format_datetime),
            customer,
            city: address.map(|a| a.city.clone()).unwrap_or_default(),
            shipping: ShippingKind::of(order).label(),
            shipping_date: order
                .active_delivery()
                .and_then(|d| d.shipping_date_latest.clone())
                .unwrap_or_default(),
            category: categorize(order).map_or("-", Category::title),
            axes: StateAxis::ALL
                .iter()
                .map(|axis| AxisView::new(order, *axis, with_actions))
                .collect(),
        }
    }
}

/// Line item in the detail and public views.
#[derive(Debug, Clone)]
pub struct LineItemView {
    pub quantity: u32,
    pub label: String,
    pub options: Vec<String>,
}

/// Full order for the detail and public pages.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub row: OrderRowView,
    pub email: String,
    pub comment: String,
    pub address_lines: Vec<String>,
    pub line_items: Vec<LineItemView>,
}

impl OrderDetailView {
    #[must_use]
    pub fn new(order: &Order, with_actions: bool) -> Self {
        let address_lines = order
            .active_delivery()
            .and_then(|d| d.shipping_order_address.as_ref())
            .map(|a| {
                [
                    a.full_name(),
                    a.street.clone(),
                    format!("{} {}", a.zipcode, a.city).trim().to_string(),
                    a.country.clone().unwrap_or_default(),
                ]
                .into_iter()
                .filter(|line| !line.is_empty())
                .collect()
            })
            .unwrap_or_default();

        Self {
            row: OrderRowView::new(order, with_actions),
            email: order.customer_email().unwrap_or_default().to_string(),
            comment: order.customer_comment.clone().unwrap_or_default(),
            address_lines,
            line_items: order
                .line_items
                .iter()
                .map(|item| LineItemView {
                    quantity: item.quantity,
                    label: item.label.clone(),
                    options: item
                        .payload
                        .options
                        .iter()
                        .map(|o| format!("{}: {}", o.group, o.option))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A listed deep link.
#[derive(Debug, Clone)]
pub struct LinkView {
    pub token: String,
    pub public_url: String,
    pub created_at: String,
    pub expires_at: String,
    pub created_by: String,
    pub used_count: u64,
}

impl LinkView {
    #[must_use]
    pub fn new(token: &OrderLinkToken, base_url: &str) -> Self {
        Self {
            token: token.token.expose().to_string(),
            public_url: format!("{base_url}{}", token.scope().public_path(&token.token)),
            created_at: format_datetime(&token.created_at),
            expires_at: format_datetime(&token.expires_at),
            created_by: token.created_by.clone().unwrap_or_default(),
            used_count: token.used_count,
        }
    }
}
