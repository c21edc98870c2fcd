//! Order commands.

use kiezbett_core::{Category, Order, OrderId, StateAxis, TransitionAction};
use kiezbett_toolbox::services::TransitionRequest;
use kiezbett_toolbox::state::AppState;

fn state_cell(order: &Order, axis: StateAxis) -> String {
    order.state_on(axis).unwrap_or("-").to_string()
}

fn print_row(order: &Order) {
    println!(
        "{:<12} {:<10} {:<14} {:<14} {:<16}",
        order.id,
        order.order_number,
        state_cell(order, StateAxis::Order),
        state_cell(order, StateAxis::Payment),
        state_cell(order, StateAxis::Delivery),
    );
}

/// Print order counts per category.
pub async fn counts(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    let counts = state.orders().counts().await?;
    for category in Category::ALL {
        println!("{:<16} {}", category.title(), counts.get(category));
    }
    if counts.uncategorized > 0 {
        println!("{:<16} {}", "-", counts.uncategorized);
    }
    Ok(())
}

/// Print the orders of one category.
pub async fn list(state: &AppState, category: &str) -> Result<(), Box<dyn std::error::Error>> {
    let category: Category = category.parse()?;
    let orders = state.orders().list_category(category).await?;

    tracing::info!("{} orders in {}", orders.len(), category.title());
    for order in &orders {
        print_row(order);
    }
    Ok(())
}

/// Print one order.
pub async fn show(state: &AppState, order_id: String) -> Result<(), Box<dyn std::error::Error>> {
    let order = state.orders().get(&OrderId::new(order_id)).await?;
    println!("{}", serde_json::to_string_pretty(order.as_ref())?);
    Ok(())
}

/// Request a transition.
pub async fn transition(
    state: &AppState,
    order_id: String,
    axis: &str,
    action: &str,
    subject_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let axis: StateAxis = axis.parse()?;
    let action = TransitionAction::parse(axis, action)?;

    let orders = state
        .orders()
        .transition(TransitionRequest {
            order_id: OrderId::new(order_id),
            subject_id,
            action,
        })
        .await?;

    tracing::info!("Transition `{}` applied", action.label());
    for order in &orders {
        print_row(order);
    }
    Ok(())
}

/// Print the backend's transition graph.
pub async fn transitions(
    state: &AppState,
    order_id: String,
    axis: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let axis: StateAxis = axis.parse()?;
    let transitions = state
        .orders()
        .transitions(&OrderId::new(order_id), axis)
        .await?;
    println!("{}", serde_json::to_string_pretty(&transitions)?);
    Ok(())
}
