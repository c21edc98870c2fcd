//! Deep-link commands.

use kiezbett_core::{Actor, LinkScope, LinkToken, OrderId};
use kiezbett_toolbox::state::AppState;

fn scope_of(order: Option<String>) -> LinkScope {
    order.map_or(LinkScope::Global, |id| LinkScope::Order(OrderId::new(id)))
}

async fn actor(state: &AppState) -> Result<Actor, Box<dyn std::error::Error>> {
    Ok(state.session().actor().await?)
}

/// Issue a link and print its URL.
pub async fn create(
    state: &AppState,
    order: Option<String>,
    days: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let actor = actor(state).await?;
    let issued = match scope_of(order) {
        LinkScope::Order(id) => state.links().create_for_order(&actor, id, days).await?,
        LinkScope::Global => state.links().create_global(&actor, days).await?,
    };

    tracing::info!("Link valid until {}", issued.created.expires_at);
    println!("{}", issued.public_url);
    Ok(())
}

/// List active and expired links.
pub async fn list(state: &AppState, order: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let scope = scope_of(order);
    let overview = state.links().list(&scope).await?;

    println!("active ({})", overview.active.len());
    for token in &overview.active {
        println!(
            "  {}  expires {}  used {}  by {}",
            token.token.expose(),
            token.expires_at,
            token.used_count,
            token.created_by.as_deref().unwrap_or("-"),
        );
    }
    println!("expired ({})", overview.expired.len());
    for token in &overview.expired {
        println!(
            "  {}  expired {}",
            token.token.redacted(),
            token.expires_at
        );
    }
    Ok(())
}

/// Revoke a link.
pub async fn revoke(state: &AppState, token: &str) -> Result<(), Box<dyn std::error::Error>> {
    let token = LinkToken::parse(token)?;
    state.links().revoke(&token).await?;
    tracing::info!("Revoked {}", token.redacted());
    Ok(())
}

/// Resolve a link without a session, as the public page would.
pub async fn resolve(
    state: &AppState,
    token: &str,
    global: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let token = LinkToken::parse(token)?;
    if global {
        let resolved = state.links().resolve_orders(&token).await?;
        println!("{} orders, link used {} times", resolved.orders.len(), resolved.token_info.used_count);
        for order in &resolved.orders {
            println!("  {} {}", order.order_number, order.order_state());
        }
    } else {
        let resolved = state.links().resolve_order(&token).await?;
        println!(
            "order {} valid until {}",
            resolved.order.order_number, resolved.token_info.expires_at
        );
    }
    Ok(())
}
