//! Order list, detail and transition handlers.

use askama::Template;
use axum::{
    Form, Json,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use kiezbett_core::{Capability, Category, OrderId, StateAxis, Transition, TransitionAction};
use serde::Deserialize;
use tracing::instrument;

use super::views::{OrderDetailView, OrderRowView, PageContext};
use super::{render, safe_return_to};
use crate::{
    error::AppError, middleware::RequireActor, services::TransitionRequest, state::AppState,
};

/// Transition form posted by the action menus.
#[derive(Debug, Deserialize)]
pub struct TransitionForm {
    /// `order`, `payment` or `delivery`.
    pub axis: String,
    /// Action label or wire payload.
    pub action: String,
    /// Transaction or delivery id; optional for order actions.
    #[serde(default)]
    pub subject_id: Option<String>,
    /// Page to go back to afterwards.
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Query for the developer transition graph.
#[derive(Debug, Deserialize)]
pub struct TransitionsQuery {
    #[serde(rename = "type")]
    pub axis: String,
}

/// Category list template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub title: &'static str,
    pub orders: Vec<OrderRowView>,
}

/// Order detail template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub page: PageContext,
    pub order: OrderDetailView,
    pub can_manage_links: bool,
}

fn parse_axis(raw: &str) -> Result<StateAxis, AppError> {
    raw.parse::<StateAxis>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Orders of one category.
#[instrument(skip(actor, state))]
pub async fn index(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ViewOrders)?;
    let category: Category = category
        .parse()
        .map_err(|_| AppError::NotFound(format!("category {category}")))?;

    let can_change = actor.can(&state, Capability::ChangeOrderState);
    let orders = state.orders().list_category(category).await?;

    let template = OrdersIndexTemplate {
        page: PageContext::new(
            actor.0.display_name(),
            &format!("/orders/{}", category.slug()),
            actor.can(&state, Capability::ManageGlobalLinks),
        ),
        title: category.title(),
        orders: orders
            .iter()
            .map(|order| OrderRowView::new(order, can_change))
            .collect(),
    };

    Ok(render(&template))
}

/// Order detail page.
#[instrument(skip(actor, state))]
pub async fn show(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ViewOrders)?;

    let order = state.orders().get(&OrderId::new(id)).await?;
    let template = OrderShowTemplate {
        page: PageContext::new(
            actor.0.display_name(),
            &format!("/order/{}", order.id),
            actor.can(&state, Capability::ManageGlobalLinks),
        ),
        order: OrderDetailView::new(&order, actor.can(&state, Capability::ChangeOrderState)),
        can_manage_links: actor.can(&state, Capability::ManageLinks),
    };

    Ok(render(&template))
}

/// Request a transition and go back to the page it was requested from.
#[instrument(skip(actor, state, form), fields(axis = %form.axis, action = %form.action))]
pub async fn transition(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<TransitionForm>,
) -> Result<Redirect, AppError> {
    actor.require(&state, Capability::ChangeOrderState)?;

    let axis = parse_axis(&form.axis)?;
    let action = TransitionAction::parse(axis, &form.action)?;
    let order_id = OrderId::new(id);
    let fallback = format!("/order/{order_id}");

    state
        .orders()
        .transition(TransitionRequest {
            order_id,
            subject_id: form.subject_id,
            action,
        })
        .await?;

    Ok(Redirect::to(&safe_return_to(
        form.return_to.as_deref(),
        &fallback,
    )))
}

/// The backend's transition graph for one axis.
#[instrument(skip(actor, state))]
pub async fn transitions(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TransitionsQuery>,
) -> Result<Json<Vec<Transition>>, AppError> {
    actor.require(&state, Capability::Developer)?;

    let axis = parse_axis(&query.axis)?;
    let transitions = state
        .orders()
        .transitions(&OrderId::new(id), axis)
        .await?;
    Ok(Json(transitions))
}
