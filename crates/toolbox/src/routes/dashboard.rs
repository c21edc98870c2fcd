//! Dashboard route handler.

use askama::Template;
use axum::{extract::State, response::Html};
use kiezbett_core::{Capability, Category};
use tracing::instrument;

use super::render;
use super::views::PageContext;
use crate::{error::AppError, middleware::RequireActor, state::AppState};

/// Count badge for one category.
#[derive(Debug, Clone)]
pub struct CategoryCard {
    pub href: String,
    pub title: &'static str,
    pub count: usize,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub cards: Vec<CategoryCard>,
    pub uncategorized: usize,
}

/// Dashboard page handler.
#[instrument(skip(actor, state))]
pub async fn dashboard(
    actor: RequireActor,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ViewOrders)?;

    let counts = state.orders().counts().await?;
    let cards = Category::ALL
        .into_iter()
        .map(|category| CategoryCard {
            href: format!("/orders/{}", category.slug()),
            title: category.title(),
            count: counts.get(category),
        })
        .collect();

    let template = DashboardTemplate {
        page: PageContext::new(
            actor.0.display_name(),
            "/",
            actor.can(&state, Capability::ManageGlobalLinks),
        ),
        cards,
        uncategorized: counts.uncategorized,
    };

    Ok(render(&template))
}
