//! Deep-link management pages.
//!
//! Creating a link renders the list directly with the new URL on top, since
//! that is the only moment the operator needs to copy it.

use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    response::{Html, Redirect},
};
use kiezbett_core::{Actor, Capability, LinkScope, LinkToken, OrderId};
use serde::Deserialize;
use tracing::instrument;

use super::views::{LinkView, PageContext, format_datetime};
use super::{render, safe_return_to};
use crate::{
    error::AppError, middleware::RequireActor, services::IssuedLink, state::AppState,
};

/// Create-link form. An empty lifetime means the default.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLinkForm {
    #[serde(default)]
    pub ttl_days: Option<String>,
}

/// Revoke form.
#[derive(Debug, Deserialize)]
pub struct RevokeForm {
    /// Order id, or `global`.
    pub scope: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

/// Banner for a link that was just issued.
#[derive(Debug, Clone)]
pub struct IssuedView {
    pub public_url: String,
    pub expires_at: String,
}

impl From<&IssuedLink> for IssuedView {
    fn from(issued: &IssuedLink) -> Self {
        Self {
            public_url: issued.public_url.clone(),
            expires_at: format_datetime(&issued.created.expires_at),
        }
    }
}

/// Links of one scope.
#[derive(Template)]
#[template(path = "links/index.html")]
pub struct LinksTemplate {
    pub page: PageContext,
    pub title: String,
    /// Form target for issuing and the `scope` value for revoking.
    pub action_path: String,
    pub scope_key: String,
    pub default_ttl_days: u16,
    pub issued: Option<IssuedView>,
    pub active: Vec<LinkView>,
    pub expired: Vec<LinkView>,
}

fn parse_ttl(raw: Option<&str>) -> Result<Option<u16>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<u16>()
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("invalid lifetime `{s}`"))),
    }
}

const fn scope_capability(scope: &LinkScope) -> Capability {
    match scope {
        LinkScope::Order(_) => Capability::ManageLinks,
        LinkScope::Global => Capability::ManageGlobalLinks,
    }
}

async fn links_page(
    actor: &Actor,
    state: &AppState,
    scope: LinkScope,
    issued: Option<&IssuedLink>,
) -> Result<Html<String>, AppError> {
    let service = state.links();
    let overview = service.list(&scope).await?;
    let base_url = service.base_url();

    let (title, action_path, default_ttl_days) = match &scope {
        LinkScope::Order(id) => (
            format!("Links für Bestellung {id}"),
            format!("/order/{id}/links"),
            service.defaults().order_ttl_days,
        ),
        LinkScope::Global => (
            "Globale Links".to_string(),
            "/links/global".to_string(),
            service.defaults().global_ttl_days,
        ),
    };

    let template = LinksTemplate {
        page: PageContext::new(
            actor.display_name(),
            &action_path,
            state.capabilities().has_capability(actor, Capability::ManageGlobalLinks),
        ),
        title,
        action_path,
        scope_key: scope.lookup_key().to_string(),
        default_ttl_days,
        issued: issued.map(IssuedView::from),
        active: overview
            .active
            .iter()
            .map(|t| LinkView::new(t, base_url))
            .collect(),
        expired: overview
            .expired
            .iter()
            .map(|t| LinkView::new(t, base_url))
            .collect(),
    };

    Ok(render(&template))
}

/// Links of one order.
#[instrument(skip(actor, state))]
pub async fn order_links(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ManageLinks)?;
    links_page(&actor.0, &state, LinkScope::Order(OrderId::new(id)), None).await
}

/// Issue a link for one order.
#[instrument(skip(actor, state, form))]
pub async fn create_order_link(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ManageLinks)?;

    let ttl = parse_ttl(form.ttl_days.as_deref())?;
    let issued = state
        .links()
        .create_for_order(&actor.0, OrderId::new(id), ttl)
        .await?;
    links_page(&actor.0, &state, issued.scope.clone(), Some(&issued)).await
}

/// Global links.
#[instrument(skip(actor, state))]
pub async fn global_links(
    actor: RequireActor,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ManageGlobalLinks)?;
    links_page(&actor.0, &state, LinkScope::Global, None).await
}

/// Issue a global link.
#[instrument(skip(actor, state, form))]
pub async fn create_global_link(
    actor: RequireActor,
    State(state): State<AppState>,
    Form(form): Form<CreateLinkForm>,
) -> Result<Html<String>, AppError> {
    actor.require(&state, Capability::ManageGlobalLinks)?;

    let ttl = parse_ttl(form.ttl_days.as_deref())?;
    let issued = state.links().create_global(&actor.0, ttl).await?;
    links_page(&actor.0, &state, LinkScope::Global, Some(&issued)).await
}

/// Revoke a link of the posted scope and return to the list it was revoked from.
#[instrument(skip_all, fields(scope = %form.scope))]
pub async fn revoke(
    actor: RequireActor,
    State(state): State<AppState>,
    Path(token): Path<String>,
    Form(form): Form<RevokeForm>,
) -> Result<Redirect, AppError> {
    let scope = if form.scope == "global" {
        LinkScope::Global
    } else {
        LinkScope::Order(OrderId::new(form.scope.clone()))
    };
    actor.require(&state, Capability::ManageLinks)?;
    actor.require(&state, scope_capability(&scope))?;

    let token = LinkToken::parse(&token)?;
    state.links().revoke_in_scope(&scope, &token).await?;

    let fallback = match &scope {
        LinkScope::Order(id) => format!("/order/{id}/links"),
        LinkScope::Global => "/links/global".to_string(),
    };
    Ok(Redirect::to(&safe_return_to(
        form.return_to.as_deref(),
        &fallback,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ttl() {
        assert_eq!(parse_ttl(None).ok(), Some(None));
        assert_eq!(parse_ttl(Some("  ")).ok(), Some(None));
        assert_eq!(parse_ttl(Some("14")).ok(), Some(Some(14)));
        assert!(matches!(
            parse_ttl(Some("soon")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_global_scope_needs_global_capability() {
        assert_eq!(
            scope_capability(&LinkScope::Global),
            Capability::ManageGlobalLinks
        );
        assert_eq!(
            scope_capability(&LinkScope::Order(OrderId::new("o-1"))),
            Capability::ManageLinks
        );
    }
}
