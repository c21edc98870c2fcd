//! Session commands.
//!
//! # Environment Variables
//!
//! - `TOOLBOX_SESSION_FILE` - Where the session is stored (default: .kiezbett-session.json)
//! - `KIEZBETT_ACCESS_TOKEN` - Access token for `login` when `--token` is omitted

use std::path::PathBuf;

use chrono::{Duration, Utc};
use kiezbett_core::{Actor, ActorId, Role};
use kiezbett_toolbox::session::{Session, SessionError, SessionManager};
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_SESSION_FILE: &str = ".kiezbett-session.json";

/// Errors that can occur during session commands.
#[derive(Debug, Error)]
pub enum SessionCommandError {
    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, editor, viewer")]
    InvalidRole(String),

    /// Blank token or actor id.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// Expiry must lie in the future.
    #[error("Expiry must be at least one hour, got {0}")]
    InvalidExpiry(i64),

    /// Reading or writing the session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

fn session_file() -> PathBuf {
    std::env::var("TOOLBOX_SESSION_FILE")
        .map_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from)
}

/// Build the session `login` stores.
fn build_session(
    token: String,
    actor_id: &str,
    email: Option<String>,
    role: Option<&str>,
    expires_in_hours: Option<i64>,
) -> Result<Session, SessionCommandError> {
    if token.trim().is_empty() {
        return Err(SessionCommandError::Empty("Token"));
    }
    if actor_id.trim().is_empty() {
        return Err(SessionCommandError::Empty("Actor id"));
    }
    let role = role
        .map(|r| {
            r.parse::<Role>()
                .map_err(|_| SessionCommandError::InvalidRole(r.to_owned()))
        })
        .transpose()?;
    let expires_at = match expires_in_hours {
        Some(hours) if hours < 1 => return Err(SessionCommandError::InvalidExpiry(hours)),
        Some(hours) => Some(Utc::now() + Duration::hours(hours)),
        None => None,
    };

    Ok(Session {
        access_token: SecretString::from(token),
        expires_at,
        actor: Actor {
            id: ActorId::new(actor_id.trim()),
            email,
            role,
        },
    })
}

/// Store an operator session.
pub async fn login(
    token: String,
    actor_id: &str,
    email: Option<String>,
    role: Option<&str>,
    expires_in_hours: Option<i64>,
) -> Result<(), SessionCommandError> {
    let session = build_session(token, actor_id, email, role, expires_in_hours)?;
    let manager = SessionManager::new(session_file());
    manager.save(session).await?;

    tracing::info!("Session stored in {}", manager.path().display());
    Ok(())
}

/// Remove the stored session.
pub async fn logout() -> Result<(), SessionCommandError> {
    let manager = SessionManager::new(session_file());
    manager.clear().await?;
    tracing::info!("Signed out");
    Ok(())
}

/// Print the stored session's actor.
pub async fn whoami() -> Result<(), SessionCommandError> {
    let manager = SessionManager::load(session_file()).await?;
    let session = manager.active().await?;

    println!("{}", session.actor.display_name());
    if let Some(role) = session.actor.role {
        println!("role: {role}");
    }
    if let Some(expires_at) = session.expires_at {
        println!("expires: {expires_at}");
    }
    Ok(())
}
