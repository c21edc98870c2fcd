//! Operator session persisted between runs.
//!
//! The toolbox acts on behalf of one signed-in operator. The session (bearer
//! token, expiry and the actor it belongs to) is written to a JSON file by
//! `kb-cli login` and read back by the server and the CLI. Only the backend
//! client turns it into an `Authorization` header.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use kiezbett_core::Actor;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from loading, saving or using the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Nobody is signed in.
    #[error("No active session found")]
    NoSession,

    /// The stored token is past its expiry.
    #[error("Session expired at {0}")]
    Expired(DateTime<Utc>),

    /// Reading or writing the session file failed.
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file is not valid JSON.
    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A signed-in operator.
#[derive(Clone)]
pub struct Session {
    /// Bearer token for the backend.
    pub access_token: SecretString,
    /// When the token stops working, if known.
    pub expires_at: Option<DateTime<Utc>>,
    /// Who the token belongs to.
    pub actor: Actor,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("actor", &self.actor)
            .finish()
    }
}

impl Session {
    /// Whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// On-disk shape of a session.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
    actor: Actor,
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            access_token: SecretString::from(stored.access_token),
            expires_at: stored.expires_at,
            actor: stored.actor,
        }
    }
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.expose_secret().to_string(),
            expires_at: session.expires_at,
            actor: session.actor.clone(),
        }
    }
}

/// Shared handle to the current session and its backing file.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    path: PathBuf,
    current: RwLock<Loaded>,
}

/// What was last read from or written to the file.
#[derive(Default)]
struct Loaded {
    session: Option<Session>,
    /// File modification time at that point; `None` if there was no file.
    modified: Option<SystemTime>,
}

impl SessionManager {
    /// A manager for `path` with nobody signed in.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(SessionManagerInner {
                path: path.into(),
                current: RwLock::new(Loaded::default()),
            }),
        }
    }

    /// Open the session stored at `path`; a missing file means signed out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file exists but cannot be read and
    /// `SessionError::Corrupt` if it does not parse.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let manager = Self::new(path);
        manager.reload().await?;
        Ok(manager)
    }

    /// Re-read the session file.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::load`].
    pub async fn reload(&self) -> Result<(), SessionError> {
        let modified = self.file_modified().await?;
        let session = match tokio::fs::read_to_string(&self.inner.path).await {
            Ok(raw) => Some(Session::from(serde_json::from_str::<StoredSession>(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        *self.inner.current.write().await = Loaded { session, modified };
        Ok(())
    }

    async fn file_modified(&self) -> Result<Option<SystemTime>, SessionError> {
        match tokio::fs::metadata(&self.inner.path).await {
            Ok(meta) => Ok(meta.modified().ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store `session` in memory and on disk.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file cannot be written.
    pub async fn save(&self, session: Session) -> Result<(), SessionError> {
        let raw = serde_json::to_string_pretty(&StoredSession::from(&session))?;
        tokio::fs::write(&self.inner.path, raw).await?;
        tracing::info!(actor = %session.actor.id, "Session saved");
        let modified = self.file_modified().await?;
        *self.inner.current.write().await = Loaded {
            session: Some(session),
            modified,
        };
        Ok(())
    }

    /// Sign out: forget the session and delete the file.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Io` if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), SessionError> {
        *self.inner.current.write().await = Loaded::default();
        match tokio::fs::remove_file(&self.inner.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The current session, whether or not it has expired.
    pub async fn current(&self) -> Option<Session> {
        self.inner.current.read().await.session.clone()
    }

    /// The current, unexpired session.
    ///
    /// The file is read again whenever it changed on disk or the session in
    /// memory is missing or expired, so a login or logout from another
    /// process takes effect without a restart.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSession` when signed out and
    /// `SessionError::Expired` when the token is past its expiry.
    pub async fn active(&self) -> Result<Session, SessionError> {
        if self.is_stale().await? {
            self.reload().await?;
        }
        let session = self.current().await.ok_or(SessionError::NoSession)?;
        if let Some(at) = session.expires_at
            && session.is_expired_at(Utc::now())
        {
            return Err(SessionError::Expired(at));
        }
        Ok(session)
    }

    async fn is_stale(&self) -> Result<bool, SessionError> {
        let on_disk = self.file_modified().await?;
        let loaded = self.inner.current.read().await;
        Ok(loaded.modified != on_disk
            || loaded
                .session
                .as_ref()
                .is_none_or(|session| session.is_expired_at(Utc::now())))
    }

    /// The signed-in actor.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::active`].
    pub async fn actor(&self) -> Result<Actor, SessionError> {
        Ok(self.active().await?.actor)
    }

    /// `Authorization` header value for the backend.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::active`].
    pub async fn auth_header(&self) -> Result<String, SessionError> {
        let session = self.active().await?;
        Ok(format!("Bearer {}", session.access_token.expose_secret()))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }
}
