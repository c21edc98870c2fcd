//! Toolbox configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKEND_URL` - Hosted backend project URL (serverless functions live under `/functions/v1`)
//!
//! ## Optional
//! - `BACKEND_ANON_KEY` - Public anon key sent as `apikey` header
//! - `BACKEND_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `TOOLBOX_HOST` - Bind address (default: 127.0.0.1)
//! - `TOOLBOX_PORT` - Listen port (default: 3001)
//! - `TOOLBOX_BASE_URL` - Public URL used in deep links (default: `http://{host}:{port}`)
//! - `TOOLBOX_SESSION_FILE` - Persisted session (default: .kiezbett-session.json)
//! - `TOOLBOX_DEVELOPER_IDS` - Comma-separated actor ids granted developer tooling
//! - `CACHE_TTL_SECS` - Read cache lifetime (default: 60)
//! - `ORDER_LINK_TTL_DAYS` - Default lifetime of single-order links (default: 7)
//! - `GLOBAL_LINK_TTL_DAYS` - Default lifetime of global links (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use kiezbett_core::{ActorId, Capability, CapabilityMap};
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SESSION_FILE: &str = ".kiezbett-session.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Toolbox application configuration.
#[derive(Debug, Clone)]
pub struct ToolboxConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the toolbox (deep links point here)
    pub base_url: String,
    /// Hosted backend configuration
    pub backend: BackendConfig,
    /// Where the operator session is persisted
    pub session_file: PathBuf,
    /// Read cache time-to-live
    pub cache_ttl: Duration,
    /// Default deep-link lifetimes
    pub links: LinkDefaults,
    /// Actors granted developer tooling regardless of role
    pub developer_ids: Vec<ActorId>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Hosted backend configuration.
///
/// Implements `Debug` manually to redact the anon key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. `https://abc.supabase.co`
    pub url: Url,
    /// Public anon key, if the functions gateway wants one
    pub anon_key: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &self.anon_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackendConfig {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Backend at `url` with no anon key and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `url` is not an absolute URL.
    pub fn new(url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url("BACKEND_URL", url)?,
            anon_key: None,
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Base URL of the serverless functions.
    #[must_use]
    pub fn functions_url(&self) -> String {
        format!("{}/functions/v1", self.url.as_str().trim_end_matches('/'))
    }

    fn from_env() -> Result<Self, ConfigError> {
        let url = parse_url("BACKEND_URL", &get_required_env("BACKEND_URL")?)?;
        let anon_key = get_optional_env("BACKEND_ANON_KEY").map(|key| {
            if let Err(e) = validate_secret_strength(&key, "BACKEND_ANON_KEY") {
                tracing::warn!("BACKEND_ANON_KEY validation warning: {e}");
            }
            SecretString::from(key)
        });
        let timeout = get_env_or_default("BACKEND_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BACKEND_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url,
            anon_key,
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// Default lifetimes offered when issuing deep links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDefaults {
    /// Single-order links
    pub order_ttl_days: u16,
    /// Global links
    pub global_ttl_days: u16,
}

impl Default for LinkDefaults {
    fn default() -> Self {
        Self {
            order_ttl_days: 7,
            global_ttl_days: 30,
        }
    }
}

impl ToolboxConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = get_env_or_default("TOOLBOX_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TOOLBOX_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TOOLBOX_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TOOLBOX_PORT".to_string(), e.to_string()))?;
        let base_url = get_optional_env("TOOLBOX_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        parse_url("TOOLBOX_BASE_URL", &base_url)?;

        let backend = BackendConfig::from_env()?;
        let session_file = PathBuf::from(get_env_or_default(
            "TOOLBOX_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));
        let cache_ttl = get_env_or_default("CACHE_TTL_SECS", "60")
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar("CACHE_TTL_SECS".to_string(), e.to_string()))?;
        let links = LinkDefaults {
            order_ttl_days: parse_days("ORDER_LINK_TTL_DAYS", "7")?,
            global_ttl_days: parse_days("GLOBAL_LINK_TTL_DAYS", "30")?,
        };
        let developer_ids = parse_id_list(&get_env_or_default("TOOLBOX_DEVELOPER_IDS", ""));
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            backend,
            session_file,
            cache_ttl,
            links,
            developer_ids,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Configuration for a local toolbox talking to `backend`, used by the CLI and tests.
    #[must_use]
    pub fn local(backend: BackendConfig, session_file: PathBuf) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url: "http://127.0.0.1:3001".to_string(),
            backend,
            session_file,
            cache_ttl: Duration::from_secs(60),
            links: LinkDefaults::default(),
            developer_ids: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Standard role grants plus developer tooling for the configured actors.
    #[must_use]
    pub fn capabilities(&self) -> CapabilityMap {
        self.developer_ids
            .iter()
            .cloned()
            .fold(CapabilityMap::standard(), |map, id| {
                map.grant_actor(id, [Capability::Developer])
            })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_days(key: &str, default: &str) -> Result<u16, ConfigError> {
    let days = get_env_or_default(key, default)
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(kiezbett_core::NewLink::MIN_TTL_DAYS..=kiezbett_core::NewLink::MAX_TTL_DAYS)
        .contains(&days)
    {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("{days} is outside 1..=365"),
        ));
    }
    Ok(days)
}

/// Parse a comma-separated list of actor ids, skipping blanks.
fn parse_id_list(raw: &str) -> Vec<ActorId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ActorId::from)
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
