//! HTTP middleware and extractors for the toolbox.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans with status and latency)
//! 3. Security headers
//! 4. [`auth::RequireActor`] on internal routes (session + capability check)
//!
//! Public token routes carry no actor extractor.

pub mod auth;
pub mod security_headers;

pub use auth::RequireActor;
