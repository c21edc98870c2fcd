//! Kiezbett toolbox library.
//!
//! Order dashboard for the Kiezbett team and public order pages reached
//! through deep links. Orders live in the hosted backend; the toolbox only
//! reads them, requests state transitions and manages link tokens.
//!
//! # Security
//!
//! The toolbox acts with a single stored operator session. Internal pages
//! are gated by capabilities; public pages are gated by their link token.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
