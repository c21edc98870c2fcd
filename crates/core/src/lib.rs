//! Kiezbett Core - Shared order domain library.
//!
//! This crate provides the types and pure rules used across all toolbox
//! components:
//! - `toolbox` - Internal order dashboard and public tracking pages
//! - `cli` - Command-line access to orders and deep links
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The backend stays the authority on every state change; the rules
//! here only decide what the toolbox offers and how it groups orders.
//!
//! # Modules
//!
//! - [`types`] - Ids, state axes, the order model, deep links, capabilities
//! - [`transition`] - Transition actions and the per-state transition table
//! - [`category`] - First-match-wins classification of orders into list buckets

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod category;
pub mod transition;
pub mod types;

pub use category::{Category, CategoryCounts, ShippingKind, categorize, filter_category};
pub use transition::{
    DeliveryTransition, OrderTransition, PaymentTransition, Transition, TransitionAction,
    allowed_transitions, allowed_transitions_for,
};
pub use types::*;
