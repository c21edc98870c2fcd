//! Business logic services for the toolbox.
//!
//! # Services
//!
//! - `orders` - Cached order reads, category lists and transitions
//! - `links` - Deep-link issue, listing, revocation and resolution
//!
//! Services read through the [`OrderCache`](crate::cache::OrderCache) and
//! invalidate it after every successful mutation. Routes and the CLI only
//! talk to services, never to the backend client directly.

pub mod links;
pub mod orders;

pub use links::{IssuedLink, LinkOverview, LinkService};
pub use orders::{OrderService, TransitionRequest};
