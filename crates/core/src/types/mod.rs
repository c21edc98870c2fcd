//! Core types for the Kiezbett toolbox.
//!
//! This module provides type-safe wrappers for the order domain.

pub mod capability;
pub mod id;
pub mod link;
pub mod order;
pub mod state;
pub mod validation;

pub use capability::{Actor, Capability, CapabilityMap, Role};
pub use id::*;
pub use link::{
    LinkScope, LinkState, LinkToken, NewLink, OrderLinkToken, TokenInfo, partition_by_state,
};
pub use order::{
    Delivery, LineItem, LineItemOption, LineItemPayload, Order, OrderCustomer, ShippingAddress,
    ShippingMethod, Transaction,
};
pub use state::{
    DeliveryState, OrderState, PaymentState, StateAxis, StateMachineState, UnknownNameError,
};
pub use validation::ValidationError;
