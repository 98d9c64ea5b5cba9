//! # Junction Core
//!
//! Domain model shared by every Junction crate.
//!
//! This crate defines **what** the gateway talks about — integrations,
//! per-action configuration, webhook configuration, handler contracts and the
//! cache key scheme — but nothing about how any of it is stored, fetched or
//! executed. Storage, caching and orchestration live in the sibling crates
//! and all speak the vocabulary defined here.
//!
//! ## Core Types
//!
//! - [`IntegrationId`] / [`ActionId`] / [`SourceId`] — validated identifiers
//! - [`Integration`] — one configured connection to an external vendor system
//! - [`IntegrationType`] — the set of actions a vendor integration supports
//! - [`ActionConfiguration`] / [`WebhookConfiguration`] — per-action and
//!   inbound-payload configuration records
//! - [`ActionHandler`] / [`WebhookHandler`] — the contracts vendor handlers
//!   implement
//! - [`keys`] — the single authority for cache-store key strings

/// Handler contracts and the handler error type.
pub mod handler;
/// Validated identifier newtypes.
pub mod id;
/// The integration graph: integrations, types, configurations.
pub mod integration;
/// Cache-store key scheme (exact, stable strings).
pub mod keys;

pub use handler::{ActionHandler, HandlerError, WebhookHandler};
pub use id::{ActionId, IdError, IntegrationId, SourceId, NO_SOURCE};
pub use integration::{
    ActionConfiguration, ActionDefinition, Integration, IntegrationType, ModelError,
    WebhookConfiguration,
};
