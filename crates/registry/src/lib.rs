//! # Junction Registry
//!
//! Statically-built map from action id to a (handler, config schema) pair.
//!
//! The registry is constructed once at process start through
//! [`ActionRegistry::builder`]; there is no runtime discovery or
//! reflection. Handlers registered with [`typed_action`]
//! [`ActionRegistryBuilder::typed_action`] get their configuration schema
//! derived from the declared config type and a deserialization-based
//! `validate_config`; untyped registrations fall back to a permissive
//! object schema.
//!
//! The same mapping is exported once at startup as the gateway's
//! [`IntegrationType`] definition and registered with the control plane —
//! a read-only view, nothing else reads the registry mutably after build.

/// Registry construction and lookup.
pub mod registry;
/// Typed-config validation adapter.
pub mod typed;

pub use registry::{ActionRegistry, ActionRegistryBuilder, RegisteredAction, RegistryError};
pub use typed::TypedConfig;
