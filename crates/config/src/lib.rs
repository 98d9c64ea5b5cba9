//! # Junction Config
//!
//! Cache-aside configuration store.
//!
//! The control plane is the source of truth for the integration graph;
//! [`ConfigCache`] shields it from repeated lookups. Reads check the
//! key-value store first and only fetch on a miss — and one miss reloads the
//! **entire** graph, writing back the integration summary, every action
//! configuration and the webhook configuration under their own keys with a
//! shared TTL, so N subsequent reads cost zero further round trips.
//!
//! `set_*` / `delete_*` are direct pass-throughs used by the push
//! invalidation path; they never trigger a reload.

/// Cache-aside store over the control plane.
pub mod cache;
/// Control-plane port and HTTP client.
pub mod control_plane;

pub use cache::{ConfigCache, ConfigError};
pub use control_plane::{ControlPlane, ControlPlaneError, HttpControlPlane};
