//! # Junction Engine
//!
//! The action execution runtime.
//!
//! A trigger names an (integration, action) pair; [`ActionRunner::execute`]
//! resolves the integration graph through the config cache, merges caller
//! overrides into the stored configuration, dispatches to the registered
//! handler and classifies every failure path. The companion
//! [`ConfigEventConsumer`] applies control-plane push notifications to the
//! cache so configuration changes become visible before TTL expiry.
//!
//! Execution is cooperative and uncoordinated: each trigger runs as its own
//! task, and two concurrent executions of the same pair race freely —
//! the cache and state stores are last-writer-wins by design.

/// Push-invalidation consumer.
pub mod consumer;
/// Classified execution errors.
pub mod error;
/// The action runner.
pub mod runner;

pub use consumer::{ConfigEventConsumer, ConfigPushEvent, ConsumerError};
pub use error::{ErrorKind, ExecuteError};
pub use runner::{ActionRunner, DEFAULT_CONFIG_TTL};

use junction_config::{ControlPlane, ControlPlaneError};
use junction_registry::ActionRegistry;

/// One-time startup export: register the gateway's action registry with the
/// control plane as an integration type named `type_name`.
pub async fn register_startup(
    control_plane: &dyn ControlPlane,
    registry: &ActionRegistry,
    type_name: &str,
) -> Result<(), ControlPlaneError> {
    let definition = registry.integration_type_definition(type_name);
    tracing::info!(
        type_name,
        actions = definition.actions.len(),
        "registering integration type with control plane"
    );
    control_plane.register_integration_type(&definition).await
}
