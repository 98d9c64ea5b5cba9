//! Cache-store key scheme.
//!
//! These strings are a stable external interface: other processes (and the
//! push-invalidation path) address the same cache entries, so the scheme
//! must never drift. Every key used anywhere in the workspace is built here.

use crate::id::{ActionId, IntegrationId, SourceId};

/// Key of the integration summary entry: `integration.<integration_id>`.
pub fn integration(id: &IntegrationId) -> String {
    format!("integration.{id}")
}

/// Key of one action's configuration entry:
/// `integrationconfig.<integration_id>.<action_id>`.
pub fn action_configuration(id: &IntegrationId, action_id: &ActionId) -> String {
    format!("integrationconfig.{id}.{action_id}")
}

/// Key of the webhook configuration entry:
/// `integrationconfig.<integration_id>.webhook`.
pub fn webhook_configuration(id: &IntegrationId) -> String {
    format!("integrationconfig.{id}.webhook")
}

/// Key of a cursor state record:
/// `integration_state.<integration_id>.<action_id>.<source_id>`.
pub fn state(id: &IntegrationId, action_id: &ActionId, source_id: &SourceId) -> String {
    format!("integration_state.{id}.{action_id}.{source_id}")
}
