//! The integration graph.
//!
//! An [`Integration`] is one configured connection to an external vendor
//! system. The control plane is the only author of this data; the gateway
//! mirrors it into the cache store and never writes it back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{ActionId, IntegrationId};

/// Error raised when the integration graph violates its own invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// An [`ActionConfiguration`] references an action id the integration's
    /// type does not declare. Never ignored silently.
    #[error("integration `{integration_id}` carries a configuration for `{action_id}`, which its type `{type_name}` does not declare")]
    UndeclaredAction {
        /// The integration carrying the orphan configuration.
        integration_id: IntegrationId,
        /// The undeclared action id.
        action_id: ActionId,
        /// The integration type that was consulted.
        type_name: String,
    },
}

/// One configured connection to an external vendor system.
///
/// Created, updated and deleted by the control plane; the full graph —
/// including every [`ActionConfiguration`] and the optional
/// [`WebhookConfiguration`] — arrives in one piece from
/// `get_integration_details`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    /// Control-plane assigned identity.
    pub id: IntegrationId,
    /// Human-readable name.
    pub name: String,
    /// Disabled integrations refuse action execution.
    pub enabled: bool,
    /// The vendor type, declaring the supported actions and their schemas.
    pub integration_type: IntegrationType,
    /// Owning user or team, as reported by the control plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Base URL of the vendor API. Opaque here; vendor handlers interpret it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-action configuration records.
    #[serde(default)]
    pub action_configurations: Vec<ActionConfiguration>,
    /// Inbound-payload configuration, when the integration receives webhooks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_configuration: Option<WebhookConfiguration>,
}

impl Integration {
    /// The configuration for `action_id`, if the graph carries one.
    pub fn action_configuration(&self, action_id: &ActionId) -> Option<&ActionConfiguration> {
        self.action_configurations
            .iter()
            .find(|c| &c.action_id == action_id)
    }

    /// Checks the graph's own invariants: every carried configuration must
    /// reference an action the integration's type declares.
    pub fn validate(&self) -> Result<(), ModelError> {
        for config in &self.action_configurations {
            if !self.integration_type.declares(&config.action_id) {
                return Err(ModelError::UndeclaredAction {
                    integration_id: self.id.clone(),
                    action_id: config.action_id.clone(),
                    type_name: self.integration_type.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A vendor integration type: the set of supported actions and each action's
/// configuration schema.
///
/// Doubles as the definition exported to the control plane when the gateway
/// self-registers its action registry at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationType {
    /// Type name, e.g. `device-fleet`.
    pub name: String,
    /// Declared actions.
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

impl IntegrationType {
    /// Whether this type declares `action_id`.
    pub fn declares(&self, action_id: &ActionId) -> bool {
        self.definition(action_id).is_some()
    }

    /// The declaration for `action_id`, if present.
    pub fn definition(&self, action_id: &ActionId) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| &a.action_id == action_id)
    }
}

/// Declaration of one action on an [`IntegrationType`]: its id and the JSON
/// schema its configuration data must satisfy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// The declared action id.
    pub action_id: ActionId,
    /// JSON schema for the action's configuration data.
    pub config_schema: Value,
}

/// Configuration of one action on one integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfiguration {
    /// Owning integration.
    pub integration_id: IntegrationId,
    /// The configured action.
    pub action_id: ActionId,
    /// Arbitrary structured configuration data.
    pub data: Value,
}

impl ActionConfiguration {
    /// Applies `overrides` on top of the stored data.
    ///
    /// Override wins by top-level key replacement; nested structures are
    /// replaced wholesale, never deep-merged.
    pub fn merged_with(&self, overrides: Option<&Map<String, Value>>) -> Value {
        let Some(overrides) = overrides else {
            return self.data.clone();
        };
        let mut merged = match &self.data {
            Value::Object(map) => map.clone(),
            // Non-object data cannot take keyed overrides; overrides win.
            _ => Map::new(),
        };
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
        Value::Object(merged)
    }
}

/// Configuration driving inbound webhook payload handling for one
/// integration. Cached exactly like [`ActionConfiguration`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookConfiguration {
    /// Owning integration.
    pub integration_id: IntegrationId,
    /// Arbitrary structured configuration data.
    pub data: Value,
}
