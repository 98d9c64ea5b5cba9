//! Registry construction and lookup.

use std::collections::HashMap;
use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use junction_core::{ActionDefinition, ActionHandler, ActionId, IntegrationType};

use crate::typed::TypedConfig;

/// Error type for registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No handler is registered for the action id.
    #[error("action `{0}` is not supported")]
    UnknownAction(ActionId),
}

/// One registered action: the handler plus its configuration schema.
pub struct RegisteredAction {
    /// The handler invoked for this action.
    pub handler: Arc<dyn ActionHandler>,
    /// JSON schema of the action's configuration data.
    pub config_schema: Value,
}

impl std::fmt::Debug for RegisteredAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredAction")
            .field("handler", &"<dyn ActionHandler>")
            .field("config_schema", &self.config_schema)
            .finish()
    }
}

/// The permissive fallback schema for untyped registrations.
fn untyped_schema() -> Value {
    json!({"type": "object", "additionalProperties": true})
}

/// Builder for [`ActionRegistry`]. Registration happens once at startup;
/// re-registering an id overwrites the earlier entry.
#[derive(Default)]
pub struct ActionRegistryBuilder {
    actions: HashMap<ActionId, RegisteredAction>,
}

impl ActionRegistryBuilder {
    /// Register a handler with the permissive fallback schema.
    pub fn action(mut self, action_id: ActionId, handler: impl ActionHandler + 'static) -> Self {
        self.actions.insert(
            action_id,
            RegisteredAction {
                handler: Arc::new(handler),
                config_schema: untyped_schema(),
            },
        );
        self
    }

    /// Register a handler with an explicit schema.
    pub fn action_with_schema(
        mut self,
        action_id: ActionId,
        handler: impl ActionHandler + 'static,
        config_schema: Value,
    ) -> Self {
        self.actions.insert(
            action_id,
            RegisteredAction {
                handler: Arc::new(handler),
                config_schema,
            },
        );
        self
    }

    /// Register a handler whose configuration type is `C`.
    ///
    /// The schema is derived from `C` and the handler gains
    /// deserialization-based config validation via [`TypedConfig`].
    pub fn typed_action<C>(
        mut self,
        action_id: ActionId,
        handler: impl ActionHandler + 'static,
    ) -> Self
    where
        C: JsonSchema + DeserializeOwned + Send + Sync + 'static,
    {
        let schema = serde_json::to_value(schemars::schema_for!(C))
            .unwrap_or_else(|_| untyped_schema());
        self.actions.insert(
            action_id,
            RegisteredAction {
                handler: Arc::new(TypedConfig::<C, _>::new(handler)),
                config_schema: schema,
            },
        );
        self
    }

    /// Finalize the registry.
    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            actions: self.actions,
        }
    }
}

/// Immutable map from action id to (handler, config schema).
///
/// Built once at process start; shared across concurrent executions behind
/// an `Arc`.
pub struct ActionRegistry {
    actions: HashMap<ActionId, RegisteredAction>,
}

impl ActionRegistry {
    /// Start building a registry.
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Look up the registered action for `action_id`.
    pub fn resolve(&self, action_id: &ActionId) -> Result<&RegisteredAction, RegistryError> {
        self.actions
            .get(action_id)
            .ok_or_else(|| RegistryError::UnknownAction(action_id.clone()))
    }

    /// Whether `action_id` is registered.
    pub fn contains(&self, action_id: &ActionId) -> bool {
        self.actions.contains_key(action_id)
    }

    /// All registered action ids, sorted for stable output.
    pub fn ids(&self) -> Vec<&ActionId> {
        let mut ids: Vec<_> = self.actions.keys().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if no actions are registered.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Export the registry as an [`IntegrationType`] definition for one-time
    /// control-plane registration at startup.
    pub fn integration_type_definition(&self, type_name: impl Into<String>) -> IntegrationType {
        let mut actions: Vec<ActionDefinition> = self
            .actions
            .iter()
            .map(|(action_id, registered)| ActionDefinition {
                action_id: action_id.clone(),
                config_schema: registered.config_schema.clone(),
            })
            .collect();
        actions.sort_by(|a, b| a.action_id.as_str().cmp(b.action_id.as_str()));

        IntegrationType {
            name: type_name.into(),
            actions,
        }
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("count", &self.actions.len())
            .field("ids", &self.ids())
            .finish()
    }
}
