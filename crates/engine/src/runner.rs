//! The action runner.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use junction_config::{ConfigCache, ConfigError};
use junction_core::{ActionId, IntegrationId};
use junction_registry::ActionRegistry;

use crate::error::ExecuteError;

/// Default TTL stamped on cache entries populated by runner-driven reloads.
pub const DEFAULT_CONFIG_TTL: Duration = Duration::from_secs(300);

/// Orchestrates one action execution:
/// config cache → registry → (instrumented) handler → classified outcome.
///
/// The runner holds no per-execution state; one instance is shared across
/// all concurrent trigger tasks. It deliberately does not retry handler
/// failures — vendor-specific retries belong inside vendor handlers.
pub struct ActionRunner {
    config_cache: Arc<ConfigCache>,
    registry: Arc<ActionRegistry>,
    config_ttl: Option<Duration>,
}

impl ActionRunner {
    /// Create a runner with the default configuration TTL
    /// ([`DEFAULT_CONFIG_TTL`]).
    pub fn new(config_cache: Arc<ConfigCache>, registry: Arc<ActionRegistry>) -> Self {
        Self {
            config_cache,
            registry,
            config_ttl: Some(DEFAULT_CONFIG_TTL),
        }
    }

    /// Override the TTL stamped on reload-populated cache entries.
    /// `None` caches until push invalidation.
    pub fn with_config_ttl(mut self, config_ttl: Option<Duration>) -> Self {
        self.config_ttl = config_ttl;
        self
    }

    /// Execute `action_id` on `integration_id`.
    ///
    /// `overrides` replace stored configuration keys at the top level
    /// (override wins; nested structures are replaced wholesale).
    pub async fn execute(
        &self,
        integration_id: &IntegrationId,
        action_id: &ActionId,
        overrides: Option<&Map<String, Value>>,
    ) -> Result<Value, ExecuteError> {
        tracing::debug!(%integration_id, %action_id, "executing action");

        let integration = self
            .config_cache
            .get_integration(integration_id, self.config_ttl)
            .await
            .map_err(|err| classify_config_error(integration_id, err))?;

        if !integration.enabled {
            return Err(ExecuteError::IntegrationDisabled(integration_id.clone()));
        }

        let config = integration.action_configuration(action_id).ok_or_else(|| {
            ExecuteError::ConfigurationNotFound {
                integration_id: integration_id.clone(),
                action_id: action_id.clone(),
            }
        })?;
        let data = config.merged_with(overrides);

        // Resolution precedes any event emission: an unsupported action id
        // must not produce a Started event.
        let registered =
            self.registry
                .resolve(action_id)
                .map_err(|_| ExecuteError::ActionNotSupported {
                    action_id: action_id.clone(),
                })?;

        registered
            .handler
            .validate_config(&data)
            .map_err(|err| ExecuteError::InvalidConfiguration {
                action_id: action_id.clone(),
                reason: err.to_string(),
            })?;

        match registered.handler.execute(&integration, &data).await {
            Ok(result) => Ok(result),
            Err(source) => {
                tracing::warn!(
                    %integration_id,
                    %action_id,
                    error = %source,
                    "action execution failed"
                );
                Err(ExecuteError::Execution {
                    integration_id: integration_id.clone(),
                    action_id: action_id.clone(),
                    source,
                })
            }
        }
    }
}

fn classify_config_error(integration_id: &IntegrationId, err: ConfigError) -> ExecuteError {
    match err {
        ConfigError::IntegrationNotFound(id) => ExecuteError::IntegrationNotFound(id),
        // Everything else — unreachable control plane, exhausted store
        // retries, decode failures — means the configuration in effect is
        // unknown; the raw error is flattened, not leaked.
        other => ExecuteError::ConfigUnavailable {
            integration_id: integration_id.clone(),
            reason: other.to_string(),
        },
    }
}
