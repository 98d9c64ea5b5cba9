//! Cache-aside store over the control plane.

use std::sync::Arc;
use std::time::Duration;

use junction_core::{
    ActionConfiguration, ActionId, Integration, IntegrationId, ModelError, WebhookConfiguration,
    keys,
};
use junction_resilience::{RetryPolicy, retry_with_backoff_if};
use junction_store::{KeyValueStore, StoreError};

use crate::control_plane::{ControlPlane, ControlPlaneError};

/// Error type for configuration reads and writes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The integration does not exist on the control plane.
    #[error("integration `{0}` not found")]
    IntegrationNotFound(IntegrationId),

    /// The integration exists but carries no configuration for the action.
    #[error("no configuration for action `{action_id}` on integration `{integration_id}`")]
    ActionConfigurationNotFound {
        /// The integration consulted.
        integration_id: IntegrationId,
        /// The action without configuration.
        action_id: ActionId,
    },

    /// The integration exists but carries no webhook configuration.
    #[error("no webhook configuration on integration `{0}`")]
    WebhookConfigurationNotFound(IntegrationId),

    /// The fetched graph violates its own invariants.
    #[error(transparent)]
    InvalidGraph(#[from] ModelError),

    /// Cache-store failure, already past its bounded retries.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Control-plane failure, already past its bounded retries. The cache
    /// does not hide a dead control plane.
    #[error("control plane: {0}")]
    ControlPlane(ControlPlaneError),

    /// A cached entry failed to deserialize.
    #[error("decode cached entry `{key}`: {source}")]
    Decode {
        /// The offending cache key.
        key: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// An entity failed to serialize for the write-back.
    #[error("encode cache entry: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ConfigError {
    /// Returns `true` when the failure is infrastructure being unreachable
    /// (as opposed to the data not existing).
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::ControlPlane(e) => e.is_retryable(),
            _ => false,
        }
    }

    fn from_control_plane(err: ControlPlaneError) -> Self {
        match err {
            ControlPlaneError::NotFound(id) => Self::IntegrationNotFound(id),
            other => Self::ControlPlane(other),
        }
    }
}

/// Cache-aside store for the integration graph.
///
/// Both dependencies are injected: the key-value store (typically already
/// wrapped in [`RetryingStore`](junction_store::RetryingStore)) and the
/// control plane. Concurrent reloads of the same integration race freely and
/// last writer wins — entries are idempotent mirrors, so the race is benign.
pub struct ConfigCache {
    store: Arc<dyn KeyValueStore>,
    control_plane: Arc<dyn ControlPlane>,
    reload_policy: RetryPolicy,
}

impl ConfigCache {
    /// Create a cache with the stock reload policy
    /// ([`RetryPolicy::reload`]).
    pub fn new(store: Arc<dyn KeyValueStore>, control_plane: Arc<dyn ControlPlane>) -> Self {
        Self::with_reload_policy(store, control_plane, RetryPolicy::reload())
    }

    /// Create a cache with a custom control-plane retry policy.
    pub fn with_reload_policy(
        store: Arc<dyn KeyValueStore>,
        control_plane: Arc<dyn ControlPlane>,
        reload_policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            control_plane,
            reload_policy,
        }
    }

    /// The integration summary, loading the full graph on a miss.
    pub async fn get_integration(
        &self,
        id: &IntegrationId,
        ttl: Option<Duration>,
    ) -> Result<Integration, ConfigError> {
        let key = keys::integration(id);
        if let Some(cached) = self.read(&key).await? {
            return Ok(cached);
        }
        self.reload(id, ttl).await
    }

    /// One action's configuration, loading the full graph on a miss.
    pub async fn get_action_configuration(
        &self,
        id: &IntegrationId,
        action_id: &ActionId,
        ttl: Option<Duration>,
    ) -> Result<ActionConfiguration, ConfigError> {
        let key = keys::action_configuration(id, action_id);
        if let Some(cached) = self.read(&key).await? {
            return Ok(cached);
        }

        let integration = self.reload(id, ttl).await?;
        integration
            .action_configuration(action_id)
            .cloned()
            .ok_or_else(|| ConfigError::ActionConfigurationNotFound {
                integration_id: id.clone(),
                action_id: action_id.clone(),
            })
    }

    /// The webhook configuration, loading the full graph on a miss.
    pub async fn get_webhook_configuration(
        &self,
        id: &IntegrationId,
        ttl: Option<Duration>,
    ) -> Result<WebhookConfiguration, ConfigError> {
        let key = keys::webhook_configuration(id);
        if let Some(cached) = self.read(&key).await? {
            return Ok(cached);
        }

        let integration = self.reload(id, ttl).await?;
        integration
            .webhook_configuration
            .ok_or_else(|| ConfigError::WebhookConfigurationNotFound(id.clone()))
    }

    /// Write an integration summary entry. Pass-through: no reload, no
    /// fan-out — push events for child entities arrive separately.
    pub async fn set_integration(
        &self,
        integration: &Integration,
        ttl: Option<Duration>,
    ) -> Result<(), ConfigError> {
        self.write(&keys::integration(&integration.id), integration, ttl)
            .await
    }

    /// Write one action configuration entry. Pass-through.
    pub async fn set_action_configuration(
        &self,
        config: &ActionConfiguration,
        ttl: Option<Duration>,
    ) -> Result<(), ConfigError> {
        let key = keys::action_configuration(&config.integration_id, &config.action_id);
        self.write(&key, config, ttl).await
    }

    /// Write the webhook configuration entry. Pass-through.
    pub async fn set_webhook_configuration(
        &self,
        config: &WebhookConfiguration,
        ttl: Option<Duration>,
    ) -> Result<(), ConfigError> {
        self.write(&keys::webhook_configuration(&config.integration_id), config, ttl)
            .await
    }

    /// Delete an integration entry and every derived child entry, so a push
    /// delete cannot leave orphan action or webhook configs behind.
    pub async fn delete_integration(&self, id: &IntegrationId) -> Result<(), ConfigError> {
        let key = keys::integration(id);
        // Enumerate children from the cached graph while it is still there.
        if let Some(integration) = self.read::<Integration>(&key).await? {
            for config in &integration.action_configurations {
                self.store
                    .delete(&keys::action_configuration(id, &config.action_id))
                    .await?;
            }
        }
        self.store.delete(&keys::webhook_configuration(id)).await?;
        self.store.delete(&key).await?;
        Ok(())
    }

    /// Delete one action configuration entry. Pass-through.
    pub async fn delete_action_configuration(
        &self,
        id: &IntegrationId,
        action_id: &ActionId,
    ) -> Result<(), ConfigError> {
        self.store
            .delete(&keys::action_configuration(id, action_id))
            .await?;
        Ok(())
    }

    /// Delete the webhook configuration entry. Pass-through.
    pub async fn delete_webhook_configuration(
        &self,
        id: &IntegrationId,
    ) -> Result<(), ConfigError> {
        self.store.delete(&keys::webhook_configuration(id)).await?;
        Ok(())
    }

    async fn read<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, ConfigError> {
        match self.store.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| ConfigError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    async fn write<T: serde::Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), ConfigError> {
        let raw = serde_json::to_string(value).map_err(ConfigError::Encode)?;
        self.store.put(key, raw, ttl).await?;
        Ok(())
    }

    /// Fetch the full graph from the control plane and populate every
    /// derivable entry under the **same** TTL, so fan-out entities expire
    /// together. One miss costs exactly one round trip.
    async fn reload(
        &self,
        id: &IntegrationId,
        ttl: Option<Duration>,
    ) -> Result<Integration, ConfigError> {
        tracing::debug!(integration_id = %id, "cache miss, reloading integration graph");

        let integration = retry_with_backoff_if(
            &self.reload_policy,
            "config.reload",
            ControlPlaneError::is_retryable,
            || self.control_plane.get_integration_details(id),
        )
        .await
        .map_err(ConfigError::from_control_plane)?;

        integration.validate()?;

        self.write(&keys::integration(id), &integration, ttl).await?;
        for config in &integration.action_configurations {
            let key = keys::action_configuration(id, &config.action_id);
            self.write(&key, config, ttl).await?;
        }
        if let Some(webhook) = &integration.webhook_configuration {
            self.write(&keys::webhook_configuration(id), webhook, ttl)
                .await?;
        }

        tracing::debug!(
            integration_id = %id,
            action_configs = integration.action_configurations.len(),
            has_webhook = integration.webhook_configuration.is_some(),
            "populated cache from control plane"
        );

        Ok(integration)
    }
}
