//! Push-invalidation consumer.
//!
//! The control plane pushes created/updated/deleted notifications for
//! integrations and their configurations. Applying them writes straight
//! through to the config cache (`set_*` / `delete_*`, never a reload),
//! layering active invalidation over passive TTL expiry: a changed
//! configuration is visible on the next read instead of after the TTL.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use junction_config::{ConfigCache, ConfigError};
use junction_core::{
    ActionConfiguration, ActionId, Integration, IntegrationId, WebhookConfiguration,
};

/// A control-plane push notification.
///
/// Upserts carry the full entity; deletes carry only the addressing ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigPushEvent {
    /// An integration was created or updated.
    IntegrationUpserted {
        /// The new integration summary.
        integration: Integration,
    },
    /// An integration was deleted.
    IntegrationDeleted {
        /// The deleted integration.
        integration_id: IntegrationId,
    },
    /// An action configuration was created or updated.
    ActionConfigUpserted {
        /// The new configuration.
        configuration: ActionConfiguration,
    },
    /// An action configuration was deleted.
    ActionConfigDeleted {
        /// The owning integration.
        integration_id: IntegrationId,
        /// The unconfigured action.
        action_id: ActionId,
    },
    /// A webhook configuration was created or updated.
    WebhookConfigUpserted {
        /// The new configuration.
        configuration: WebhookConfiguration,
    },
    /// A webhook configuration was deleted.
    WebhookConfigDeleted {
        /// The owning integration.
        integration_id: IntegrationId,
    },
}

/// Error type for push-event consumption.
#[derive(Debug, thiserror::Error)]
pub enum ConsumerError {
    /// The broker payload did not decode as a push event.
    #[error("decode push event: {0}")]
    Decode(#[from] serde_json::Error),

    /// Applying the event to the cache failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Applies control-plane push notifications to the config cache.
pub struct ConfigEventConsumer {
    cache: Arc<ConfigCache>,
    ttl: Option<Duration>,
}

impl ConfigEventConsumer {
    /// Create a consumer whose writes never expire on their own — the next
    /// push (or an explicit delete) replaces them.
    pub fn new(cache: Arc<ConfigCache>) -> Self {
        Self { cache, ttl: None }
    }

    /// Stamp pushed entries with a TTL instead of caching them forever.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Apply one push event to the cache.
    pub async fn apply(&self, event: &ConfigPushEvent) -> Result<(), ConfigError> {
        match event {
            ConfigPushEvent::IntegrationUpserted { integration } => {
                tracing::debug!(integration_id = %integration.id, "applying integration upsert");
                self.cache.set_integration(integration, self.ttl).await
            }
            ConfigPushEvent::IntegrationDeleted { integration_id } => {
                tracing::debug!(%integration_id, "applying integration delete");
                self.cache.delete_integration(integration_id).await
            }
            ConfigPushEvent::ActionConfigUpserted { configuration } => {
                tracing::debug!(
                    integration_id = %configuration.integration_id,
                    action_id = %configuration.action_id,
                    "applying action config upsert"
                );
                self.cache
                    .set_action_configuration(configuration, self.ttl)
                    .await
            }
            ConfigPushEvent::ActionConfigDeleted {
                integration_id,
                action_id,
            } => {
                tracing::debug!(%integration_id, %action_id, "applying action config delete");
                self.cache
                    .delete_action_configuration(integration_id, action_id)
                    .await
            }
            ConfigPushEvent::WebhookConfigUpserted { configuration } => {
                tracing::debug!(
                    integration_id = %configuration.integration_id,
                    "applying webhook config upsert"
                );
                self.cache
                    .set_webhook_configuration(configuration, self.ttl)
                    .await
            }
            ConfigPushEvent::WebhookConfigDeleted { integration_id } => {
                tracing::debug!(%integration_id, "applying webhook config delete");
                self.cache.delete_webhook_configuration(integration_id).await
            }
        }
    }

    /// Decode a broker payload and apply it.
    pub async fn apply_json(&self, payload: &[u8]) -> Result<(), ConsumerError> {
        let event: ConfigPushEvent = serde_json::from_slice(payload)?;
        self.apply(&event).await?;
        Ok(())
    }
}
