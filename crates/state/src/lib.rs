//! # Junction State
//!
//! Cursor state for vendor handlers.
//!
//! Handlers track "where was I" per (integration, action, source) — a last
//! successful sync time, a device watermark — as an arbitrary JSON blob in
//! the key-value store. Absence of a record means "never run" and reads as
//! an empty object, never an error.
//!
//! Writes are last-writer-wins with no compare-and-swap, and there is no
//! atomicity across sources: a handler writing several sources that fails
//! midway leaves the earlier writes in place. Callers needing retry behavior
//! inject a store already wrapped in
//! [`RetryingStore`](junction_store::RetryingStore).

use std::sync::Arc;

use serde_json::{Map, Value};

use junction_core::{ActionId, IntegrationId, SourceId, keys};
use junction_store::{KeyValueStore, StoreError};

/// Error type for state operations.
///
/// "Not found" is deliberately absent: a missing record is an empty state.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StateError {
    /// Cache-store failure, already past its bounded retries.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored record failed to deserialize.
    #[error("decode state record `{key}`: {source}")]
    Decode {
        /// The offending cache key.
        key: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The state failed to serialize for writing.
    #[error("encode state record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Per-(integration, action, source) cursor store.
pub struct StateStore {
    store: Arc<dyn KeyValueStore>,
}

impl StateStore {
    /// Create a store over the injected key-value backend.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the state record; `{}` when none exists.
    pub async fn get_state(
        &self,
        integration_id: &IntegrationId,
        action_id: &ActionId,
        source_id: &SourceId,
    ) -> Result<Value, StateError> {
        let key = keys::state(integration_id, action_id, source_id);
        match self.store.get(&key).await? {
            Some(raw) => {
                serde_json::from_str(&raw).map_err(|source| StateError::Decode { key, source })
            }
            None => Ok(Value::Object(Map::new())),
        }
    }

    /// Write the state record, replacing any previous value.
    ///
    /// State never expires on its own; it lives until overwritten or
    /// deleted.
    pub async fn set_state(
        &self,
        integration_id: &IntegrationId,
        action_id: &ActionId,
        source_id: &SourceId,
        state: &Value,
    ) -> Result<(), StateError> {
        let key = keys::state(integration_id, action_id, source_id);
        let raw = serde_json::to_string(state).map_err(StateError::Encode)?;
        tracing::debug!(%integration_id, %action_id, %source_id, "writing state record");
        self.store.put(&key, raw, None).await?;
        Ok(())
    }

    /// Remove the state record; removing an absent record is a no-op.
    pub async fn delete_state(
        &self,
        integration_id: &IntegrationId,
        action_id: &ActionId,
        source_id: &SourceId,
    ) -> Result<(), StateError> {
        let key = keys::state(integration_id, action_id, source_id);
        self.store.delete(&key).await?;
        Ok(())
    }
}
