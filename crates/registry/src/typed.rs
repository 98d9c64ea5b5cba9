//! Typed-config validation adapter.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use junction_core::{ActionHandler, HandlerError, Integration};

/// Adapter giving a handler deserialization-based config validation.
///
/// `validate_config` attempts to deserialize the merged configuration into
/// `C`; a mismatch is rejected before the handler runs. Execution passes the
/// raw JSON through unchanged — handlers deserialize it themselves, so the
/// adapter adds no second parse on the happy path's error cases.
pub struct TypedConfig<C, H> {
    inner: H,
    _config: PhantomData<fn() -> C>,
}

impl<C, H> TypedConfig<C, H> {
    /// Wrap `inner` with validation against `C`.
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            _config: PhantomData,
        }
    }
}

#[async_trait]
impl<C, H> ActionHandler for TypedConfig<C, H>
where
    C: DeserializeOwned + Send + Sync + 'static,
    H: ActionHandler,
{
    async fn execute(
        &self,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError> {
        self.inner.execute(integration, config).await
    }

    fn validate_config(&self, config: &Value) -> Result<(), HandlerError> {
        serde_json::from_value::<C>(config.clone())
            .map(|_| ())
            .map_err(|e| HandlerError::validation(e.to_string()))?;
        self.inner.validate_config(config)
    }
}
