//! Handler contracts.
//!
//! Vendor handlers are the leaves of the gateway: one async function per
//! (integration type, action). The runtime resolves configuration and wraps
//! the call in lifecycle events; handlers only translate configuration into
//! vendor API calls and return a JSON result.

use async_trait::async_trait;
use serde_json::Value;

use crate::integration::Integration;

/// Error type returned by vendor handlers.
///
/// Any handler error is an action/webhook failure; the runner never retries
/// it (vendor-specific retries belong inside the handler).
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum HandlerError {
    /// The handler ran and failed.
    #[error("failed: {error}")]
    Failed {
        /// Human-readable error message.
        error: String,
        /// Optional structured details about the failure.
        details: Option<Value>,
    },

    /// The configuration was rejected before execution began.
    #[error("validation: {0}")]
    Validation(String),
}

impl HandlerError {
    /// Create an execution failure.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed {
            error: msg.into(),
            details: None,
        }
    }

    /// Create an execution failure with structured details.
    pub fn failed_with_details(msg: impl Into<String>, details: Value) -> Self {
        Self::Failed {
            error: msg.into(),
            details: Some(details),
        }
    }

    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Returns `true` for configuration validation errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// An action handler: one independently configurable unit of work exposed by
/// an integration type (pull data, push data, authenticate, ...).
///
/// `config` is the merged configuration in effect for this execution —
/// stored data with any caller overrides already applied.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Execute the action against the vendor system.
    async fn execute(
        &self,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError>;

    /// Reject malformed configuration before [`execute`](Self::execute) runs.
    ///
    /// The default accepts everything; typed registrations override this
    /// with a schema-derived check.
    fn validate_config(&self, _config: &Value) -> Result<(), HandlerError> {
        Ok(())
    }
}

/// A webhook handler: translates one inbound vendor payload.
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// Handle an inbound payload for the integration.
    async fn handle(
        &self,
        payload: &Value,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError>;
}

#[async_trait]
impl<T: ActionHandler + ?Sized> ActionHandler for std::sync::Arc<T> {
    async fn execute(
        &self,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError> {
        (**self).execute(integration, config).await
    }

    fn validate_config(&self, config: &Value) -> Result<(), HandlerError> {
        (**self).validate_config(config)
    }
}

#[async_trait]
impl<T: WebhookHandler + ?Sized> WebhookHandler for std::sync::Arc<T> {
    async fn handle(
        &self,
        payload: &Value,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError> {
        (**self).handle(payload, integration, config).await
    }
}
