//! Handler instrumentation wrappers.
//!
//! Explicit middleware composition: a wrapper takes a handler and returns an
//! instrumented handler, applied where handlers are registered. The wrapped
//! handler emits Started before the call, Complete (with the result) after a
//! successful return and Failed (with the error) after a failure — and the
//! handler's error always propagates to the caller afterwards, never
//! swallowed.

use async_trait::async_trait;
use serde_json::Value;

use junction_core::{ActionHandler, ActionId, HandlerError, Integration, WebhookHandler};

use crate::event::SystemEvent;
use crate::publisher::{EventPublisher, PublishError};

/// Which lifecycle events a wrapper emits. Each is independently
/// configurable; the default emits all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitPolicy {
    /// Emit Started before the handler runs.
    pub started: bool,
    /// Emit Complete after a successful return.
    pub complete: bool,
    /// Emit Failed after a handler error.
    pub failed: bool,
}

impl Default for EmitPolicy {
    fn default() -> Self {
        Self {
            started: true,
            complete: true,
            failed: true,
        }
    }
}

fn publish_failed_error(err: &PublishError) -> HandlerError {
    HandlerError::failed(format!("event publish failed: {err}"))
}

/// Action handler wrapper emitting lifecycle events around each invocation.
pub struct InstrumentedAction<H> {
    inner: H,
    publisher: EventPublisher,
    action_id: ActionId,
    topic: String,
    emit: EmitPolicy,
}

impl<H> InstrumentedAction<H> {
    /// Wrap `inner`, publishing events for `action_id` to `topic`.
    pub fn new(
        inner: H,
        publisher: EventPublisher,
        action_id: ActionId,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            publisher,
            action_id,
            topic: topic.into(),
            emit: EmitPolicy::default(),
        }
    }

    /// Override which events are emitted.
    pub fn with_emit_policy(mut self, emit: EmitPolicy) -> Self {
        self.emit = emit;
        self
    }
}

#[async_trait]
impl<H: ActionHandler> ActionHandler for InstrumentedAction<H> {
    async fn execute(
        &self,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError> {
        if self.emit.started {
            let event = SystemEvent::action_started(
                integration.id.clone(),
                self.action_id.clone(),
                config.clone(),
            );
            self.publisher
                .publish(&event, &self.topic)
                .await
                .map_err(|e| publish_failed_error(&e))?;
        }

        match self.inner.execute(integration, config).await {
            Ok(result) => {
                if self.emit.complete {
                    let event = SystemEvent::action_complete(
                        integration.id.clone(),
                        self.action_id.clone(),
                        config.clone(),
                        result.clone(),
                    );
                    self.publisher
                        .publish(&event, &self.topic)
                        .await
                        .map_err(|e| publish_failed_error(&e))?;
                }
                Ok(result)
            }
            Err(err) => {
                if self.emit.failed {
                    let event = SystemEvent::action_failed(
                        integration.id.clone(),
                        self.action_id.clone(),
                        config.clone(),
                        err.to_string(),
                    );
                    // The handler's own error outranks a publish failure on
                    // this path; the publish failure is logged, not returned.
                    if let Err(publish_err) =
                        self.publisher.publish(&event, &self.topic).await
                    {
                        tracing::warn!(
                            integration_id = %integration.id,
                            action_id = %self.action_id,
                            error = %publish_err,
                            "failed to publish Failed event"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    fn validate_config(&self, config: &Value) -> Result<(), HandlerError> {
        self.inner.validate_config(config)
    }
}

/// Webhook handler wrapper, identical in shape to [`InstrumentedAction`] but
/// scoped to a webhook id.
pub struct InstrumentedWebhook<H> {
    inner: H,
    publisher: EventPublisher,
    webhook_id: String,
    topic: String,
    emit: EmitPolicy,
}

impl<H> InstrumentedWebhook<H> {
    /// Wrap `inner`, publishing events for `webhook_id` to `topic`.
    pub fn new(
        inner: H,
        publisher: EventPublisher,
        webhook_id: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            publisher,
            webhook_id: webhook_id.into(),
            topic: topic.into(),
            emit: EmitPolicy::default(),
        }
    }

    /// Override which events are emitted.
    pub fn with_emit_policy(mut self, emit: EmitPolicy) -> Self {
        self.emit = emit;
        self
    }
}

#[async_trait]
impl<H: WebhookHandler> WebhookHandler for InstrumentedWebhook<H> {
    async fn handle(
        &self,
        payload: &Value,
        integration: &Integration,
        config: &Value,
    ) -> Result<Value, HandlerError> {
        if self.emit.started {
            let event = SystemEvent::webhook_started(
                integration.id.clone(),
                self.webhook_id.clone(),
                config.clone(),
            );
            self.publisher
                .publish(&event, &self.topic)
                .await
                .map_err(|e| publish_failed_error(&e))?;
        }

        match self.inner.handle(payload, integration, config).await {
            Ok(result) => {
                if self.emit.complete {
                    let event = SystemEvent::webhook_complete(
                        integration.id.clone(),
                        self.webhook_id.clone(),
                        config.clone(),
                        result.clone(),
                    );
                    self.publisher
                        .publish(&event, &self.topic)
                        .await
                        .map_err(|e| publish_failed_error(&e))?;
                }
                Ok(result)
            }
            Err(err) => {
                if self.emit.failed {
                    let event = SystemEvent::webhook_failed(
                        integration.id.clone(),
                        self.webhook_id.clone(),
                        config.clone(),
                        err.to_string(),
                    );
                    if let Err(publish_err) =
                        self.publisher.publish(&event, &self.topic).await
                    {
                        tracing::warn!(
                            integration_id = %integration.id,
                            webhook_id = %self.webhook_id,
                            error = %publish_err,
                            "failed to publish Failed event"
                        );
                    }
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use junction_core::{IntegrationId, IntegrationType};
    use junction_resilience::RetryPolicy;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_publisher(sink: Arc<MemorySink>) -> EventPublisher {
        EventPublisher::with_policy(
            sink,
            RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
                backoff_multiplier: 2.0,
                max_backoff: Duration::from_millis(5),
            },
        )
    }

    fn integration() -> Integration {
        Integration {
            id: IntegrationId::new("acme").unwrap(),
            name: "Acme".to_string(),
            enabled: true,
            integration_type: IntegrationType {
                name: "device-fleet".to_string(),
                actions: vec![],
            },
            owner: None,
            base_url: None,
            action_configurations: vec![],
            webhook_configuration: None,
        }
    }

    struct OkHandler;

    #[async_trait]
    impl ActionHandler for OkHandler {
        async fn execute(
            &self,
            _integration: &Integration,
            _config: &Value,
        ) -> Result<Value, HandlerError> {
            Ok(json!({"records": 7}))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ActionHandler for FailingHandler {
        async fn execute(
            &self,
            _integration: &Integration,
            _config: &Value,
        ) -> Result<Value, HandlerError> {
            Err(HandlerError::failed("vendor API returned 500"))
        }
    }

    #[tokio::test]
    async fn success_emits_started_then_complete() {
        let sink = Arc::new(MemorySink::new());
        let wrapped = InstrumentedAction::new(
            OkHandler,
            test_publisher(sink.clone()),
            ActionId::new("pull_data").unwrap(),
            "events",
        );

        let result = wrapped
            .execute(&integration(), &json!({"interval": 5}))
            .await
            .unwrap();

        assert_eq!(result, json!({"records": 7}));
        assert_eq!(sink.event_types(), vec!["action_started", "action_complete"]);

        let (_, complete) = &sink.published()[1];
        assert_eq!(complete["payload"]["result"], json!({"records": 7}));
        assert_eq!(complete["payload"]["config_data"], json!({"interval": 5}));
    }

    #[tokio::test]
    async fn failure_emits_started_then_failed_and_propagates() {
        let sink = Arc::new(MemorySink::new());
        let wrapped = InstrumentedAction::new(
            FailingHandler,
            test_publisher(sink.clone()),
            ActionId::new("pull_data").unwrap(),
            "events",
        );

        let err = wrapped.execute(&integration(), &json!({})).await.unwrap_err();

        // Original error propagates to the caller.
        assert_eq!(err.to_string(), "failed: vendor API returned 500");
        assert_eq!(sink.event_types(), vec!["action_started", "action_failed"]);

        let (_, failed) = &sink.published()[1];
        assert_eq!(
            failed["payload"]["error"],
            json!("failed: vendor API returned 500")
        );
    }

    #[tokio::test]
    async fn emit_policy_disables_individual_events() {
        let sink = Arc::new(MemorySink::new());
        let wrapped = InstrumentedAction::new(
            OkHandler,
            test_publisher(sink.clone()),
            ActionId::new("pull_data").unwrap(),
            "events",
        )
        .with_emit_policy(EmitPolicy {
            started: false,
            complete: true,
            failed: true,
        });

        wrapped.execute(&integration(), &json!({})).await.unwrap();
        assert_eq!(sink.event_types(), vec!["action_complete"]);
    }

    #[tokio::test]
    async fn webhook_wrapper_uses_webhook_id() {
        struct EchoWebhook;

        #[async_trait]
        impl WebhookHandler for EchoWebhook {
            async fn handle(
                &self,
                payload: &Value,
                _integration: &Integration,
                _config: &Value,
            ) -> Result<Value, HandlerError> {
                Ok(payload.clone())
            }
        }

        let sink = Arc::new(MemorySink::new());
        let wrapped = InstrumentedWebhook::new(
            EchoWebhook,
            test_publisher(sink.clone()),
            "inbound",
            "events",
        );

        wrapped
            .handle(&json!({"device": 9}), &integration(), &json!({}))
            .await
            .unwrap();

        assert_eq!(sink.event_types(), vec!["webhook_started", "webhook_complete"]);
        let (_, started) = &sink.published()[0];
        assert_eq!(started["payload"]["webhook_id"], json!("inbound"));
    }
}
