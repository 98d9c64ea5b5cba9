//! The retrying publisher.

use std::sync::Arc;

use junction_resilience::{RetryPolicy, retry_with_backoff_if};

use crate::event::SystemEvent;
use crate::sink::{EventSink, SinkError};

/// Error type for event publication.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The event could not be serialized.
    #[error("serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The broker publish failed permanently (after retry exhaustion, or on
    /// a non-transport error).
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// At-least-once publisher of [`SystemEvent`]s.
///
/// Serializes once, then retries transport-level sink errors with capped
/// exponential backoff; a permanent failure propagates to the caller. The
/// sink is injected at construction so tests swap in
/// [`MemorySink`](crate::sink::MemorySink).
#[derive(Clone)]
pub struct EventPublisher {
    sink: Arc<dyn EventSink>,
    policy: RetryPolicy,
}

impl EventPublisher {
    /// Create a publisher with the stock publish policy
    /// ([`RetryPolicy::publish`]: 5 attempts, 4s initial backoff, 60s cap).
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self::with_policy(sink, RetryPolicy::publish())
    }

    /// Create a publisher with a custom retry policy.
    pub fn with_policy(sink: Arc<dyn EventSink>, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    /// Publish `event` to `topic`.
    ///
    /// At-least-once: a retried publish that succeeded on the broker but
    /// failed on the response path may be delivered twice; consumers must
    /// tolerate duplicates.
    pub async fn publish(&self, event: &SystemEvent, topic: &str) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;

        tracing::debug!(
            topic,
            event_type = ?event.event_type,
            integration_id = %event.integration_id(),
            "publishing event"
        );

        retry_with_backoff_if(&self.policy, "events.publish", SinkError::is_transport, || {
            self.sink.publish(topic, &payload)
        })
        .await?;
        Ok(())
    }
}
