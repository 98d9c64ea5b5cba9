//! Broker port.
//!
//! The broker connection is an externally provided dependency; the gateway
//! only needs "publish these bytes to this topic". [`MemorySink`] records
//! published events for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

/// Error type for broker publishes.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum SinkError {
    /// Transport-level failure — connection lost, broker unreachable.
    #[error("broker transport: {0}")]
    Transport(String),

    /// The broker rejected the payload — retrying the same bytes is futile.
    #[error("broker rejected payload: {0}")]
    Rejected(String),
}

impl SinkError {
    /// Create a transport-level error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a rejection error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Returns `true` for transport-level errors, the only retryable kind.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Externally provided broker connection.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish a serialized event to `topic`.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), SinkError>;
}

/// In-memory sink recording every published event, for tests.
///
/// Payloads are decoded back to JSON on receipt so assertions read
/// structured values instead of byte blobs.
#[derive(Default)]
pub struct MemorySink {
    published: Mutex<Vec<(String, Value)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(topic, event)` published so far, in order.
    pub fn published(&self) -> Vec<(String, Value)> {
        self.published.lock().clone()
    }

    /// The `event_type` field of each published event, in order.
    pub fn event_types(&self) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .filter_map(|(_, event)| event["event_type"].as_str().map(str::to_string))
            .collect()
    }

    /// Number of published events.
    pub fn len(&self) -> usize {
        self.published.lock().len()
    }

    /// Returns `true` when nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), SinkError> {
        let event: Value = serde_json::from_slice(payload)
            .map_err(|e| SinkError::rejected(format!("payload is not JSON: {e}")))?;
        self.published.lock().push((topic.to_string(), event));
        Ok(())
    }
}
