//! The key-value store port.

use std::time::Duration;

use async_trait::async_trait;

/// Error type for cache-store operations.
///
/// Distinguishes transient connectivity failures (retried with bounded
/// backoff) from permanent backend failures (surfaced immediately).
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Transient failure — the store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Permanent backend failure — retrying will not help.
    #[error("store backend: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a transient unavailability error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a permanent backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns `true` if the operation may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Externally provided key-value cache store.
///
/// Values are serialized strings; interpretation belongs to the caller.
/// A `ttl` of `None` means the entry lives until explicitly deleted or
/// overwritten.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Look up a key. `None` means absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a key, replacing any existing entry and its TTL.
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>)
        -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
