//! Retrying store decorator.
//!
//! The one place store retries happen: wraps every operation of an inner
//! [`KeyValueStore`] in bounded backoff, retrying only transient
//! (`Unavailable`) errors. Components compose it explicitly at construction
//! time, so the retry behavior is visible where the store is injected.

use std::time::Duration;

use async_trait::async_trait;
use junction_resilience::{RetryPolicy, retry_with_backoff_if};

use crate::kv::{KeyValueStore, StoreError};

/// Decorator adding bounded retry to every operation of an inner store.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    /// Wrap `inner` with the stock store policy
    /// ([`RetryPolicy::store`]).
    pub fn new(inner: S) -> Self {
        Self::with_policy(inner, RetryPolicy::store())
    }

    /// Wrap `inner` with a custom policy.
    pub fn with_policy(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for RetryingStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        retry_with_backoff_if(&self.policy, "store.get", StoreError::is_retryable, || {
            self.inner.get(key)
        })
        .await
    }

    async fn put(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        retry_with_backoff_if(&self.policy, "store.put", StoreError::is_retryable, || {
            self.inner.put(key, value.clone(), ttl)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        retry_with_backoff_if(&self.policy, "store.delete", StoreError::is_retryable, || {
            self.inner.delete(key)
        })
        .await
    }
}
