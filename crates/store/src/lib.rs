//! # Junction Store
//!
//! Key-value cache-store abstraction.
//!
//! The gateway treats its cache store as an externally provided dependency:
//! everything above this crate speaks [`KeyValueStore`], and backends plug in
//! underneath. Shipped here are the in-memory [`MemoryStore`] (moka-backed,
//! honoring per-entry TTL) and [`RetryingStore`], the decorator that gives
//! every store operation its bounded-retry behavior.

/// The `KeyValueStore` port and its error type.
pub mod kv;
/// In-memory backend.
pub mod memory;
/// Retrying decorator.
pub mod retrying;

pub use kv::{KeyValueStore, StoreError};
pub use memory::MemoryStore;
pub use retrying::RetryingStore;
