//! QueueStore port - durable list / set / record primitives (Redis or InMemory)
//!
//! Producer and workers share one store; its atomic pop is the only
//! serialization point between worker instances.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached (after the adapter's own reconnect policy).
    #[error("queue store unavailable: {0}")]
    Unavailable(String),

    #[error("queue store operation failed: {0}")]
    OperationFailed(String),
}

/// Primitives consumed by the producer, status tracker and delivery worker.
///
/// # 設計原則
/// - every call is a single atomic store operation
/// - items, members and values are opaque strings
/// - no multi-call transactions are assumed
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Append `item` to the tail of `queue`.
    async fn enqueue(&self, queue: &str, item: String) -> Result<(), StoreError>;

    /// Remove and return the head of `queue`, or `None` when empty. Never blocks.
    async fn dequeue(&self, queue: &str) -> Result<Option<String>, StoreError>;

    async fn length(&self, queue: &str) -> Result<usize, StoreError>;

    /// Insert `member`; `true` only for the caller that actually inserted it.
    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, StoreError>;

    /// Upsert one field of a named record.
    async fn record_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    async fn record_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;
}
