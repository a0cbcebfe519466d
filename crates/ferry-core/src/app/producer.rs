//! Producer - enqueue side of the system (used by the HTTP surface).

use std::sync::Arc;

use crate::app::{QueueKeys, StatusTracker};
use crate::domain::{FerryError, MessageEnvelope, MessageStatus, StatusView};
use crate::observability::QueueLengths;
use crate::ports::QueueStore;

/// Producer appends envelopes to the main queue and answers status queries.
///
/// Submitting the same id twice enqueues two envelopes; the worker-side gates
/// keep it from being processed twice.
#[derive(Clone)]
pub struct Producer {
    store: Arc<dyn QueueStore>,
    keys: QueueKeys,
    status: StatusTracker,
}

impl Producer {
    pub fn new(store: Arc<dyn QueueStore>, keys: QueueKeys) -> Self {
        let status = StatusTracker::new(Arc::clone(&store), keys.clone());
        Self::with_status(store, keys, status)
    }

    pub fn with_status(store: Arc<dyn QueueStore>, keys: QueueKeys, status: StatusTracker) -> Self {
        Self { store, keys, status }
    }

    /// Enqueue a new envelope with `retry_count = 0` and mark it `queued`.
    pub async fn submit(
        &self,
        message_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<MessageEnvelope, FerryError> {
        let message_id = message_id.into();
        if message_id.is_empty() {
            return Err(FerryError::InvalidInput("message_id is required".to_string()));
        }

        let envelope = MessageEnvelope::new(message_id, payload);
        self.store
            .enqueue(&self.keys.main_queue, envelope.encode()?)
            .await?;
        self.status
            .set(envelope.message_id(), MessageStatus::Queued)
            .await?;

        tracing::info!(message_id = envelope.message_id(), "message queued");
        Ok(envelope)
    }

    pub async fn queue_lengths(&self) -> Result<QueueLengths, FerryError> {
        Ok(QueueLengths {
            primary_queue_length: self.store.length(&self.keys.main_queue).await?,
            poison_queue_length: self.store.length(&self.keys.poison_queue).await?,
        })
    }

    pub async fn status(&self, message_id: &str) -> Result<StatusView, FerryError> {
        self.status
            .view(message_id)
            .await?
            .ok_or_else(|| FerryError::NotFound(message_id.to_string()))
    }
}
