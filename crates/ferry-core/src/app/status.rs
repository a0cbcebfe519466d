//! StatusTracker - message id から lifecycle status への対応
//!
//! Last write wins, no history. Writes are issued right after the queue
//! mutation they describe and are not transactional with it.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::app::QueueKeys;
use crate::domain::{FerryError, MessageStatus, StatusView};
use crate::ports::{Clock, QueueStore, SystemClock};

#[derive(Clone)]
pub struct StatusTracker {
    store: Arc<dyn QueueStore>,
    keys: QueueKeys,
    clock: Arc<dyn Clock>,
}

impl StatusTracker {
    pub fn new(store: Arc<dyn QueueStore>, keys: QueueKeys) -> Self {
        Self::with_clock(store, keys, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn QueueStore>, keys: QueueKeys, clock: Arc<dyn Clock>) -> Self {
        Self { store, keys, clock }
    }

    pub async fn set(&self, message_id: &str, status: MessageStatus) -> Result<(), FerryError> {
        let key = self.keys.record_key(message_id);
        self.store
            .record_set(&key, QueueKeys::STATUS_FIELD, status.as_str())
            .await?;
        self.store
            .record_set(
                &key,
                QueueKeys::UPDATED_AT_FIELD,
                &self.clock.now().to_rfc3339(),
            )
            .await?;
        Ok(())
    }

    /// `None` when no record exists for `message_id`.
    pub async fn view(&self, message_id: &str) -> Result<Option<StatusView>, FerryError> {
        let key = self.keys.record_key(message_id);
        let Some(raw) = self.store.record_get(&key, QueueKeys::STATUS_FIELD).await? else {
            return Ok(None);
        };
        let status: MessageStatus = raw.parse().map_err(|_| FerryError::CorruptRecord {
            key: key.clone(),
            detail: format!("unknown status {raw:?}"),
        })?;
        // 古いレコードには updated_at が無い
        let updated_at = self
            .store
            .record_get(&key, QueueKeys::UPDATED_AT_FIELD)
            .await?
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|at| at.with_timezone(&Utc));
        Ok(Some(StatusView {
            message_id: message_id.to_string(),
            status,
            updated_at,
        }))
    }
}
