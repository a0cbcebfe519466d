//! Well-known names inside the queue store namespace.

/// Store key layout shared by producers and workers.
///
/// Defaults match the names already used by existing deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKeys {
    pub main_queue: String,
    pub poison_queue: String,
    /// Idempotency marker: ids that completed successfully.
    pub processed_set: String,
    /// One member per claimed attempt, see `MessageEnvelope::attempt_key`.
    pub claim_set: String,
    pub record_prefix: String,
}

impl QueueKeys {
    pub const STATUS_FIELD: &'static str = "status";
    pub const UPDATED_AT_FIELD: &'static str = "updated_at";

    pub fn record_key(&self, message_id: &str) -> String {
        format!("{}{}", self.record_prefix, message_id)
    }
}

impl Default for QueueKeys {
    fn default() -> Self {
        Self {
            main_queue: "main_queue".to_string(),
            poison_queue: "poison_queue".to_string(),
            processed_set: "processed_messages".to_string(),
            claim_set: "claimed_attempts".to_string(),
            record_prefix: "message:".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let keys = QueueKeys::default();
        assert_eq!(keys.main_queue, "main_queue");
        assert_eq!(keys.poison_queue, "poison_queue");
        assert_eq!(keys.processed_set, "processed_messages");
        assert_eq!(keys.record_key("m1"), "message:m1");
    }
}
