//! MessageEnvelope - 配送単位（message + delivery metadata）
//!
//! Wire format is a JSON object:
//! `{"message_id": "...", "payload": <any json>, "retry": 0, "submission": "<ulid>"}`
//!
//! `submission` is absent on envelopes written by older producers.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::errors::FerryError;

/// The unit of work travelling through the main and poison queues.
///
/// `message_id` is caller-supplied and stable across retries.
/// `retry_count` only ever grows while the envelope lives in the main queue.
/// `submission` identifies one producer submission and is carried through retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    message_id: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(rename = "retry", alias = "retry_count", default)]
    retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submission: Option<Ulid>,
}

impl MessageEnvelope {
    /// Fresh envelope as created by the producer (`retry_count = 0`, new submission).
    pub fn new(message_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            message_id: message_id.into(),
            payload,
            retry_count: 0,
            submission: Some(Ulid::new()),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn submission(&self) -> Option<Ulid> {
        self.submission
    }

    /// Payload as text: the string itself for JSON strings, compact JSON otherwise.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Consume the envelope and return the next attempt with `retry_count` set.
    ///
    /// The count never decreases.
    pub fn into_retry(mut self, retry_count: u32) -> Self {
        self.retry_count = self.retry_count.max(retry_count);
        self
    }

    /// Claim member for this attempt: `{message_id}#{submission}#{retry_count}`.
    ///
    /// Envelopes without a submission fall back to `{message_id}#{retry_count}`.
    pub fn attempt_key(&self) -> String {
        match self.submission {
            Some(submission) => format!("{}#{}#{}", self.message_id, submission, self.retry_count),
            None => format!("{}#{}", self.message_id, self.retry_count),
        }
    }

    pub fn encode(&self) -> Result<String, FerryError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, FerryError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_envelope_starts_at_zero_retries() {
        let env = MessageEnvelope::new("m1", json!("ok"));
        assert_eq!(env.message_id(), "m1");
        assert_eq!(env.retry_count(), 0);
        let submission = env.submission().unwrap();
        assert_eq!(env.attempt_key(), format!("m1#{submission}#0"));
    }

    #[test]
    fn submissions_of_one_id_get_distinct_attempt_keys() {
        let first = MessageEnvelope::new("m1", json!("fail"));
        let second = MessageEnvelope::new("m1", json!("ok"));
        assert_ne!(first.attempt_key(), second.attempt_key());
    }

    #[test]
    fn retries_keep_the_submission() {
        let env = MessageEnvelope::new("m1", json!("x"));
        let submission = env.submission();
        let retried = env.into_retry(1);
        assert_eq!(retried.submission(), submission);
        assert!(retried.attempt_key().ends_with("#1"));
    }

    #[test]
    fn encodes_retry_and_submission_fields() {
        let env = MessageEnvelope::new("m1", json!("ok")).into_retry(1);
        let submission = env.submission().unwrap();
        let raw = env.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!({
                "message_id": "m1",
                "payload": "ok",
                "retry": 1,
                "submission": submission.to_string(),
            })
        );
        assert_eq!(MessageEnvelope::decode(&raw).unwrap(), env);
    }

    #[test]
    fn decodes_retry_count_alias_and_missing_fields() {
        let env = MessageEnvelope::decode(r#"{"message_id":"m2","retry_count":2}"#).unwrap();
        assert_eq!(env.retry_count(), 2);
        assert_eq!(env.payload(), &serde_json::Value::Null);
        assert_eq!(env.submission(), None);
        assert_eq!(env.attempt_key(), "m2#2");

        let env = MessageEnvelope::decode(r#"{"message_id":"m3","payload":{"a":1}}"#).unwrap();
        assert_eq!(env.retry_count(), 0);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            MessageEnvelope::decode("not json"),
            Err(FerryError::Codec(_))
        ));
        assert!(MessageEnvelope::decode(r#"{"payload":"x"}"#).is_err());
    }

    #[test]
    fn payload_text_for_strings_and_objects() {
        assert_eq!(MessageEnvelope::new("a", json!("please fail")).payload_text(), "please fail");
        assert_eq!(
            MessageEnvelope::new("b", json!({"k": "v"})).payload_text(),
            r#"{"k":"v"}"#
        );
    }

    #[test]
    fn into_retry_is_monotonic() {
        let env = MessageEnvelope::new("m", json!(null)).into_retry(2);
        let env = env.into_retry(1);
        assert_eq!(env.retry_count(), 2);
    }
}
