use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `message_id` stays untyped here so a wrong type maps to 400, not a decode error.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub message_id: Option<serde_json::Value>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandAccepted {
    pub status: String,
    pub message_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageStatusResponse {
    pub message_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
