//! Message lifecycle status as seen by producers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::FerryError;

/// Status transitions:
/// - Queued -> Processed
/// - Queued -> Poison
///
/// Absence of a status record means "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Queued,
    Processed,
    Poison,
}

impl MessageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageStatus::Queued => "queued",
            MessageStatus::Processed => "processed",
            MessageStatus::Poison => "poison",
        }
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Processed | MessageStatus::Poison)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = FerryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(MessageStatus::Queued),
            "processed" => Ok(MessageStatus::Processed),
            "poison" => Ok(MessageStatus::Poison),
            other => Err(FerryError::InvalidInput(format!(
                "unknown message status: {other}"
            ))),
        }
    }
}

/// Status record read back for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub message_id: String,
    pub status: MessageStatus,
    /// Last write time; `None` for records written without a timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("queued", MessageStatus::Queued, false)]
    #[case("processed", MessageStatus::Processed, true)]
    #[case("poison", MessageStatus::Poison, true)]
    fn parses_known_statuses(
        #[case] raw: &str,
        #[case] expected: MessageStatus,
        #[case] terminal: bool,
    ) {
        let status: MessageStatus = raw.parse().unwrap();
        assert_eq!(status, expected);
        assert_eq!(status.is_terminal(), terminal);
        assert_eq!(status.to_string(), raw);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!("dead".parse::<MessageStatus>().is_err());
        assert!("".parse::<MessageStatus>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(MessageStatus::Poison).unwrap(),
            serde_json::json!("poison")
        );
    }
}
