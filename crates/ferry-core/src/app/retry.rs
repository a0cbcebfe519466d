//! Retry policy: decides retry vs poison for a failed envelope.

use crate::domain::{Decision, MessageEnvelope};

/// Retry policy for failed messages.
///
/// Retries are immediate re-enqueues at the tail of the main queue; there is no delay.
/// `max_retries = 2` means up to 3 attempts in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Pure decision for an envelope whose latest attempt failed.
    pub fn decide(&self, envelope: &MessageEnvelope) -> Decision {
        let retry_count = envelope.retry_count();
        if retry_count < self.max_retries {
            Decision::Retry {
                retry_count: retry_count + 1,
            }
        } else {
            Decision::Poison {
                reason: format!(
                    "retry limit reached: {}/{} attempts",
                    retry_count.saturating_add(1),
                    self.max_attempts()
                ),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES)
    }
}
