//! Decision model: where a failed envelope goes next.

/// The next action for an envelope whose processing failed.
///
/// Produced by [`RetryPolicy::decide`](crate::app::RetryPolicy::decide) without side effects;
/// the worker carries it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Re-enqueue at the tail of the main queue with this retry count.
    Retry { retry_count: u32 },

    /// Move to the poison queue.
    Poison { reason: String },
}
