//! Retry / reconnect policy for Redis commands.

use std::time::Duration;

use ferry_core::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedisRetryConfig {
    /// Attempts per command, including the first.
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles after each further failure.
    pub initial_backoff: Duration,
}

impl RedisRetryConfig {
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RedisRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
        }
    }
}

/// Connectivity problems are worth a reconnect; anything else is returned as is.
pub(crate) fn classify(err: &redis::RedisError) -> StoreError {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
    {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::OperationFailed(err.to_string())
    }
}

/// How safe it is to send a failed command again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Replay {
    /// Running twice leaves the same state (`LLEN`, `HSET`, `RPUSH` duplicates are tolerated).
    Idempotent,
    /// A second run changes the result (`LPOP` pops the next item, `SADD` reports "present").
    /// Only retried when the command never reached the server.
    OnlyIfNotSent,
}

pub(crate) fn should_retry(err: &redis::RedisError, replay: Replay) -> bool {
    match replay {
        Replay::Idempotent => matches!(classify(err), StoreError::Unavailable(_)),
        Replay::OnlyIfNotSent => err.is_connection_refusal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redis::{ErrorKind, RedisError};
    use rstest::rstest;
    use std::io;

    fn io_err(kind: io::ErrorKind) -> RedisError {
        RedisError::from(io::Error::new(kind, "simulated"))
    }

    #[test]
    fn backoff_doubles() {
        let config = RedisRetryConfig::default();
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn io_errors_mean_unavailable() {
        let err = io_err(io::ErrorKind::ConnectionReset);
        assert!(matches!(classify(&err), StoreError::Unavailable(_)));
    }

    #[test]
    fn type_errors_are_operation_failures() {
        let err = RedisError::from((ErrorKind::TypeError, "WRONGTYPE"));
        assert!(matches!(classify(&err), StoreError::OperationFailed(_)));
    }

    #[rstest]
    #[case::refused_idempotent(io::ErrorKind::ConnectionRefused, Replay::Idempotent, true)]
    #[case::refused_pop(io::ErrorKind::ConnectionRefused, Replay::OnlyIfNotSent, true)]
    #[case::reset_idempotent(io::ErrorKind::ConnectionReset, Replay::Idempotent, true)]
    #[case::reset_pop(io::ErrorKind::ConnectionReset, Replay::OnlyIfNotSent, false)]
    #[case::timeout_idempotent(io::ErrorKind::TimedOut, Replay::Idempotent, true)]
    #[case::timeout_pop(io::ErrorKind::TimedOut, Replay::OnlyIfNotSent, false)]
    fn retry_decision_depends_on_replay_safety(
        #[case] kind: io::ErrorKind,
        #[case] replay: Replay,
        #[case] expected: bool,
    ) {
        assert_eq!(should_retry(&io_err(kind), replay), expected);
    }

    #[test]
    fn server_errors_are_never_retried() {
        let err = RedisError::from((ErrorKind::TypeError, "WRONGTYPE"));
        assert!(!should_retry(&err, Replay::Idempotent));
        assert!(!should_retry(&err, Replay::OnlyIfNotSent));
    }
}
