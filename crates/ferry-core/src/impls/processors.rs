//! Processing stand-ins with deterministic failure injection.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{FerryError, MessageEnvelope, ProcessingFailure};
use crate::ports::MessageProcessor;

/// Fails whenever the payload text contains `marker`.
#[derive(Debug, Clone)]
pub struct PatternProcessor {
    marker: String,
}

impl PatternProcessor {
    pub const DEFAULT_MARKER: &'static str = "fail";

    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for PatternProcessor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKER)
    }
}

#[async_trait]
impl MessageProcessor for PatternProcessor {
    async fn process(&self, envelope: &MessageEnvelope) -> Result<(), ProcessingFailure> {
        tracing::debug!(message_id = envelope.message_id(), "processing message");
        if !self.marker.is_empty() && envelope.payload_text().contains(&self.marker) {
            return Err(ProcessingFailure::new(format!(
                "payload contains failure marker {:?}",
                self.marker
            )));
        }
        Ok(())
    }
}

/// Wraps a processor and fails a fixed fraction of calls before delegating.
///
/// Failures come from a seeded `StdRng`, so the same seed gives the same sequence.
pub struct ChaosProcessor<P> {
    inner: P,
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl<P> ChaosProcessor<P> {
    pub fn new(inner: P, failure_rate: f64, seed: u64) -> Result<Self, FerryError> {
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(FerryError::InvalidInput(format!(
                "failure rate must be within [0, 1], got {failure_rate}"
            )));
        }
        Ok(Self {
            inner,
            failure_rate,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    fn roll(&self) -> bool {
        // poisoned lock: keep rolling with the inner rng anyway
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen_bool(self.failure_rate)
    }
}

#[async_trait]
impl<P: MessageProcessor> MessageProcessor for ChaosProcessor<P> {
    async fn process(&self, envelope: &MessageEnvelope) -> Result<(), ProcessingFailure> {
        if self.roll() {
            return Err(ProcessingFailure::new("simulated processing failure"));
        }
        self.inner.process(envelope).await
    }
}

/// Adapts a synchronous closure into a processor.
pub struct FnProcessor<F> {
    f: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(&MessageEnvelope) -> Result<(), ProcessingFailure> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> MessageProcessor for FnProcessor<F>
where
    F: Fn(&MessageEnvelope) -> Result<(), ProcessingFailure> + Send + Sync,
{
    async fn process(&self, envelope: &MessageEnvelope) -> Result<(), ProcessingFailure> {
        (self.f)(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn pattern_processor_fails_on_marker() {
        let p = PatternProcessor::default();
        assert!(p.process(&MessageEnvelope::new("m1", json!("ok"))).await.is_ok());
        let err = p
            .process(&MessageEnvelope::new("m2", json!("always-fail")))
            .await
            .unwrap_err();
        assert!(err.reason.contains("fail"));
    }

    #[tokio::test]
    async fn pattern_processor_sees_nested_payloads() {
        let p = PatternProcessor::new("boom");
        let env = MessageEnvelope::new("m", json!({"cmd": "boom"}));
        assert!(p.process(&env).await.is_err());
    }

    #[tokio::test]
    async fn chaos_processor_is_reproducible_for_a_seed() {
        let env = MessageEnvelope::new("m", json!("ok"));
        let a = ChaosProcessor::new(PatternProcessor::default(), 0.5, 7).unwrap();
        let b = ChaosProcessor::new(PatternProcessor::default(), 0.5, 7).unwrap();
        let mut seq_a = Vec::new();
        let mut seq_b = Vec::new();
        for _ in 0..32 {
            seq_a.push(a.process(&env).await.is_ok());
            seq_b.push(b.process(&env).await.is_ok());
        }
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.contains(&true));
        assert!(seq_a.contains(&false));
    }

    #[tokio::test]
    async fn chaos_processor_extremes() {
        let env = MessageEnvelope::new("m", json!("ok"));
        let never = ChaosProcessor::new(PatternProcessor::default(), 0.0, 1).unwrap();
        let always = ChaosProcessor::new(PatternProcessor::default(), 1.0, 1).unwrap();
        for _ in 0..10 {
            assert!(never.process(&env).await.is_ok());
            assert!(always.process(&env).await.is_err());
        }
    }

    #[test]
    fn chaos_processor_rejects_bad_rate() {
        assert!(matches!(
            ChaosProcessor::new(PatternProcessor::default(), 1.5, 0),
            Err(FerryError::InvalidInput(_))
        ));
        assert!(ChaosProcessor::new(PatternProcessor::default(), -0.1, 0).is_err());
        assert!(ChaosProcessor::new(PatternProcessor::default(), f64::NAN, 0).is_err());
    }

    #[tokio::test]
    async fn fn_processor_delegates() {
        let p = FnProcessor::new(|env: &MessageEnvelope| {
            if env.retry_count() == 0 {
                Err(ProcessingFailure::new("first attempt"))
            } else {
                Ok(())
            }
        });
        let env = MessageEnvelope::new("m", json!(null));
        assert!(p.process(&env).await.is_err());
        assert!(p.process(&env.into_retry(1)).await.is_ok());
    }
}
