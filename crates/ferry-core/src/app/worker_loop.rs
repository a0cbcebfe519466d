//! DeliveryWorker - 配送ループ
//!
//! # フロー
//! 1. QueueStore::dequeue() で main queue の先頭を取得（空なら poll_interval 待機）
//! 2. idempotency gate: processed set に含まれていれば破棄
//! 3. attempt claim: `{message_id}#{retry_count}` を set_add し、勝った worker だけが処理する
//! 4. MessageProcessor 実行
//! 5. 成功: processed set + status `processed`
//! 6. 失敗: RetryPolicy に従い main queue の末尾へ戻すか poison queue へ

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::Instrument;

use crate::app::{QueueKeys, RetryPolicy, StatusTracker};
use crate::domain::{Decision, FerryError, MessageEnvelope, MessageStatus, ProcessingFailure, WorkerId};
use crate::ports::{MessageProcessor, QueueStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Sleep between polls while the main queue is empty.
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Result of one loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Main queue was empty.
    Idle,
    /// Id already processed; envelope dropped.
    Duplicate,
    /// Another delivery already claimed this attempt; envelope dropped.
    ClaimLost,
    Processed,
    Retried { retry_count: u32 },
    Poisoned,
    /// Item could not be decoded and was moved to the poison queue as-is.
    Malformed,
}

pub struct DeliveryWorker {
    id: WorkerId,
    store: Arc<dyn QueueStore>,
    processor: Arc<dyn MessageProcessor>,
    keys: QueueKeys,
    status: StatusTracker,
    config: WorkerConfig,
}

impl DeliveryWorker {
    pub fn new(
        store: Arc<dyn QueueStore>,
        processor: Arc<dyn MessageProcessor>,
        keys: QueueKeys,
        config: WorkerConfig,
    ) -> Self {
        let status = StatusTracker::new(Arc::clone(&store), keys.clone());
        Self {
            id: WorkerId::generate(),
            store,
            processor,
            keys,
            status,
            config,
        }
    }

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Run until shutdown is requested (or the sender is dropped).
    ///
    /// Shutdown is only observed between iterations; an in-flight message is
    /// always routed first. Store errors end the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), FerryError> {
        let span = tracing::info_span!("delivery_worker", worker_id = %self.id);
        async {
            tracing::info!("delivery worker started");
            loop {
                if *shutdown.borrow() {
                    break;
                }

                let tick = match self.run_once().await {
                    Ok(tick) => tick,
                    Err(err) => {
                        tracing::error!(error = %err, "delivery worker stopped on store error");
                        return Err(err);
                    }
                };

                if tick == Tick::Idle {
                    tokio::select! {
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
            tracing::info!("delivery worker stopped");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// One iteration: dequeue at most one item and route it. Never sleeps.
    pub async fn run_once(&self) -> Result<Tick, FerryError> {
        let Some(raw) = self.store.dequeue(&self.keys.main_queue).await? else {
            return Ok(Tick::Idle);
        };

        let envelope = match MessageEnvelope::decode(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(error = %err, "undecodable item moved to poison queue");
                self.store.enqueue(&self.keys.poison_queue, raw).await?;
                return Ok(Tick::Malformed);
            }
        };

        self.deliver(envelope).await
    }

    async fn deliver(&self, envelope: MessageEnvelope) -> Result<Tick, FerryError> {
        let message_id = envelope.message_id().to_string();

        if self
            .store
            .set_contains(&self.keys.processed_set, &message_id)
            .await?
        {
            tracing::warn!(message_id = %message_id, "skipping duplicate");
            // a later submit may have rewritten the status to queued
            self.status.set(&message_id, MessageStatus::Processed).await?;
            return Ok(Tick::Duplicate);
        }

        if !self
            .store
            .set_add(&self.keys.claim_set, &envelope.attempt_key())
            .await?
        {
            tracing::warn!(
                message_id = %message_id,
                retry_count = envelope.retry_count(),
                "attempt already claimed, dropping envelope"
            );
            return Ok(Tick::ClaimLost);
        }

        match self.dispatch(&envelope).await {
            Ok(()) => {
                self.store
                    .set_add(&self.keys.processed_set, &message_id)
                    .await?;
                self.status.set(&message_id, MessageStatus::Processed).await?;
                tracing::info!(
                    message_id = %message_id,
                    retry_count = envelope.retry_count(),
                    "message processed"
                );
                Ok(Tick::Processed)
            }
            Err(failure) => self.route_failure(envelope, failure).await,
        }
    }

    /// Panics inside the processor count as processing failures.
    async fn dispatch(&self, envelope: &MessageEnvelope) -> Result<(), ProcessingFailure> {
        let processor = Arc::clone(&self.processor);
        let envelope = envelope.clone();
        match tokio::spawn(async move { processor.process(&envelope).await }).await {
            Ok(result) => result,
            Err(join_err) => Err(ProcessingFailure::new(format!(
                "processor aborted: {join_err}"
            ))),
        }
    }

    async fn route_failure(
        &self,
        envelope: MessageEnvelope,
        failure: ProcessingFailure,
    ) -> Result<Tick, FerryError> {
        let message_id = envelope.message_id().to_string();

        match self.config.retry.decide(&envelope) {
            Decision::Retry { retry_count } => {
                tracing::warn!(
                    message_id = %message_id,
                    retry_count,
                    error = %failure,
                    "processing failed, retrying"
                );
                let next = envelope.into_retry(retry_count);
                self.store
                    .enqueue(&self.keys.main_queue, next.encode()?)
                    .await?;
                Ok(Tick::Retried { retry_count })
            }
            Decision::Poison { reason } => {
                tracing::error!(
                    message_id = %message_id,
                    retry_count = envelope.retry_count(),
                    error = %failure,
                    reason = %reason,
                    "moved to poison queue"
                );
                self.store
                    .enqueue(&self.keys.poison_queue, envelope.encode()?)
                    .await?;
                self.status.set(&message_id, MessageStatus::Poison).await?;
                Ok(Tick::Poisoned)
            }
        }
    }
}
