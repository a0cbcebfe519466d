//! WorkerGroup - 複数の DeliveryWorker を起動・停止する
//!
//! Workers share one store and processor and stop together on a watch channel.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::app::{DeliveryWorker, QueueKeys, WorkerConfig};
use crate::domain::{FerryError, WorkerId};
use crate::ports::{MessageProcessor, QueueStore};

/// Worker group handle.
/// - `shutdown_tx` を drop するとワーカー全体が止まる
/// - `shutdown_and_join()` で全ワーカーの終了を待てる
/// - `wait_any()` はどれか一つが自分で止まったときに返る
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    ids: Vec<WorkerId>,
    joins: JoinSet<Result<(), FerryError>>,
}

impl WorkerGroup {
    /// Spawn `n` workers sharing one store and processor.
    pub fn spawn(
        n: usize,
        store: Arc<dyn QueueStore>,
        processor: Arc<dyn MessageProcessor>,
        keys: QueueKeys,
        config: WorkerConfig,
    ) -> Self {
        let workers = (0..n)
            .map(|_| {
                DeliveryWorker::new(
                    Arc::clone(&store),
                    Arc::clone(&processor),
                    keys.clone(),
                    config,
                )
            })
            .collect();
        Self::from_workers(workers)
    }

    pub fn from_workers(workers: Vec<DeliveryWorker>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut ids = Vec::with_capacity(workers.len());
        let mut joins = JoinSet::new();
        for worker in workers {
            ids.push(worker.id());
            let rx = shutdown_rx.clone();
            joins.spawn(async move { worker.run(rx).await });
        }

        Self {
            shutdown_tx,
            ids,
            joins,
        }
    }

    pub fn worker_ids(&self) -> &[WorkerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Request shutdown for all workers.
    /// In-flight messages are finished and routed; no new item is dequeued.
    pub fn request_shutdown(&self) {
        // receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Resolves when any worker ends before shutdown was requested.
    ///
    /// Workers only stop on their own after a store error, so the result is
    /// always an error. Pending forever for an empty group.
    pub async fn wait_any(&mut self) -> FerryError {
        match self.joins.join_next().await {
            Some(Ok(Err(err))) => err,
            Some(Ok(Ok(()))) => FerryError::WorkerStopped("exited before shutdown".to_string()),
            Some(Err(join_err)) => FerryError::WorkerStopped(join_err.to_string()),
            None => std::future::pending().await,
        }
    }

    /// Run until `shutdown` completes or a worker stops, then shut down the rest.
    ///
    /// A worker that stopped early is reported as the error.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), FerryError>
    where
        F: Future<Output = ()>,
    {
        let stopped = tokio::select! {
            () = shutdown => None,
            err = self.wait_any() => Some(err),
        };
        if let Some(err) = &stopped {
            tracing::error!(error = %err, "delivery worker stopped, shutting down the group");
        }
        let joined = self.shutdown_and_join().await;
        match stopped {
            Some(err) => Err(err),
            None => joined,
        }
    }

    /// Shutdown and wait for all workers; returns the first worker error.
    pub async fn shutdown_and_join(mut self) -> Result<(), FerryError> {
        self.request_shutdown();
        let mut first_err = None;
        while let Some(joined) = self.joins.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    first_err.get_or_insert(err);
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "delivery worker task aborted");
                    first_err.get_or_insert(FerryError::WorkerStopped(join_err.to_string()));
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Producer;
    use crate::domain::MessageStatus;
    use crate::impls::{InMemoryQueueStore, PatternProcessor};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn group_drains_queue_with_several_workers() {
        let store = InMemoryQueueStore::new();
        let shared: Arc<dyn QueueStore> = Arc::new(store.clone());
        let producer = Producer::new(Arc::clone(&shared), QueueKeys::default());
        for i in 0..20 {
            let payload = if i % 5 == 0 { json!("fail") } else { json!("ok") };
            producer.submit(format!("m{i}"), payload).await.unwrap();
        }

        let group = WorkerGroup::spawn(
            4,
            shared,
            Arc::new(PatternProcessor::default()),
            QueueKeys::default(),
            WorkerConfig {
                poll_interval: Duration::from_millis(5),
                ..WorkerConfig::default()
            },
        );
        assert_eq!(group.len(), 4);
        let mut ids = group.worker_ids().to_vec();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);

        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let lengths = producer.queue_lengths().await.unwrap();
                if lengths.primary_queue_length == 0 && lengths.poison_queue_length == 4 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        group.shutdown_and_join().await.unwrap();

        for i in 0..20 {
            let expected = if i % 5 == 0 {
                MessageStatus::Poison
            } else {
                MessageStatus::Processed
            };
            assert_eq!(producer.status(&format!("m{i}")).await.unwrap().status, expected);
        }
    }

    #[tokio::test]
    async fn shutdown_reports_worker_errors() {
        let store = InMemoryQueueStore::new();
        store.set_available(false);
        let group = WorkerGroup::spawn(
            2,
            Arc::new(store),
            Arc::new(PatternProcessor::default()),
            QueueKeys::default(),
            WorkerConfig::default(),
        );
        assert!(matches!(
            group.shutdown_and_join().await,
            Err(FerryError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn wait_any_returns_when_store_goes_away() {
        let store = InMemoryQueueStore::new();
        let mut group = WorkerGroup::spawn(
            2,
            Arc::new(store.clone()),
            Arc::new(PatternProcessor::default()),
            QueueKeys::default(),
            WorkerConfig {
                poll_interval: Duration::from_millis(5),
                ..WorkerConfig::default()
            },
        );

        // healthy workers keep running
        assert!(
            tokio::time::timeout(Duration::from_millis(50), group.wait_any())
                .await
                .is_err()
        );

        store.set_available(false);
        let err = tokio::time::timeout(Duration::from_secs(5), group.wait_any())
            .await
            .unwrap();
        assert!(matches!(err, FerryError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn run_until_exits_on_worker_failure_without_shutdown_signal() {
        let store = InMemoryQueueStore::new();
        store.set_available(false);
        let group = WorkerGroup::spawn(
            1,
            Arc::new(store),
            Arc::new(PatternProcessor::default()),
            QueueKeys::default(),
            WorkerConfig::default(),
        );
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            group.run_until(std::future::pending()),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(FerryError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn run_until_stops_cleanly_on_shutdown() {
        let group = WorkerGroup::spawn(
            2,
            Arc::new(InMemoryQueueStore::new()),
            Arc::new(PatternProcessor::default()),
            QueueKeys::default(),
            WorkerConfig {
                poll_interval: Duration::from_millis(5),
                ..WorkerConfig::default()
            },
        );
        let shutdown = tokio::time::sleep(Duration::from_millis(20));
        group.run_until(shutdown).await.unwrap();
    }
}
