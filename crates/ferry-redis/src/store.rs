use async_trait::async_trait;
use ferry_core::{QueueStore, StoreError};
use redis::aio::MultiplexedConnection;
use redis::{Cmd, FromRedisValue};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::retry::{RedisRetryConfig, Replay, classify, should_retry};

/// Redis-backed queue store.
///
/// Commands run on a shared multiplexed connection. Connectivity failures are
/// retried with exponential backoff and a reconnect; after `max_attempts` the
/// error is returned as `StoreError::Unavailable`. `LPOP` and `SADD` are only
/// retried when the connection was refused.
pub struct RedisQueueStore {
    client: redis::Client,
    conn: RwLock<MultiplexedConnection>,
    retry: RedisRetryConfig,
}

impl RedisQueueStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Self::connect_with(url, RedisRetryConfig::default()).await
    }

    pub async fn connect_with(url: &str, retry: RedisRetryConfig) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| classify(&e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| classify(&e))?;
        info!("connected to redis");
        Ok(Self {
            client,
            conn: RwLock::new(conn),
            retry,
        })
    }

    async fn query<T>(
        &self,
        operation: &'static str,
        replay: Replay,
        cmd: Cmd,
    ) -> Result<T, StoreError>
    where
        T: FromRedisValue + Send,
    {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            // the lock is not held across the call
            let mut conn = self.conn.read().await.clone();
            let err = match cmd.query_async::<T>(&mut conn).await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "redis command succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !should_retry(&err, replay) || attempt >= max_attempts {
                error!(operation, attempt, error = %err, "redis command failed");
                return Err(classify(&err));
            }

            warn!(
                operation,
                attempt,
                max_attempts,
                error = %err,
                "redis command failed, will retry"
            );
            tokio::time::sleep(self.retry.backoff(attempt)).await;
            self.reconnect().await;
            attempt += 1;
        }
    }

    async fn reconnect(&self) {
        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                *self.conn.write().await = conn;
                info!("reconnected to redis");
            }
            Err(err) => error!(error = %err, "failed to reconnect to redis"),
        }
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    async fn enqueue(&self, queue: &str, item: String) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("RPUSH");
        cmd.arg(queue).arg(item);
        let _len: i64 = self.query("enqueue", Replay::Idempotent, cmd).await?;
        Ok(())
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<String>, StoreError> {
        let mut cmd = redis::cmd("LPOP");
        cmd.arg(queue);
        self.query("dequeue", Replay::OnlyIfNotSent, cmd).await
    }

    async fn length(&self, queue: &str) -> Result<usize, StoreError> {
        let mut cmd = redis::cmd("LLEN");
        cmd.arg(queue);
        self.query("length", Replay::Idempotent, cmd).await
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut cmd = redis::cmd("SADD");
        cmd.arg(set).arg(member);
        let added: i64 = self.query("set_add", Replay::OnlyIfNotSent, cmd).await?;
        Ok(added > 0)
    }

    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        let mut cmd = redis::cmd("SISMEMBER");
        cmd.arg(set).arg(member);
        self.query("set_contains", Replay::Idempotent, cmd).await
    }

    async fn record_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key).arg(field).arg(value);
        let _added: i64 = self.query("record_set", Replay::Idempotent, cmd).await?;
        Ok(())
    }

    async fn record_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut cmd = redis::cmd("HGET");
        cmd.arg(key).arg(field);
        self.query("record_get", Replay::Idempotent, cmd).await
    }
}
