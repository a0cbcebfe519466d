//! InMemoryQueueStore - 開発用の queue store
//!
//! Every primitive runs under one tokio `Mutex`, so each call is atomic
//! with respect to the others, as a real store's commands are.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{QueueStore, StoreError};

#[derive(Default)]
struct StoreState {
    lists: HashMap<String, VecDeque<String>>,
    sets: HashMap<String, HashSet<String>>,
    records: HashMap<String, HashMap<String, String>>,
}

/// In-memory queue store shared by cloning.
///
/// `set_available(false)` makes every call fail with `StoreError::Unavailable`,
/// for exercising outage paths.
#[derive(Clone)]
pub struct InMemoryQueueStore {
    state: Arc<Mutex<StoreState>>,
    available: Arc<AtomicBool>,
}

impl InMemoryQueueStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Snapshot of a list, head first.
    pub async fn items(&self, queue: &str) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .lists
            .get(queue)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store marked unavailable".to_string()))
        }
    }
}

impl Default for InMemoryQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn enqueue(&self, queue: &str, item: String) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        state.lists.entry(queue.to_string()).or_default().push_back(item);
        Ok(())
    }

    async fn dequeue(&self, queue: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.lists.get_mut(queue).and_then(VecDeque::pop_front))
    }

    async fn length(&self, queue: &str) -> Result<usize, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.lists.get(queue).map_or(0, VecDeque::len))
    }

    async fn set_add(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state
            .sets
            .entry(set.to_string())
            .or_default()
            .insert(member.to_string()))
    }

    async fn set_contains(&self, set: &str, member: &str) -> Result<bool, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state.sets.get(set).is_some_and(|s| s.contains(member)))
    }

    async fn record_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        state
            .records
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn record_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .records
            .get(key)
            .and_then(|record| record.get(field))
            .cloned())
    }
}
