//! Queue size views and tracing setup.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueLengths {
    pub primary_queue_length: usize,
    pub poison_queue_length: usize,
}

/// Initialize tracing for the process; filter from `RUST_LOG`, default `info`.
///
/// Safe to call multiple times; later calls keep the first subscriber.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        // 既存の subscriber に流れる
        tracing::debug!(error = %err, "tracing subscriber already installed");
    }
}
