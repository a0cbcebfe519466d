//! ferry-redis
//!
//! Redis implementation of the `QueueStore` port.
//! Lists back the queues, sets back the markers, hashes back the status records.

mod retry;
mod store;

pub use retry::RedisRetryConfig;
pub use store::RedisQueueStore;
