//! App - アプリケーション層
//!
//! ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **Producer**: submit + queue / status queries
//! - **StatusTracker**: message id -> lifecycle status
//! - **DeliveryWorker**: pop -> gate -> process -> route
//! - **WorkerGroup**: n workers + cooperative shutdown

pub mod keys;
pub mod producer;
pub mod retry;
pub mod status;
pub mod worker_group;
pub mod worker_loop;

pub use self::keys::QueueKeys;
pub use self::producer::Producer;
pub use self::retry::RetryPolicy;
pub use self::status::StatusTracker;
pub use self::worker_group::WorkerGroup;
pub use self::worker_loop::{DeliveryWorker, Tick, WorkerConfig};
