//! ferry-core
//!
//! At-least-once message delivery on top of a shared queue store.
//!
//! # モジュール構成
//! - **domain**: envelope, status, decision, ids, errors
//! - **ports**: 抽象化レイヤー（QueueStore, MessageProcessor, Clock）
//! - **impls**: 開発・テスト用の実装（InMemoryQueueStore, processors）
//! - **app**: producer, status tracker, delivery worker
//! - **observability**: queue lengths and tracing setup

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{
    DeliveryWorker, Producer, QueueKeys, RetryPolicy, StatusTracker, Tick, WorkerConfig,
    WorkerGroup,
};
pub use domain::{
    Decision, FerryError, MessageEnvelope, MessageStatus, ProcessingFailure, StatusView, WorkerId,
};
pub use observability::QueueLengths;
pub use ports::{Clock, MessageProcessor, QueueStore, StoreError};
