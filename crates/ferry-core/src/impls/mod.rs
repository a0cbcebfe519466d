//! Impls - 実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryQueueStore**: 開発用の queue store
//! - **PatternProcessor / ChaosProcessor / FnProcessor**: processing stand-ins
//!
//! The Redis store lives in the `ferry-redis` crate.

pub mod inmem_store;
pub mod processors;

pub use self::inmem_store::InMemoryQueueStore;
pub use self::processors::{ChaosProcessor, FnProcessor, PatternProcessor};
