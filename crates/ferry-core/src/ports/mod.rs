//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部システム（Redis など）や呼び出し側のロジックへの
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! The store is always injected (`Arc<dyn QueueStore>`); there is no process-wide connection.

pub mod clock;
pub mod processor;
pub mod queue_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::processor::MessageProcessor;
pub use self::queue_store::{QueueStore, StoreError};
