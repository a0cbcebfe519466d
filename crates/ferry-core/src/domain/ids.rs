//! Worker identifiers.
//!
//! Message ids are caller-supplied strings; only worker instances get generated ids.
//! ULID を使うので時刻順にソートでき、調整なしで複数ノードから生成できる。

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifies one delivery worker instance in logs.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(Ulid);

impl WorkerId {
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}
