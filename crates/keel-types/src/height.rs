use std::fmt;

use serde::{Deserialize, Serialize};

/// Block height, the unit of ledger progress.
///
/// Serializes as a plain integer so projected records can be filtered and
/// sorted on it directly.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Height(u64);

impl Height {
    /// The genesis height.
    pub const GENESIS: Self = Self(0);

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The next height.
    pub fn succ(&self) -> Self {
        Self(self.0 + 1)
    }

    /// The previous height, saturating at genesis.
    pub fn pred(&self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Debug for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Height({})", self.0)
    }
}

impl fmt::Display for Height {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Height {
    fn from(height: u64) -> Self {
        Self(height)
    }
}
