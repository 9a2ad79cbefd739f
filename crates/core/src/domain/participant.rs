// Participant Domain Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant identifier (caller-controlled, opaque to the core)
pub type ParticipantId = String;

/// 1-based position inside a wait set, or the `-1` sentinel when absent
///
/// Rank is derived on every read and never stored. Treat it as a snapshot:
/// a concurrent promotion can shift it at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(i64);

impl Rank {
    /// Sentinel for "not in the wait set"
    pub const ABSENT: Rank = Rank(-1);

    /// Convert the store's native 0-based rank into a 1-based one
    pub fn from_zero_based(rank: Option<u64>) -> Self {
        match rank {
            Some(r) => Rank(r as i64 + 1),
            None => Self::ABSENT,
        }
    }

    pub fn is_present(&self) -> bool {
        self.0 >= 1
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<Rank> for i64 {
    fn from(rank: Rank) -> Self {
        rank.0
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
