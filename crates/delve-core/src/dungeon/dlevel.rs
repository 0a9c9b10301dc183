//! Dungeon level identifier

use serde::{Deserialize, Serialize};

use super::topology::BranchId;

/// Dungeon level identifier: a branch and a 1-based depth inside it
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct DLevel {
    /// Which branch
    pub branch: BranchId,
    /// Level number within the branch
    pub depth: i8,
}

impl DLevel {
    /// Create a new dungeon level identifier
    pub const fn new(branch: BranchId, depth: i8) -> Self {
        Self { branch, depth }
    }

    /// Main dungeon entrance
    pub const fn main_dungeon_start() -> Self {
        Self::new(BranchId::Main, 1)
    }

    /// Check if this is the main dungeon
    pub fn is_main_dungeon(&self) -> bool {
        self.branch == BranchId::Main
    }

    /// Same branch, `delta` levels away
    pub const fn offset(&self, delta: i8) -> Self {
        Self::new(self.branch, self.depth + delta)
    }
}

impl core::fmt::Display for DLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.branch, self.depth)
    }
}
