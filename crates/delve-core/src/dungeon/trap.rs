//! Trap kinds and depth-gated random trap selection

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::rng::GameRng;

/// Trap types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "snake_case")]
pub enum TrapKind {
    Arrow,
    Dart,
    RockFall,
    Squeaky,
    BearTrap,
    LandMine,
    RollingBoulder,
    SleepingGas,
    RustTrap,
    FireTrap,
    Pit,
    SpikedPit,
    Hole,
    TrapDoor,
    Teleport,
    LevelTeleport,
    MagicPortal,
    Web,
    Statue,
    MagicTrap,
    AntiMagic,
    Polymorph,
}

impl TrapKind {
    /// Shallowest depth at which the generator may pick this trap at random.
    /// `None` for traps that are only ever placed explicitly.
    pub const fn min_depth(&self) -> Option<i8> {
        match self {
            TrapKind::Arrow
            | TrapKind::Squeaky
            | TrapKind::BearTrap
            | TrapKind::RustTrap
            | TrapKind::Pit
            | TrapKind::Teleport
            | TrapKind::Statue
            | TrapKind::MagicTrap => Some(1),
            TrapKind::Dart | TrapKind::RockFall | TrapKind::SleepingGas => Some(2),
            TrapKind::TrapDoor | TrapKind::Hole => Some(3),
            TrapKind::FireTrap | TrapKind::SpikedPit | TrapKind::AntiMagic => Some(5),
            TrapKind::LandMine | TrapKind::LevelTeleport | TrapKind::Web => Some(6),
            TrapKind::RollingBoulder => Some(2),
            TrapKind::Polymorph => Some(8),
            TrapKind::MagicPortal => None,
        }
    }

    /// Traps a level at `depth` may receive at random, in declaration order
    pub fn eligible(depth: i8) -> Vec<TrapKind> {
        TrapKind::iter()
            .filter(|k| k.min_depth().is_some_and(|d| d <= depth))
            .collect()
    }

    /// One draw over the eligible kinds
    pub fn random(rng: &mut GameRng, depth: i8) -> TrapKind {
        let kinds = Self::eligible(depth.max(1));
        rng.choose(&kinds).copied().unwrap_or(TrapKind::Arrow)
    }
}
