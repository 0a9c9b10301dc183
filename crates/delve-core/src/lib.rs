//! delve-core: deterministic dungeon level generation
//!
//! Given a seed and a dungeon coordinate this crate produces a complete
//! level: terrain, rooms, corridors, doors, stairs and the initial monster,
//! object and trap placements. Every random decision goes through one
//! session generator in a fixed order, so the same seed always yields the
//! same levels and the same draw trace.
//!
//! Levels come either from the generic room-and-corridor builder or from a
//! level script (see [`dungeon::des`]) run by the script interpreter.

pub mod dungeon;
pub mod error;
pub mod options;
pub mod save;
pub mod session;
pub mod tables;

mod consts;
mod rng;

pub use consts::*;
pub use delve_rng::{RngState, RngTraceEntry};
pub use error::{GenError, Result};
pub use rng::GameRng;
pub use session::Session;
