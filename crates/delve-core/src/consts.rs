//! Map and generation constants
//!
//! These mirror the values of include/config.h and include/global.h.

/// Map dimensions
pub const COLNO: usize = 80;
pub const ROWNO: usize = 21;

/// Room limits
pub const MAXNROFROOMS: usize = 40;

/// Horizontal and vertical margins kept free of room interiors
pub const XLIM: usize = 4;
pub const YLIM: usize = 2;

/// Corridor digging gives up after this many steps
pub const MAX_CORRIDOR_STEPS: u32 = 500;

/// Tries at a random in-room position before falling back to a scan
pub const STAIR_POSITION_TRIES: u32 = 10;
