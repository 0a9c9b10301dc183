//! Dungeon system
//!
//! Contains level structure, cells, dungeon topology, selections, the
//! generic room-and-corridor builder and the level script interpreter.

pub mod builtin_levels;
mod cell;
mod corridor;
pub mod des;
mod dlevel;
mod generation;
mod level;
mod rect;
mod registry;
mod room;
mod selection;
mod special_level;
mod special_rooms;
mod stairs;
mod topology;
mod trap;
mod wallify;

pub use cell::{Alignment, Cell, CellType, DoorState};
pub use corridor::{dig_corridor, joinable_rooms, make_corridors, place_door, ConnectivityTracker};
pub use dlevel::DLevel;
pub use generation::{generate_level, make_rooms, GenContext, EMERGENCY_ROOM};
pub use level::{
    Disguise, Level, LevelFlag, LevelFlags, MonsterPlacement, ObjectPlacement, Portal, Stairway,
    TrapPlacement,
};
pub use rect::Rect;
pub use registry::{Registry, Variant};
pub use room::{Room, RoomKind};
pub use selection::{Selection, SelectionError};
pub use special_level::run_script;
pub use special_rooms::{
    assign_special_room, court_monster, fill_rooms, fill_special_room, morgue_monster,
    pick_room_for_special, select_special_kind, set_level_flags_for_room, squad_monster,
    stock_room, swamp_monster,
};
pub use stairs::{find_stair_pos, place_link, place_stairs};
pub use topology::{
    default_branches, Attach, Branch, BranchDef, BranchId, BranchLink, LinkKind, StairPlan,
    Topology,
};
pub use trap::TrapKind;
pub use wallify::wallify;
