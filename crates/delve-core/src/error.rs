//! Generation errors
//!
//! Everything here is fatal for the level being generated: content bugs in
//! scripts, requests for coordinates that do not exist, and topology that
//! cannot be resolved. Bad random-draw bounds are not errors; they panic.

use delve_rng::RngError;
use strum::Display;
use thiserror::Error;

use crate::dungeon::{BranchId, DLevel};

/// Crate-wide result type
pub type Result<T> = core::result::Result<T, GenError>;

/// Position of an operation inside a script: top-level index followed by
/// child indices, shown dotted (`4.0` is the first child of op 4)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CallPath(pub Vec<usize>);

impl CallPath {
    pub fn child(&self, index: usize) -> CallPath {
        let mut path = self.0.clone();
        path.push(index);
        CallPath(path)
    }
}

impl core::fmt::Display for CallPath {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// A stair or portal the dungeon layout requires on a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Connection {
    #[strum(serialize = "down stairs")]
    DownStairs,
    #[strum(serialize = "up stairs")]
    UpStairs,
    #[strum(serialize = "branch connection")]
    BranchLink,
}

/// What went wrong inside a script call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptErrorKind {
    #[error("unknown map glyph {0:?}")]
    UnknownGlyph(char),

    #[error("coordinate ({x}, {y}) is out of bounds")]
    OutOfBounds { x: i32, y: i32 },

    #[error("selection is empty where a coordinate is required")]
    EmptySelection,

    #[error("undefined selection variable '{0}'")]
    UndefinedVariable(String),

    #[error("monsters cannot be placed inside a container")]
    MonsterInContainer,

    #[error("{width}x{height} map does not fit at ({x}, {y})")]
    MapDoesNotFit {
        width: usize,
        height: usize,
        x: i32,
        y: i32,
    },

    #[error("no position found for the room")]
    RoomDoesNotFit,

    #[error("no free floor left for the required {0}")]
    NoStairPosition(Connection),
}

impl From<crate::dungeon::SelectionError> for ScriptErrorKind {
    fn from(err: crate::dungeon::SelectionError) -> Self {
        match err {
            crate::dungeon::SelectionError::OutOfBounds { x, y } => {
                ScriptErrorKind::OutOfBounds { x, y }
            }
        }
    }
}

/// Level generation errors
#[derive(Debug, Error)]
pub enum GenError {
    #[error("unknown branch '{0}'")]
    UnknownBranch(String),

    #[error("depth {depth} is outside branch {branch} (1..={levels})")]
    DepthOutOfRange {
        branch: BranchId,
        depth: i8,
        levels: i8,
    },

    #[error("branch {branch} has no free attachment depth on {parent} in {lo}..={hi}")]
    NoAttachmentDepth {
        branch: BranchId,
        parent: BranchId,
        lo: i8,
        hi: i8,
    },

    #[error("script '{script}' on {dlevel} failed at call {call}: {kind}")]
    Script {
        script: String,
        dlevel: DLevel,
        call: CallPath,
        kind: ScriptErrorKind,
    },

    #[error("level {0} was generated without any floor")]
    NoFloor(DLevel),

    #[error("level {dlevel} has no free floor for its {connection}")]
    NoStairPosition {
        dlevel: DLevel,
        connection: Connection,
    },

    #[error("every script variant registered for {0} has weight zero")]
    ZeroVariantWeight(DLevel),

    #[error(transparent)]
    Rng(#[from] RngError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_path_display() {
        assert_eq!(CallPath(vec![4]).to_string(), "4");
        assert_eq!(CallPath(vec![4]).child(0).to_string(), "4.0");
        assert_eq!(CallPath::default().to_string(), "");
    }

    #[test]
    fn test_script_error_message() {
        let err = GenError::Script {
            script: "oracle".to_string(),
            dlevel: DLevel::new(BranchId::Main, 5),
            call: CallPath(vec![2, 1]),
            kind: ScriptErrorKind::UnknownGlyph('?'),
        };
        assert_eq!(
            err.to_string(),
            "script 'oracle' on main:5 failed at call 2.1: unknown map glyph '?'"
        );
    }

    #[test]
    fn test_missing_stairs_message() {
        let err = GenError::NoStairPosition {
            dlevel: DLevel::new(BranchId::Main, 3),
            connection: Connection::UpStairs,
        };
        assert_eq!(err.to_string(), "level main:3 has no free floor for its up stairs");
    }
}
