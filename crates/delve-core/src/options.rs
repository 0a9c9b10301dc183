//! Generator options and config file parsing
//!
//! Config files use the rc-file layout: `OPTIONS=key:value,key:value`
//! lines, `#` comments and blank lines.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dungeon::DoorState;
use crate::rng::GameRng;

/// Options parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Unknown option: {0}")]
    UnknownOption(String),
    #[error("Invalid value '{1}' for option '{0}'")]
    InvalidValue(String, String),
    #[error("Missing value for option '{0}'")]
    MissingValue(String),
}

/// Constants of the generic level builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderOptions {
    /// Room placement attempts per pass
    pub room_attempts: u32,
    /// Stop placing rooms once this many exist
    pub max_rooms: usize,
    /// Fewer rooms than this triggers an escalation pass
    pub min_rooms: usize,
    /// Extra passes with halved size ranges
    pub max_escalations: u32,
    /// Minimum distance between room interiors
    pub room_gap: usize,
    /// Base range of room interior widths (3 + rn2(n))
    pub width_range: u32,
    /// Base range of room interior heights (2 + rn2(n))
    pub height_range: u32,
    /// A vault is attempted on rn2(n) == 0
    pub vault_chance: u32,
    /// First corridor pass stops early on rn2(n) == 0
    pub corridor_early_stop: u32,
    /// Extra corridors abort on rn2(n) == 0 per step
    pub nxcor_abort: u32,
    /// Corridor cells become secret on rn2(n) == 0
    pub secret_corridor: u32,
    /// Doors become secret on rn2(n) == 0
    pub secret_door: u32,
    /// Closed and locked doors are trapped on rn2(n) == 0
    pub trapped_door: u32,
    /// Shallowest depth with trapped doors
    pub trapped_door_depth: i8,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            room_attempts: 60,
            max_rooms: 10,
            min_rooms: 3,
            max_escalations: 2,
            room_gap: 3,
            width_range: 13,
            height_range: 4,
            vault_chance: 2,
            corridor_early_stop: 50,
            nxcor_abort: 35,
            secret_corridor: 100,
            secret_door: 8,
            trapped_door: 25,
            trapped_door_depth: 5,
        }
    }
}

/// Relative weights of the door states picked for ordinary doors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorWeights {
    pub no_door: u32,
    pub broken: u32,
    pub open: u32,
    pub closed: u32,
    pub locked: u32,
}

impl Default for DoorWeights {
    fn default() -> Self {
        Self {
            no_door: 8,
            broken: 1,
            open: 3,
            closed: 5,
            locked: 3,
        }
    }
}

impl DoorWeights {
    pub fn total(&self) -> u32 {
        self.no_door + self.broken + self.open + self.closed + self.locked
    }

    /// One `rn2(total)` draw; all-zero weights give a doorway without a draw
    pub fn pick(&self, rng: &mut GameRng) -> DoorState {
        let total = self.total();
        if total == 0 {
            return DoorState::NO_DOOR;
        }
        let mut roll = rng.rn2(total);
        for (weight, state) in [
            (self.no_door, DoorState::NO_DOOR),
            (self.broken, DoorState::BROKEN),
            (self.open, DoorState::OPEN),
            (self.closed, DoorState::CLOSED),
            (self.locked, DoorState::LOCKED),
        ] {
            if roll < weight {
                return state;
            }
            roll -= weight;
        }
        DoorState::NO_DOOR
    }
}

/// All generator options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenOptions {
    pub builder: BuilderOptions,
    pub doors: DoorWeights,
}

impl GenOptions {
    /// Load options from a config file
    pub fn load_from_file(path: &Path) -> Result<Self, OptionsError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| OptionsError::IoError(e.to_string()))?;

        Self::parse_config(&contents)
    }

    /// Parse options from a config string
    pub fn parse_config(contents: &str) -> Result<Self, OptionsError> {
        let mut options = Self::default();

        for line in contents.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(opts) = line.strip_prefix("OPTIONS=") {
                for opt in opts.split(',').map(str::trim).filter(|o| !o.is_empty()) {
                    options.parse_option(opt)?;
                }
            } else {
                return Err(OptionsError::UnknownOption(line.to_string()));
            }
        }

        Ok(options)
    }

    /// Parse a single `key:value` option
    fn parse_option(&mut self, opt: &str) -> Result<(), OptionsError> {
        let (key, value) = opt
            .split_once(':')
            .or_else(|| opt.split_once('='))
            .ok_or_else(|| OptionsError::MissingValue(opt.to_string()))?;
        self.set_option(key.trim(), value.trim())
    }

    /// Set an option with a value
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), OptionsError> {
        let b = &mut self.builder;
        let d = &mut self.doors;
        match name {
            "room_attempts" => b.room_attempts = number(name, value)?,
            "max_rooms" => b.max_rooms = number(name, value)?,
            "min_rooms" => b.min_rooms = number(name, value)?,
            "max_escalations" => b.max_escalations = number(name, value)?,
            "room_gap" => b.room_gap = number(name, value)?,
            "width_range" => b.width_range = positive(name, value)?,
            "height_range" => b.height_range = positive(name, value)?,
            "vault_chance" => b.vault_chance = positive(name, value)?,
            "corridor_early_stop" => b.corridor_early_stop = positive(name, value)?,
            "nxcor_abort" => b.nxcor_abort = positive(name, value)?,
            "secret_corridor" => b.secret_corridor = positive(name, value)?,
            "secret_door" => b.secret_door = positive(name, value)?,
            "trapped_door" => b.trapped_door = positive(name, value)?,
            "trapped_door_depth" => b.trapped_door_depth = number(name, value)?,
            "door_none" | "door_nodoor" => d.no_door = number(name, value)?,
            "door_broken" => d.broken = number(name, value)?,
            "door_open" => d.open = number(name, value)?,
            "door_closed" => d.closed = number(name, value)?,
            "door_locked" => d.locked = number(name, value)?,
            _ => return Err(OptionsError::UnknownOption(name.to_string())),
        }
        Ok(())
    }
}

fn number<T: core::str::FromStr>(name: &str, value: &str) -> Result<T, OptionsError> {
    value
        .parse()
        .map_err(|_| OptionsError::InvalidValue(name.to_string(), value.to_string()))
}

/// Values used as a draw bound must not be zero
fn positive(name: &str, value: &str) -> Result<u32, OptionsError> {
    match number::<u32>(name, value)? {
        0 => Err(OptionsError::InvalidValue(
            name.to_string(),
            value.to_string(),
        )),
        n => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GenOptions::default();
        assert_eq!(opts.builder.room_attempts, 60);
        assert_eq!(opts.builder.max_rooms, 10);
        assert_eq!(opts.doors.total(), 20);
    }

    #[test]
    fn test_parse_config() {
        let config = "\
# generator tuning
OPTIONS=room_attempts:40, max_rooms:8

OPTIONS=door_locked:0,secret_door=12
";
        let opts = GenOptions::parse_config(config).unwrap();
        assert_eq!(opts.builder.room_attempts, 40);
        assert_eq!(opts.builder.max_rooms, 8);
        assert_eq!(opts.builder.secret_door, 12);
        assert_eq!(opts.doors.locked, 0);
        assert_eq!(opts.doors.closed, 5);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            GenOptions::parse_config("OPTIONS=colour:1"),
            Err(OptionsError::UnknownOption("colour".to_string()))
        );
        assert_eq!(
            GenOptions::parse_config("OPTIONS=max_rooms:lots"),
            Err(OptionsError::InvalidValue(
                "max_rooms".to_string(),
                "lots".to_string()
            ))
        );
        assert_eq!(
            GenOptions::parse_config("OPTIONS=secret_door:0"),
            Err(OptionsError::InvalidValue(
                "secret_door".to_string(),
                "0".to_string()
            ))
        );
        assert_eq!(
            GenOptions::parse_config("OPTIONS=max_rooms"),
            Err(OptionsError::MissingValue("max_rooms".to_string()))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = GenOptions::load_from_file(Path::new("/nonexistent/delve.rc")).unwrap_err();
        assert!(matches!(err, OptionsError::IoError(_)));
    }

    #[test]
    fn test_door_pick_is_one_draw() {
        let weights = DoorWeights::default();
        let mut rng = GameRng::new(8);
        let mut seen_locked = false;
        for _ in 0..200 {
            seen_locked |= weights.pick(&mut rng) == DoorState::LOCKED;
        }
        assert!(seen_locked);
        assert_eq!(rng.call_count(), 200);
    }

    #[test]
    fn test_door_pick_single_weight() {
        let weights = DoorWeights {
            no_door: 0,
            broken: 0,
            open: 0,
            closed: 1,
            locked: 0,
        };
        let mut rng = GameRng::new(8);
        assert_eq!(weights.pick(&mut rng), DoorState::CLOSED);
    }
}
