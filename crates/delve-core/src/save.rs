//! Session snapshots
//!
//! Only what generation needs to resume is saved: the generator state with
//! its draw counter, the resolved topology and the variant choices made so
//! far. Levels themselves are the caller's business.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dungeon::{DLevel, Topology};
use crate::rng::GameRng;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

const SNAPSHOT_MAGIC: &str = "DLVS";

/// Snapshot persistence errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Incompatible snapshot version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Invalid snapshot header")]
    InvalidHeader,
}

/// Resumable state of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    magic: String,
    pub version: u32,
    pub rng: GameRng,
    pub topology: Topology,
    pub choices: Vec<(DLevel, usize)>,
}

impl SessionSnapshot {
    pub fn new(rng: &GameRng, topology: &Topology, choices: Vec<(DLevel, usize)>) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC.to_string(),
            version: SNAPSHOT_VERSION,
            rng: rng.clone(),
            topology: topology.clone(),
            choices,
        }
    }

    pub fn validate(&self) -> Result<(), SaveError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SaveError::InvalidHeader);
        }
        if self.version != SNAPSHOT_VERSION {
            return Err(SaveError::IncompatibleVersion {
                expected: SNAPSHOT_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SaveError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SaveError> {
        let snapshot: SessionSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Write the snapshot to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SaveError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Read and validate a snapshot file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        let reader = BufReader::new(File::open(path)?);
        let snapshot: SessionSnapshot = serde_json::from_reader(reader)?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}
