//! Save/Load functionality for persisting simulation state
//!
//! Uses bincode for a compact binary snapshot. The map layout is not part of
//! the snapshot: it is static, so the caller supplies it again on load and
//! the walkability grid is rebuilt from it.

use marauder_logic::clock::SimClock;
use marauder_logic::config::SimConfig;
use marauder_logic::footsteps::FootstepTrail;
use marauder_logic::movement::Character;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use crate::engine::EngineError;

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub config: SimConfig,
    pub clock: SimClock,
    /// Sorted by id
    pub characters: Vec<Character>,
    pub footsteps: FootstepTrail,
    /// Id handed to the next spawned character
    pub next_id: u32,
    pub tick_count: u64,
}

/// Write a snapshot
pub fn save_simulation<W: Write>(writer: W, data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, data)?;
    Ok(())
}

/// Read a snapshot and check its version
pub fn load_simulation<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let data: SaveData = bincode::deserialize_from(reader)?;

    if data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }

    Ok(data)
}

/// Error type for save/load operations
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Encode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Snapshot rejected: {0}")]
    Config(#[from] EngineError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulationEngine;
    use marauder_logic::layout::{default_cast, MapLayout};

    fn running_engine() -> SimulationEngine {
        let config = SimConfig {
            seed: Some(11),
            ..SimConfig::default()
        };
        let mut engine = SimulationEngine::new(config, MapLayout::castle()).unwrap();
        engine.spawn_cast(&default_cast());
        for _ in 0..120 {
            engine.tick(16.0);
        }
        engine
    }

    #[test]
    fn test_save_load_roundtrip() {
        let engine = running_engine();

        let mut save_buffer = Vec::new();
        engine.save(&mut save_buffer).expect("Save failed");
        assert!(!save_buffer.is_empty());

        let loaded = SimulationEngine::load(&save_buffer[..], MapLayout::castle()).expect("Load failed");

        assert_eq!(loaded.characters(), engine.characters());
        assert_eq!(loaded.clock(), engine.clock());
        assert_eq!(loaded.footsteps().len(), engine.footsteps().len());
        assert_eq!(loaded.tick_count(), engine.tick_count());
        assert_eq!(loaded.config(), engine.config());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let engine = running_engine();
        let mut data = engine.snapshot();
        data.version = SAVE_VERSION + 1;
        let mut buf = Vec::new();
        save_simulation(&mut buf, &data).unwrap();

        match load_simulation(&buf[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            other => panic!("expected VersionMismatch, got {:?}", other.map(|d| d.version)),
        }
    }

    #[test]
    fn truncated_snapshot_is_an_encode_error() {
        let engine = running_engine();
        let mut buf = Vec::new();
        engine.save(&mut buf).unwrap();
        buf.truncate(buf.len() / 2);
        assert!(matches!(
            SimulationEngine::load(&buf[..], MapLayout::castle()),
            Err(SaveError::Encode(_))
        ));
    }

    #[test]
    fn invalid_embedded_config_is_rejected() {
        let engine = running_engine();
        let mut data = engine.snapshot();
        data.config.cell_size = 0.0;
        let mut buf = Vec::new();
        save_simulation(&mut buf, &data).unwrap();
        assert!(matches!(
            SimulationEngine::load(&buf[..], MapLayout::castle()),
            Err(SaveError::Config(EngineError::InvalidConfig(_)))
        ));
    }
}
