//! Save/Load functionality for persisting a fleet run
//!
//! Uses bincode for a compact binary snapshot. Robots are pulled out of the
//! ECS world as plain values and respawned on load.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use warehouse_logic::config::SimConfig;

use crate::components::Robot;
use crate::systems::{Dispatcher, TelemetryLog};
use crate::warehouse::Warehouse;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Ticks completed
    pub tick: u64,
    pub config: SimConfig,
    /// Grid, shelves, docks and stations
    pub warehouse: Warehouse,
    pub dispatcher: Dispatcher,
    pub robots: Vec<Robot>,
    pub telemetry: TelemetryLog,
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(
    writer: W,
    tick: u64,
    config: &SimConfig,
    warehouse: &Warehouse,
    dispatcher: &Dispatcher,
    robots: Vec<Robot>,
    telemetry: &TelemetryLog,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        tick,
        config: config.clone(),
        warehouse: warehouse.clone(),
        dispatcher: dispatcher.clone(),
        robots,
        telemetry: telemetry.clone(),
    };

    bincode::serialize_into(writer, &save_data)?;
    log::debug!("Saved simulation at tick {}", tick);
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(save_data)
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(f, "Save version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for SaveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulationEngine;

    #[test]
    fn test_save_load_roundtrip() {
        let mut engine = SimulationEngine::standard().unwrap();
        for _ in 0..40 {
            engine.tick();
        }
        let before = engine.metrics();
        let robots_before = engine.robots();

        let mut buffer = Vec::new();
        engine.save(&mut buffer).expect("Save failed");

        let mut restored = SimulationEngine::standard().unwrap();
        restored.load(&buffer[..]).expect("Load failed");

        assert_eq!(restored.current_tick(), 40);
        assert_eq!(restored.metrics(), before);
        assert_eq!(restored.telemetry.len(), engine.telemetry.len());
        for (a, b) in restored.robots().iter().zip(robots_before.iter()) {
            assert_eq!(a.id, b.id);
            assert_eq!(a.position, b.position);
            assert_eq!(a.state, b.state);
            assert_eq!(a.path, b.path);
        }
        for robot in restored.robots() {
            assert_eq!(restored.warehouse.grid.robot_at(robot.position), Some(robot.id));
        }

        // The restored run keeps going
        restored.tick();
        assert_eq!(restored.current_tick(), 41);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let engine = SimulationEngine::standard().unwrap();
        let mut data = SaveData {
            version: SAVE_VERSION + 1,
            tick: 0,
            config: engine.config().clone(),
            warehouse: engine.warehouse.clone(),
            dispatcher: engine.dispatcher.clone(),
            robots: engine.robots(),
            telemetry: TelemetryLog::new(),
        };
        let mut buffer = Vec::new();
        bincode::serialize_into(&mut buffer, &data).unwrap();
        match load_simulation(&buffer[..]) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, SAVE_VERSION + 1);
            }
            _ => panic!("expected a version mismatch"),
        }

        data.version = SAVE_VERSION;
        buffer.clear();
        bincode::serialize_into(&mut buffer, &data).unwrap();
        assert!(load_simulation(&buffer[..]).is_ok());
    }

    #[test]
    fn test_truncated_save_is_an_error() {
        let engine = SimulationEngine::standard().unwrap();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();
        buffer.truncate(buffer.len() / 2);
        assert!(matches!(
            load_simulation(&buffer[..]),
            Err(SaveError::Bincode(_))
        ));
    }
}
