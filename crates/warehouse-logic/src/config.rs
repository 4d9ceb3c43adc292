//! Tunable simulation parameters and fleet counts.

use serde::{Deserialize, Serialize};

use crate::constants::{battery, clock, fleet};

/// Numeric knobs for a run. Geometry lives in [`crate::layout::WarehouseLayout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub num_robots: u32,
    pub initial_packages: u32,
    pub discharge_rate: u8,
    pub speed: u8,
    pub charge_rate: u8,
    pub low_battery_threshold: u8,
    pub phase_size: u32,
    pub stuck_tolerance: u32,
    /// Tick budget. The clock halts once this many ticks have run.
    pub max_time: u64,
    /// Seed for every random choice in the run.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_robots: fleet::NUM_ROBOTS,
            initial_packages: fleet::INITIAL_PACKAGES,
            discharge_rate: battery::DISCHARGE_RATE,
            speed: battery::SPEED,
            charge_rate: battery::CHARGE_RATE,
            low_battery_threshold: battery::LOW_THRESHOLD,
            phase_size: fleet::PHASE_SIZE,
            stuck_tolerance: fleet::STUCK_TOLERANCE,
            max_time: clock::MAX_TIME,
            seed: clock::SEED,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
