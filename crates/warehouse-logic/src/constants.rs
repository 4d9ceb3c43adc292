//! Simulation defaults.
//!
//! Plain numeric constants with no engine dependency. `SimConfig::default()`
//! is built from these.

pub mod battery {
    /// Units lost per cell moved at speed 1.
    pub const DISCHARGE_RATE: u8 = 1;
    /// Cells moved per step.
    pub const SPEED: u8 = 1;
    /// Units gained per tick on a station.
    pub const CHARGE_RATE: u8 = 5;
    /// At or below this level a robot drops its task and goes to charge.
    pub const LOW_THRESHOLD: u8 = 30;
}

pub mod fleet {
    pub const NUM_ROBOTS: u32 = 5;
    pub const INITIAL_PACKAGES: u32 = 100;
    /// Completed deliveries per phase before the dispatcher flips targets.
    pub const PHASE_SIZE: u32 = 10;
    /// Consecutive blocked ticks tolerated before an escape move.
    pub const STUCK_TOLERANCE: u32 = 5;
}

pub mod clock {
    pub const MAX_TIME: u64 = 1000;
    pub const SEED: u64 = 42;
}

pub mod shelf {
    pub const CAPACITY: usize = 3;
}
