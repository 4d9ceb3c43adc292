//! Simulation clock - drives the engine until it halts.

use serde::{Deserialize, Serialize};
use warehouse_logic::config::SimConfig;

use crate::engine::{FleetMetrics, HaltReason, RunStatus, SimulationEngine};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks executed by this call
    pub ticks: u64,
    pub reason: HaltReason,
    pub metrics: FleetMetrics,
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationClock {
    pub max_time: u64,
}

impl SimulationClock {
    pub fn new(max_time: u64) -> Self {
        Self { max_time }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.max_time)
    }

    /// Tick until the fleet goes quiescent or the tick budget runs out.
    pub fn run(&self, engine: &mut SimulationEngine) -> RunSummary {
        self.run_with(engine, |_| {})
    }

    /// Like [`run`](Self::run), calling `observe` after every tick.
    ///
    /// The halt condition is checked before each tick, so an engine that
    /// starts quiescent runs zero ticks. The run stops on whichever comes
    /// first: a halt reported by the engine or the clock's own `max_time`.
    pub fn run_with<F>(&self, engine: &mut SimulationEngine, mut observe: F) -> RunSummary
    where
        F: FnMut(&SimulationEngine),
    {
        let start = engine.current_tick();
        let reason = loop {
            if let RunStatus::Halt(reason) = engine.status() {
                break reason;
            }
            if engine.current_tick() >= self.max_time {
                break HaltReason::TimeLimit;
            }
            let status = engine.tick();
            observe(&*engine);
            if let RunStatus::Halt(reason) = status {
                break reason;
            }
        };

        RunSummary {
            ticks: engine.current_tick() - start,
            reason,
            metrics: engine.metrics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warehouse_logic::layout::WarehouseLayout;

    fn engine_with(config: SimConfig) -> SimulationEngine {
        SimulationEngine::new(&WarehouseLayout::standard().unwrap(), config).unwrap()
    }

    #[test]
    fn test_runs_to_time_limit() {
        let config = SimConfig {
            max_time: 25,
            ..SimConfig::default()
        };
        let mut engine = engine_with(config.clone());
        let summary = SimulationClock::from_config(&config).run(&mut engine);
        assert_eq!(summary.ticks, 25);
        assert_eq!(summary.reason, HaltReason::TimeLimit);
        assert_eq!(summary.metrics.tick, 25);
    }

    #[test]
    fn test_engine_time_limit_wins_over_longer_clock() {
        let mut engine = engine_with(SimConfig {
            max_time: 10,
            ..SimConfig::default()
        });
        let summary = SimulationClock::new(50).run(&mut engine);
        assert_eq!(summary.ticks, 10);
        assert_eq!(summary.reason, HaltReason::TimeLimit);
        assert_eq!(engine.current_tick(), 10);
    }

    #[test]
    fn test_shorter_clock_budget_stops_first() {
        let mut engine = engine_with(SimConfig::default());
        let summary = SimulationClock::new(7).run(&mut engine);
        assert_eq!(summary.ticks, 7);
        assert_eq!(summary.reason, HaltReason::TimeLimit);
    }

    #[test]
    fn test_quiescent_start_runs_no_ticks() {
        let config = SimConfig {
            initial_packages: 0,
            ..SimConfig::default()
        };
        let mut engine = engine_with(config);
        let summary = SimulationClock::new(1000).run(&mut engine);
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.reason, HaltReason::Quiescent);
    }

    #[test]
    fn test_small_batch_drains() {
        let config = SimConfig {
            initial_packages: 4,
            ..SimConfig::default()
        };
        let mut engine = engine_with(config);
        let summary = SimulationClock::new(1000).run(&mut engine);
        assert_eq!(summary.reason, HaltReason::Quiescent);
        assert_eq!(summary.metrics.total_delivered, 4);
        assert_eq!(summary.metrics.packages_in_unload, 0);
    }

    #[test]
    fn test_observer_sees_every_tick() {
        let mut engine = engine_with(SimConfig::default());
        let mut seen = Vec::new();
        let summary = SimulationClock::new(10).run_with(&mut engine, |e| seen.push(e.current_tick()));
        assert_eq!(seen, (1..=10).collect::<Vec<u64>>());
        assert_eq!(summary.ticks, 10);
    }
}
