//! Telemetry - append-only per-robot, per-tick event stream.
//!
//! External consumers (renderers, chart builders, path exporters) poll this
//! log. The engine only defines the record shape; serialization is up to
//! the consumer.

use serde::{Deserialize, Serialize};
use warehouse_logic::grid::Position;

use crate::components::RobotAction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub robot_id: u32,
    pub tick: u64,
    /// Position after the action.
    pub position: Position,
    pub action: RobotAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryLog {
    events: Vec<TelemetryEvent>,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    /// Events appended after `cursor` (an index previously returned by
    /// [`TelemetryLog::len`]).
    pub fn events_since(&self, cursor: usize) -> &[TelemetryEvent] {
        self.events.get(cursor..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Cells visited by one robot, in order, collapsing consecutive repeats.
    pub fn path_of(&self, robot_id: u32) -> Vec<Position> {
        let mut path: Vec<Position> = Vec::new();
        for e in self.events.iter().filter(|e| e.robot_id == robot_id) {
            if path.last() != Some(&e.position) {
                path.push(e.position);
            }
        }
        path
    }

    pub fn count_action(&self, action: RobotAction) -> usize {
        self.events.iter().filter(|e| e.action == action).count()
    }
}
