//! Simulation engine - main entry point for running the fleet

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use warehouse_logic::config::SimConfig;
use warehouse_logic::grid::Position;
use warehouse_logic::layout::{LayoutError, WarehouseLayout};

use crate::components::{Robot, RobotAction};
use crate::error::FleetError;
use crate::generation::{build_warehouse, spawn_robots};
use crate::systems::{agent_step, assign_destination, Dispatcher, TelemetryEvent, TelemetryLog};
use crate::warehouse::Warehouse;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Unload dock empty and nobody carrying a package.
    Quiescent,
    /// Tick budget used up.
    TimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Continue,
    Halt(HaltReason),
}

/// Read-only counters for external reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetMetrics {
    pub tick: u64,
    pub total_movements: u64,
    pub total_delivered: u64,
    pub packages_shelved: usize,
    pub packages_in_unload: usize,
    pub packages_in_load: usize,
    pub robots_carrying: usize,
    pub mean_battery: f32,
}

/// Main simulation engine
pub struct SimulationEngine {
    /// ECS world holding one entity per robot
    pub world: World,
    /// Shared site state: grid, shelves, docks, stations
    pub warehouse: Warehouse,
    pub dispatcher: Dispatcher,
    pub telemetry: TelemetryLog,
    config: SimConfig,
    /// Robot entities in id order
    robots: Vec<Entity>,
    tick: u64,
    rng: StdRng,
}

impl SimulationEngine {
    /// Build a simulation from a floor plan and run parameters.
    pub fn new(layout: &WarehouseLayout, config: SimConfig) -> Result<Self, LayoutError> {
        let mut warehouse = build_warehouse(layout, &config)?;
        let mut world = World::new();
        let robots = spawn_robots(&mut world, &mut warehouse, layout, config.num_robots);

        log::info!(
            "Warehouse {}x{} ready: {} robots, {} shelves, {} packages waiting",
            layout.width,
            layout.height,
            robots.len(),
            warehouse.shelves.len(),
            warehouse.unload_dock.len()
        );

        Ok(Self {
            world,
            warehouse,
            dispatcher: Dispatcher::new(),
            telemetry: TelemetryLog::new(),
            rng: StdRng::seed_from_u64(config.seed),
            config,
            robots,
            tick: 0,
        })
    }

    /// The bundled layout with default parameters.
    pub fn standard() -> Result<Self, LayoutError> {
        Self::new(&WarehouseLayout::standard()?, SimConfig::default())
    }

    /// Advance the simulation by one tick.
    ///
    /// The dispatcher finishes a full pass over every robot before any robot
    /// acts. Robots then act one at a time in a freshly shuffled order, each
    /// seeing the moves already made this tick.
    pub fn tick(&mut self) -> RunStatus {
        self.tick += 1;

        for &entity in &self.robots {
            if let Ok(mut robot) = self.world.get::<&mut Robot>(entity) {
                self.dispatcher
                    .dispatch(&mut robot, &self.warehouse, &self.config, &mut self.rng);
            }
        }

        let mut order = self.robots.clone();
        order.shuffle(&mut self.rng);
        for entity in order {
            let Ok(mut robot) = self.world.get::<&mut Robot>(entity) else {
                continue;
            };
            let action = agent_step(&mut robot, &mut self.warehouse, &self.config, &mut self.rng);
            if matches!(action, RobotAction::DeliverLoad | RobotAction::DeliverShelf) {
                self.dispatcher.record_delivery(self.config.phase_size);
            }
            self.telemetry.record(TelemetryEvent {
                robot_id: robot.id,
                tick: self.tick,
                position: robot.position,
                action,
            });
        }

        let status = self.status();
        if let RunStatus::Halt(reason) = status {
            log::info!("Simulation halted at tick {}: {:?}", self.tick, reason);
        }
        status
    }

    /// Whether the run should continue, judged on the current state.
    pub fn status(&self) -> RunStatus {
        if self.is_quiescent() {
            RunStatus::Halt(HaltReason::Quiescent)
        } else if self.tick >= self.config.max_time {
            RunStatus::Halt(HaltReason::TimeLimit)
        } else {
            RunStatus::Continue
        }
    }

    /// Unload dock drained and no robot holding a package.
    pub fn is_quiescent(&self) -> bool {
        self.warehouse.unload_dock.is_empty()
            && self
                .world
                .query::<&Robot>()
                .iter()
                .all(|(_, robot)| !robot.is_carrying())
    }

    /// Point a robot at a destination from outside the dispatcher.
    pub fn assign_destination(&mut self, robot_id: u32, destination: Position) -> Result<(), FleetError> {
        let entity = self.entity_of(robot_id)?;
        let mut robot = self
            .world
            .get::<&mut Robot>(entity)
            .map_err(|_| FleetError::UnknownRobot(robot_id))?;
        assign_destination(&mut robot, Some(destination), &self.warehouse)
    }

    fn entity_of(&self, robot_id: u32) -> Result<Entity, FleetError> {
        self.robots
            .get(robot_id as usize)
            .copied()
            .ok_or(FleetError::UnknownRobot(robot_id))
    }

    /// Snapshot of one robot.
    pub fn robot(&self, robot_id: u32) -> Option<Robot> {
        let entity = self.entity_of(robot_id).ok()?;
        self.world.get::<&Robot>(entity).ok().map(|r| (*r).clone())
    }

    /// Snapshot of every robot, in id order.
    pub fn robots(&self) -> Vec<Robot> {
        self.robots
            .iter()
            .filter_map(|&e| self.world.get::<&Robot>(e).ok().map(|r| (*r).clone()))
            .collect()
    }

    pub fn robot_count(&self) -> usize {
        self.robots.len()
    }

    pub fn metrics(&self) -> FleetMetrics {
        let mut total_movements = 0;
        let mut total_delivered = 0;
        let mut robots_carrying = 0;
        let mut battery_sum: u32 = 0;
        let mut count: u32 = 0;
        for (_, robot) in self.world.query::<&Robot>().iter() {
            total_movements += robot.movements;
            total_delivered += robot.delivered;
            if robot.is_carrying() {
                robots_carrying += 1;
            }
            battery_sum += robot.battery as u32;
            count += 1;
        }

        FleetMetrics {
            tick: self.tick,
            total_movements,
            total_delivered,
            packages_shelved: self.warehouse.packages_shelved(),
            packages_in_unload: self.warehouse.unload_dock.len(),
            packages_in_load: self.warehouse.load_dock.len(),
            robots_carrying,
            mean_battery: if count == 0 {
                0.0
            } else {
                battery_sum as f32 / count as f32
            },
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Ticks run so far
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Save simulation state to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_simulation(
            writer,
            self.tick,
            &self.config,
            &self.warehouse,
            &self.dispatcher,
            self.robots(),
            &self.telemetry,
        )
    }

    /// Load simulation state from a reader, replacing the current one
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SaveError> {
        let loaded = crate::persistence::load_simulation(reader)?;

        let mut robots = loaded.robots;
        robots.sort_by_key(|r| r.id);
        let mut world = World::new();
        self.robots = robots.into_iter().map(|r| world.spawn((r,))).collect();
        self.world = world;

        self.tick = loaded.tick;
        self.warehouse = loaded.warehouse;
        self.dispatcher = loaded.dispatcher;
        self.telemetry = loaded.telemetry;
        // RNG state is not persisted; derive a fresh stream from the save point
        self.rng = StdRng::seed_from_u64(loaded.config.seed ^ loaded.tick);
        self.config = loaded.config;

        Ok(())
    }
}
