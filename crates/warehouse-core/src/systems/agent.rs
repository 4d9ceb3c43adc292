//! Robot agent - the per-robot state machine.
//!
//! Each tick a robot evaluates, in priority order:
//! 1. charging (top up on a station, or drift back to one),
//! 2. low-battery preemption (head for the nearest station),
//! 3. normal work (fetch from the unload dock or deliver what it carries).
//!
//! Every move goes through the live occupancy index, so a robot acting later
//! in a tick sees the cells claimed by robots that acted before it.

use rand::seq::SliceRandom;
use rand::Rng;
use warehouse_logic::battery;
use warehouse_logic::config::SimConfig;
use warehouse_logic::grid::Position;
use warehouse_logic::pathfinding::find_path;

use crate::components::{Robot, RobotAction, RobotState};
use crate::error::FleetError;
use crate::warehouse::{Sink, Warehouse};

/// Command interface used by the dispatcher (and tests) to point a robot at
/// a new destination.
///
/// Replans immediately when the destination changes; assigning the current
/// destination again is a no-op unless a replan is pending. An unreachable
/// destination is dropped so the robot is eligible for reassignment.
pub fn assign_destination(
    robot: &mut Robot,
    destination: Option<Position>,
    wh: &Warehouse,
) -> Result<(), FleetError> {
    let Some(dest) = destination else {
        robot.destination = None;
        robot.path.clear();
        return Ok(());
    };
    if !wh.grid.in_bounds(dest) {
        return Err(FleetError::OutOfBounds(dest));
    }
    if robot.destination == Some(dest) && !robot.needs_replan {
        return Ok(());
    }
    robot.destination = Some(dest);
    replan(robot, wh)
}

/// Run one tick of a robot's behavior.
pub fn agent_step<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    rng: &mut R,
) -> RobotAction {
    if robot.charging {
        return charging_step(robot, wh, config, rng);
    }
    if battery::is_low(robot.battery, config.low_battery_threshold) {
        return seek_charger(robot, wh, config, rng);
    }
    if robot.is_carrying() {
        deliver_step(robot, wh, config, rng)
    } else {
        fetch_step(robot, wh, config, rng)
    }
}

fn charging_step<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    rng: &mut R,
) -> RobotAction {
    robot.state = RobotState::Charging;

    // Marked charging but not on a station: walk back first
    if !wh.grid.is_station(robot.position) {
        if let Some(station) = wh.nearest_station(robot.position, robot.id) {
            if robot.destination != Some(station) {
                if let Err(e) = assign_destination(robot, Some(station), wh) {
                    log::debug!("Robot {} cannot return to a station: {}", robot.id, e);
                    return RobotAction::Idle;
                }
            }
        }
        return move_along_path(robot, wh, config, rng);
    }

    robot.battery = battery::charge(robot.battery, config.charge_rate);
    if robot.battery >= battery::FULL {
        robot.charging = false;
        robot.destination = None;
        robot.path.clear();
        robot.stuck_counter = 0;
        robot.state = if robot.is_carrying() {
            RobotState::PathingToDeliver
        } else {
            RobotState::Idle
        };
        log::debug!("Robot {} fully charged at {}", robot.id, robot.position);
    }
    RobotAction::Charge
}

fn seek_charger<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    rng: &mut R,
) -> RobotAction {
    robot.state = RobotState::PathingToCharge;

    if wh.grid.is_station(robot.position) {
        robot.charging = true;
        robot.state = RobotState::Charging;
        robot.destination = None;
        robot.path.clear();
        robot.stuck_counter = 0;
        return RobotAction::Charge;
    }

    // Stick with the current station while it stays free for us
    let keep_current = robot.destination.is_some_and(|d| {
        wh.stations.contains(&d) && wh.grid.robot_at(d).map_or(true, |id| id == robot.id)
    });
    if !keep_current {
        let Some(station) = wh.nearest_station(robot.position, robot.id) else {
            return RobotAction::Idle;
        };
        if let Err(e) = assign_destination(robot, Some(station), wh) {
            log::debug!("Robot {} cannot reach a station: {}", robot.id, e);
            return RobotAction::Idle;
        }
    }
    move_along_path(robot, wh, config, rng)
}

fn fetch_step<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    rng: &mut R,
) -> RobotAction {
    let Some(dest) = robot.destination else {
        robot.state = RobotState::Idle;
        return RobotAction::Idle;
    };
    let pickup_stand = wh.unload_dock.stand;

    if robot.position == dest {
        if dest != pickup_stand {
            // Reached a wander target
            robot.destination = None;
            robot.path.clear();
            robot.state = RobotState::Idle;
            return RobotAction::Idle;
        }
        robot.state = RobotState::PickingUp;
        return match wh.pickup() {
            Ok(package) => {
                robot.carrying = Some(package);
                robot.destination = None;
                robot.path.clear();
                robot.stuck_counter = 0;
                robot.state = RobotState::PathingToDeliver;
                RobotAction::Pickup
            }
            Err(e) => {
                log::debug!("Robot {} waiting at unload dock: {}", robot.id, e);
                RobotAction::Idle
            }
        };
    }

    robot.state = if dest == pickup_stand {
        RobotState::PathingToPickup
    } else {
        RobotState::Idle
    };
    move_along_path(robot, wh, config, rng)
}

fn deliver_step<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    rng: &mut R,
) -> RobotAction {
    let Some(package) = robot.carrying else {
        return RobotAction::Idle;
    };
    let Some(dest) = robot.destination else {
        // Waiting for the dispatcher to route the package
        robot.state = RobotState::PathingToDeliver;
        return RobotAction::Idle;
    };

    if robot.position == dest {
        robot.state = RobotState::Delivering;
        return match wh.deliver(dest, package) {
            Ok(sink) => {
                robot.carrying = None;
                robot.destination = None;
                robot.path.clear();
                robot.stuck_counter = 0;
                robot.delivered += 1;
                robot.state = RobotState::Idle;
                match sink {
                    Sink::LoadDock => RobotAction::DeliverLoad,
                    Sink::Shelf(_) => RobotAction::DeliverShelf,
                }
            }
            Err(e) => {
                log::debug!("Robot {} could not deliver: {}", robot.id, e);
                robot.destination = None;
                robot.path.clear();
                robot.state = RobotState::PathingToDeliver;
                RobotAction::Idle
            }
        };
    }

    robot.state = RobotState::PathingToDeliver;
    move_along_path(robot, wh, config, rng)
}

/// Take one step along the planned path, or handle being blocked.
fn move_along_path<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    rng: &mut R,
) -> RobotAction {
    if battery::is_depleted(robot.battery) && !wh.grid.is_station(robot.position) {
        if !robot.stalled {
            robot.stalled = true;
            log::warn!(
                "{} at {}",
                FleetError::BatteryDepleted { robot_id: robot.id },
                robot.position
            );
        }
        return RobotAction::Idle;
    }

    let Some(dest) = robot.destination else {
        return RobotAction::Idle;
    };
    if robot.position == dest {
        return RobotAction::Idle;
    }
    if (robot.needs_replan || robot.path.is_empty()) && replan(robot, wh).is_err() {
        return RobotAction::Idle;
    }
    let Some(&next) = robot.path.front() else {
        return RobotAction::Idle;
    };

    let intent = robot.has_charging_intent();
    if !wh.grid.is_blocked_for(next, robot.id, intent) {
        robot.path.pop_front();
        step_to(robot, next, wh, config);
        return RobotAction::Move;
    }

    robot.stuck_counter += 1;
    robot.state = RobotState::Stuck;
    log::debug!(
        "Robot {} blocked ({} ticks): {}",
        robot.id,
        robot.stuck_counter,
        FleetError::CellOccupied { cell: next }
    );

    if robot.stuck_counter > config.stuck_tolerance {
        if alternative_move(robot, wh, config, intent, rng) {
            return RobotAction::Move;
        }
    } else {
        // Adopt a detour if one exists; otherwise keep waiting on the plan
        let detour = plan_path(wh, robot.id, robot.position, dest, intent);
        if !detour.is_empty() {
            robot.path = detour.into();
        }
    }
    RobotAction::Idle
}

/// Escape a deadlock by stepping onto a random free neighbor.
fn alternative_move<R: Rng + ?Sized>(
    robot: &mut Robot,
    wh: &mut Warehouse,
    config: &SimConfig,
    intent: bool,
    rng: &mut R,
) -> bool {
    let free: Vec<Position> = wh
        .grid
        .neighbors4(robot.position)
        .filter(|p| !wh.grid.is_blocked_for(*p, robot.id, intent))
        .collect();
    let Some(&target) = free.choose(rng) else {
        return false;
    };
    log::debug!("Robot {} escaping to {}", robot.id, target);
    step_to(robot, target, wh, config);
    robot.path.clear();
    robot.needs_replan = true;
    true
}

fn step_to(robot: &mut Robot, next: Position, wh: &mut Warehouse, config: &SimConfig) {
    wh.grid.move_robot(robot.id, robot.position, next);
    robot.position = next;
    robot.movements += 1;
    robot.battery = battery::discharge(robot.battery, config.discharge_rate, config.speed);
    robot.stuck_counter = 0;
}

/// Recompute the path to the current destination.
fn replan(robot: &mut Robot, wh: &Warehouse) -> Result<(), FleetError> {
    robot.needs_replan = false;
    let Some(dest) = robot.destination else {
        robot.path.clear();
        return Ok(());
    };
    if dest == robot.position {
        robot.path.clear();
        return Ok(());
    }
    let path = plan_path(wh, robot.id, robot.position, dest, robot.has_charging_intent());
    if path.is_empty() {
        let err = FleetError::PathNotFound {
            from: robot.position,
            to: dest,
        };
        log::debug!("Robot {}: {}", robot.id, err);
        robot.destination = None;
        robot.path.clear();
        return Err(err);
    }
    robot.path = path.into();
    Ok(())
}

fn plan_path(
    wh: &Warehouse,
    robot_id: u32,
    from: Position,
    goal: Position,
    may_enter_station: bool,
) -> Vec<Position> {
    find_path(wh.grid.bounds(), from, goal, |p| {
        wh.grid.is_blocked_for(p, robot_id, may_enter_station)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use warehouse_logic::grid::{DockKind, Occupant};
    use warehouse_logic::inventory::{Dock, Package, Shelf};

    /// 8x5 floor:
    /// unload (0,2)/stand (1,2), load (7,2)/stand (6,2),
    /// shelf A (3,4)/stand (3,3) cap 3, shelf B (5,4)/stand (5,3) cap 1,
    /// station (3,0).
    fn site() -> Warehouse {
        let mut wh = Warehouse::new(
            8,
            5,
            Dock::new(DockKind::Unload, Position::new(0, 2), Position::new(1, 2)),
            Dock::new(DockKind::Load, Position::new(7, 2), Position::new(6, 2)),
        );
        wh.add_shelf(Shelf::new(Position::new(3, 4), 3));
        wh.add_shelf(Shelf::new(Position::new(5, 4), 1));
        wh.add_stop(Position::new(3, 3), Position::new(3, 4));
        wh.add_stop(Position::new(5, 3), Position::new(5, 4));
        wh.add_station(Position::new(3, 0));
        wh
    }

    fn put(wh: &mut Warehouse, id: u32, x: i32, y: i32) -> Robot {
        let pos = Position::new(x, y);
        wh.grid.place(pos, Occupant::Robot(id));
        Robot::new(id, pos)
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_walks_to_pickup_and_takes_package() {
        let mut wh = site();
        wh.unload_dock.push(Package { id: 1 });
        wh.unload_dock.push(Package { id: 2 });
        let mut robot = put(&mut wh, 0, 4, 2);
        let config = SimConfig::default();
        let mut rng = rng();

        assign_destination(&mut robot, Some(Position::new(1, 2)), &wh).unwrap();
        assert_eq!(robot.path.len(), 3);

        for _ in 0..3 {
            assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
            assert_eq!(robot.state, RobotState::PathingToPickup);
        }
        assert_eq!(robot.position, Position::new(1, 2));
        assert_eq!(wh.grid.robot_at(Position::new(1, 2)), Some(0));

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Pickup);
        assert_eq!(robot.carrying, Some(Package { id: 2 }));
        assert_eq!(robot.destination, None);
        assert_eq!(robot.state, RobotState::PathingToDeliver);
        assert_eq!(wh.unload_dock.len(), 1);
        assert_eq!(robot.movements, 3);
        assert_eq!(robot.battery, 97);
    }

    #[test]
    fn test_empty_dock_keeps_robot_waiting() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 1, 2);
        robot.destination = Some(Position::new(1, 2));
        let action = agent_step(&mut robot, &mut wh, &SimConfig::default(), &mut rng());
        assert_eq!(action, RobotAction::Idle);
        assert_eq!(robot.state, RobotState::PickingUp);
        assert_eq!(robot.destination, Some(Position::new(1, 2)));
        assert!(!robot.is_carrying());
    }

    #[test]
    fn test_deliver_to_shelf() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 3, 3);
        robot.carrying = Some(Package { id: 4 });
        robot.destination = Some(Position::new(3, 3));
        let action = agent_step(&mut robot, &mut wh, &SimConfig::default(), &mut rng());
        assert_eq!(action, RobotAction::DeliverShelf);
        assert_eq!(wh.shelves[0].current_load(), 1);
        assert_eq!(robot.delivered, 1);
        assert!(!robot.is_carrying());
        assert_eq!(robot.state, RobotState::Idle);
    }

    #[test]
    fn test_deliver_to_load_dock() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 6, 2);
        robot.carrying = Some(Package { id: 4 });
        robot.destination = Some(Position::new(6, 2));
        let action = agent_step(&mut robot, &mut wh, &SimConfig::default(), &mut rng());
        assert_eq!(action, RobotAction::DeliverLoad);
        assert_eq!(wh.load_dock.len(), 1);
    }

    #[test]
    fn test_full_shelf_drops_destination_keeps_package() {
        let mut wh = site();
        wh.shelves[1].add(Package { id: 50 }).unwrap();
        let mut robot = put(&mut wh, 0, 5, 3);
        robot.carrying = Some(Package { id: 4 });
        robot.destination = Some(Position::new(5, 3));
        let action = agent_step(&mut robot, &mut wh, &SimConfig::default(), &mut rng());
        assert_eq!(action, RobotAction::Idle);
        assert_eq!(robot.carrying, Some(Package { id: 4 }));
        assert_eq!(robot.destination, None);
        assert_eq!(robot.state, RobotState::PathingToDeliver);
        assert_eq!(wh.shelves[1].current_load(), 1);
    }

    #[test]
    fn test_low_battery_preempts_on_following_tick() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 1, 1);
        robot.battery = 31;
        let config = SimConfig::default();
        let mut rng = rng();
        assign_destination(&mut robot, Some(Position::new(6, 4)), &wh).unwrap();

        // Crossing the threshold happens during this move
        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
        assert_eq!(robot.battery, 30);
        assert_ne!(robot.state, RobotState::PathingToCharge);

        // Preemption fires now
        agent_step(&mut robot, &mut wh, &config, &mut rng);
        assert_eq!(robot.state, RobotState::PathingToCharge);
        assert_eq!(robot.destination, Some(Position::new(3, 0)));
    }

    #[test]
    fn test_reaches_station_and_charges_to_full() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 2, 0);
        robot.battery = 20;
        robot.carrying = Some(Package { id: 1 });
        let config = SimConfig::default();
        let mut rng = rng();

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
        assert_eq!(robot.position, Position::new(3, 0));
        assert_eq!(robot.battery, 19);

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Charge);
        assert!(robot.charging);
        assert_eq!(robot.state, RobotState::Charging);

        let mut ticks = 0;
        while robot.charging {
            assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Charge);
            assert!(robot.battery <= 100);
            ticks += 1;
        }
        assert_eq!(ticks, 17); // 19 -> 100 at +5 per tick
        assert_eq!(robot.battery, 100);
        assert_eq!(robot.state, RobotState::PathingToDeliver);
    }

    #[test]
    fn test_charging_off_station_drifts_back() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 2, 0);
        robot.battery = 50;
        robot.charging = true;
        let config = SimConfig::default();
        let mut rng = rng();

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
        assert_eq!(robot.position, Position::new(3, 0));
        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Charge);
        assert_eq!(robot.battery, 54);
    }

    #[test]
    fn test_depleted_robot_stalls() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 6, 4);
        robot.battery = 0;
        let config = SimConfig::default();
        let mut rng = rng();
        for _ in 0..3 {
            assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Idle);
        }
        assert!(robot.stalled);
        assert_eq!(robot.position, Position::new(6, 4));
        assert_eq!(robot.battery, 0);
        assert_eq!(robot.movements, 0);
    }

    #[test]
    fn test_unreachable_destination_is_dropped() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 1, 1);
        // Shelf cell itself can never be entered
        let err = assign_destination(&mut robot, Some(Position::new(3, 4)), &wh).unwrap_err();
        assert!(matches!(err, FleetError::PathNotFound { .. }));
        assert_eq!(robot.destination, None);
        assert!(robot.path.is_empty());
    }

    #[test]
    fn test_assign_out_of_bounds_is_rejected() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 1, 1);
        assert_eq!(
            assign_destination(&mut robot, Some(Position::new(8, 0)), &wh),
            Err(FleetError::OutOfBounds(Position::new(8, 0)))
        );
    }

    #[test]
    fn test_station_blocked_without_charging_intent() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 2, 0);
        assign_destination(&mut robot, Some(Position::new(4, 0)), &wh).unwrap();
        assert!(!robot.path.contains(&Position::new(3, 0)));
        assert_eq!(robot.path.len(), 4);
    }

    #[test]
    fn test_blocked_six_ticks_escapes_once() {
        // 5x3 floor. Robot at (0,0) wants (2,0); another robot sits on
        // (1,0). (1,1) is an obstacle and (0,2) a dock, so there is no
        // detour and (0,1) is the only free neighbor.
        let mut wh = Warehouse::new(
            5,
            3,
            Dock::new(DockKind::Unload, Position::new(0, 2), Position::new(2, 2)),
            Dock::new(DockKind::Load, Position::new(4, 2), Position::new(4, 1)),
        );
        wh.add_obstacle(Position::new(1, 1));
        wh.add_station(Position::new(4, 0));
        let mut robot = put(&mut wh, 0, 0, 0);
        let config = SimConfig::default();
        let mut rng = rng();

        assign_destination(&mut robot, Some(Position::new(2, 0)), &wh).unwrap();
        assert_eq!(robot.path.len(), 2);
        let _blocker = put(&mut wh, 1, 1, 0);

        for tick in 1..=5 {
            assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Idle);
            assert_eq!(robot.stuck_counter, tick);
            assert_eq!(robot.state, RobotState::Stuck);
            assert_eq!(robot.position, Position::new(0, 0));
        }

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
        assert_eq!(robot.position, Position::new(0, 1));
        assert_eq!(robot.movements, 1);
        assert_eq!(robot.stuck_counter, 0);
        assert!(robot.needs_replan);
        assert_eq!(wh.grid.robot_at(Position::new(0, 1)), Some(0));
        assert_eq!(wh.grid.robot_at(Position::new(0, 0)), None);
    }

    #[test]
    fn test_detour_around_blocking_robot() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 1, 1);
        let config = SimConfig::default();
        let mut rng = rng();
        assign_destination(&mut robot, Some(Position::new(5, 1)), &wh).unwrap();
        // Straight line along y = 1; block it after planning
        let _other = put(&mut wh, 1, 2, 1);

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Idle);
        assert_eq!(robot.stuck_counter, 1);
        assert!(!robot.path.contains(&Position::new(2, 1)));

        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
        assert_eq!(robot.stuck_counter, 0);
    }

    #[test]
    fn test_wander_target_reached_goes_idle() {
        let mut wh = site();
        let mut robot = put(&mut wh, 0, 4, 1);
        let config = SimConfig::default();
        let mut rng = rng();
        assign_destination(&mut robot, Some(Position::new(4, 2)), &wh).unwrap();
        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Move);
        assert_eq!(agent_step(&mut robot, &mut wh, &config, &mut rng), RobotAction::Idle);
        assert_eq!(robot.destination, None);
        assert_eq!(robot.state, RobotState::Idle);
    }
}
