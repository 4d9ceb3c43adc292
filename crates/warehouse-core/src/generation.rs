//! Generation - building the site and fleet from a layout.

use hecs::{Entity, World};
use warehouse_logic::config::SimConfig;
use warehouse_logic::grid::{DockKind, Occupant};
use warehouse_logic::inventory::{Dock, Package, Shelf};
use warehouse_logic::layout::{LayoutError, WarehouseLayout};

use crate::components::Robot;
use crate::warehouse::Warehouse;

/// Build the shared site: static features, stop map, pre-shelved packages
/// and the seeded unload queue.
///
/// Package ids are handed out in order: shelves first, then the unload
/// queue. Since pickups pop the queue end, the highest id leaves first.
pub fn build_warehouse(layout: &WarehouseLayout, config: &SimConfig) -> Result<Warehouse, LayoutError> {
    layout.validate(config)?;

    let mut wh = Warehouse::new(
        layout.width,
        layout.height,
        Dock::new(
            DockKind::Unload,
            layout.unload_dock.position,
            layout.unload_dock.stand,
        ),
        Dock::new(DockKind::Load, layout.load_dock.position, layout.load_dock.stand),
    );

    let mut next_id: u32 = 0;
    for spec in &layout.shelves {
        let mut shelf = Shelf::new(spec.position, spec.capacity);
        for _ in 0..spec.initial_load {
            shelf
                .add(Package { id: next_id })
                .map_err(|_| LayoutError::ShelfOverCapacity {
                    position: spec.position,
                    load: spec.initial_load,
                    capacity: spec.capacity,
                })?;
            next_id += 1;
        }
        wh.add_shelf(shelf);
    }

    for stop in &layout.stop_positions {
        if !wh.add_stop(stop.stand, stop.target) {
            return Err(LayoutError::UnknownStopTarget {
                stand: stop.stand,
                target: stop.target,
            });
        }
    }

    for &station in &layout.battery_stations {
        wh.add_station(station);
    }
    for &obstacle in &layout.obstacles {
        wh.add_obstacle(obstacle);
    }

    for id in next_id..config.initial_packages {
        wh.unload_dock.push(Package { id });
    }

    Ok(wh)
}

/// Spawn `count` robots on the first spawn cells, ids `0..count`.
/// Returns their entities in id order.
pub fn spawn_robots(
    world: &mut World,
    wh: &mut Warehouse,
    layout: &WarehouseLayout,
    count: u32,
) -> Vec<Entity> {
    layout
        .robot_spawns
        .iter()
        .take(count as usize)
        .zip(0u32..)
        .map(|(&pos, id)| {
            wh.grid.place(pos, Occupant::Robot(id));
            world.spawn((Robot::new(id, pos),))
        })
        .collect()
}
