//! Grid A* pathfinding.
//!
//! 4-directional search with uniform step cost and a Manhattan heuristic.
//! The frontier is ordered by `(f, insertion sequence)` so that equal-`f`
//! entries pop in the order they were discovered. Together with the fixed
//! neighbor order of [`GridBounds::neighbors4`] this makes every search
//! fully deterministic.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::grid::{GridBounds, Position};

/// Find a shortest path from `start` to `goal`.
///
/// The result excludes `start` and ends with `goal`. It is empty when the
/// goal is unreachable, when the goal itself is blocked, or when
/// `start == goal`. Cells outside `bounds` are never expanded; everything
/// else is filtered through `is_blocked`.
pub fn find_path<F>(bounds: &GridBounds, start: Position, goal: Position, is_blocked: F) -> Vec<Position>
where
    F: Fn(Position) -> bool,
{
    if start == goal || !bounds.in_bounds(goal) || is_blocked(goal) {
        return Vec::new();
    }

    let mut frontier: BinaryHeap<Reverse<(u32, u64, Position)>> = BinaryHeap::new();
    let mut g_cost: HashMap<Position, u32> = HashMap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();
    let mut seq: u64 = 0;

    g_cost.insert(start, 0);
    frontier.push(Reverse((start.manhattan(&goal), seq, start)));

    while let Some(Reverse((_, _, current))) = frontier.pop() {
        if current == goal {
            return reconstruct(&came_from, start, goal);
        }
        if !closed.insert(current) {
            continue;
        }

        let current_g = g_cost.get(&current).copied().unwrap_or(u32::MAX);
        for next in bounds.neighbors4(current) {
            if closed.contains(&next) || is_blocked(next) {
                continue;
            }
            let tentative = current_g.saturating_add(1);
            if g_cost.get(&next).map_or(true, |&g| tentative < g) {
                g_cost.insert(next, tentative);
                came_from.insert(next, current);
                seq += 1;
                frontier.push(Reverse((tentative + next.manhattan(&goal), seq, next)));
            }
        }
    }

    Vec::new()
}

fn reconstruct(came_from: &HashMap<Position, Position>, start: Position, goal: Position) -> Vec<Position> {
    let mut path = vec![goal];
    let mut node = goal;
    while let Some(&prev) = came_from.get(&node) {
        if prev == start {
            break;
        }
        path.push(prev);
        node = prev;
    }
    path.reverse();
    path
}

/// Length of a path in steps. Paths exclude their start cell.
pub fn path_cost(path: &[Position]) -> u32 {
    path.len() as u32
}

/// Whether consecutive cells of `path` (starting from `start`) are all
/// orthogonally adjacent.
pub fn is_contiguous(start: Position, path: &[Position]) -> bool {
    let mut prev = start;
    for &step in path {
        if prev.manhattan(&step) != 1 {
            return false;
        }
        prev = step;
    }
    true
}
