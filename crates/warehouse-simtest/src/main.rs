//! Warehouse Fleet Headless Simulation Harness
//!
//! Loads a floor plan, runs the fleet to completion and checks the run-wide
//! invariants after every tick. Runs entirely in-process with no rendering.
//!
//! Usage:
//!   cargo run -p warehouse-simtest
//!   cargo run -p warehouse-simtest -- --verbose --seed 7 --robots 6
//!   cargo run -p warehouse-simtest -- --layout my_floor.json --json

use std::collections::HashSet;

use warehouse_core::clock::{RunSummary, SimulationClock};
use warehouse_core::engine::{HaltReason, SimulationEngine};
use warehouse_logic::config::SimConfig;
use warehouse_logic::grid::Position;
use warehouse_logic::layout::WarehouseLayout;
use warehouse_logic::pathfinding::{find_path, is_contiguous};

// ── Command line ────────────────────────────────────────────────────────

struct Options {
    verbose: bool,
    json: bool,
    layout_path: Option<String>,
    config: SimConfig,
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_num<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T, String> {
    match arg_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|_| format!("{} expects a number, got '{}'", flag, raw)),
        None => Ok(default),
    }
}

fn parse_options() -> Result<Options, String> {
    let args: Vec<String> = std::env::args().collect();
    let defaults = SimConfig::default();
    let config = SimConfig {
        seed: parse_num(&args, "--seed", defaults.seed)?,
        max_time: parse_num(&args, "--max-time", defaults.max_time)?,
        num_robots: parse_num(&args, "--robots", defaults.num_robots)?,
        initial_packages: parse_num(&args, "--packages", defaults.initial_packages)?,
        ..defaults
    };
    Ok(Options {
        verbose: args.iter().any(|a| a == "--verbose"),
        json: args.iter().any(|a| a == "--json"),
        layout_path: arg_value(&args, "--layout"),
        config,
    })
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let options = match parse_options() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };
    let verbose = options.verbose;
    println!("=== Warehouse Fleet Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Floor plan
    let layout = match load_layout(&options, &mut results) {
        Some(l) => l,
        None => finish(results, verbose, None),
    };

    // 2. Static reachability
    results.extend(validate_reachability(&layout, verbose));

    // 3. Full run with per-tick invariants
    let summary = run_fleet(&layout, &options.config, verbose, &mut results);

    // 4. Same seed, same outcome
    results.extend(validate_determinism(&layout, &options.config, summary.as_ref(), verbose));

    // 5. Save/load mid-run
    results.extend(validate_persistence(&layout, &options.config, verbose));

    if options.json {
        if let Some(s) = &summary {
            match serde_json::to_string_pretty(s) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("could not encode summary: {}", e),
            }
        }
    }

    finish(results, verbose, summary)
}

fn finish(results: Vec<TestResult>, verbose: bool, summary: Option<RunSummary>) -> ! {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    if let Some(s) = summary {
        println!(
            "\nRun: {:?} after {} ticks, {} delivered ({} shelved, {} to load dock), {} moves",
            s.reason,
            s.ticks,
            s.metrics.total_delivered,
            s.metrics.packages_shelved,
            s.metrics.packages_in_load,
            s.metrics.total_movements
        );
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    std::process::exit(0);
}

// ── 1. Layout ───────────────────────────────────────────────────────────

fn load_layout(options: &Options, results: &mut Vec<TestResult>) -> Option<WarehouseLayout> {
    println!("--- Layout ---");

    let parsed = match &options.layout_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => WarehouseLayout::from_json(&text),
            Err(e) => {
                results.push(TestResult {
                    name: "layout_read".into(),
                    passed: false,
                    detail: format!("{}: {}", path, e),
                });
                return None;
            }
        },
        None => WarehouseLayout::standard(),
    };

    let layout = match parsed {
        Ok(l) => l,
        Err(e) => {
            results.push(TestResult {
                name: "layout_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };
    results.push(TestResult {
        name: "layout_parse".into(),
        passed: true,
        detail: format!(
            "{}x{}, {} shelves, {} stations, {} spawns",
            layout.width,
            layout.height,
            layout.shelves.len(),
            layout.battery_stations.len(),
            layout.robot_spawns.len()
        ),
    });

    match layout.validate(&options.config) {
        Ok(()) => {
            results.push(TestResult {
                name: "layout_valid".into(),
                passed: true,
                detail: format!(
                    "hosts {} robots and {} packages",
                    options.config.num_robots, options.config.initial_packages
                ),
            });
            Some(layout)
        }
        Err(e) => {
            results.push(TestResult {
                name: "layout_valid".into(),
                passed: false,
                detail: e.to_string(),
            });
            None
        }
    }
}

// ── 2. Reachability ─────────────────────────────────────────────────────

fn validate_reachability(layout: &WarehouseLayout, verbose: bool) -> Vec<TestResult> {
    println!("--- Reachability ---");
    let mut results = Vec::new();
    let bounds = layout.bounds();

    let mut walls: HashSet<Position> = layout.shelves.iter().map(|s| s.position).collect();
    walls.extend(layout.obstacles.iter().copied());
    walls.extend(layout.battery_stations.iter().copied());
    walls.insert(layout.unload_dock.position);
    walls.insert(layout.load_dock.position);

    let stands: Vec<Position> = layout
        .stop_positions
        .iter()
        .map(|s| s.stand)
        .chain([layout.unload_dock.stand, layout.load_dock.stand])
        .collect();

    let mut unreachable = Vec::new();
    let mut malformed = 0;
    let mut checked = 0;
    for &spawn in &layout.robot_spawns {
        for &stand in &stands {
            if spawn == stand {
                continue;
            }
            checked += 1;
            let path = find_path(&bounds, spawn, stand, |p| walls.contains(&p));
            if path.is_empty() {
                unreachable.push((spawn, stand));
                continue;
            }
            let sound = is_contiguous(spawn, &path)
                && path.iter().all(|p| !walls.contains(p))
                && path.len() as u32 >= spawn.manhattan(&stand);
            if !sound {
                malformed += 1;
            }
            if verbose {
                println!("  {} -> {}: {} steps", spawn, stand, path.len());
            }
        }
    }

    results.push(TestResult {
        name: "stands_reachable".into(),
        passed: unreachable.is_empty(),
        detail: if unreachable.is_empty() {
            format!("{} spawn/stand pairs connected", checked)
        } else {
            format!(
                "{} unreachable, first {} -> {}",
                unreachable.len(),
                unreachable[0].0,
                unreachable[0].1
            )
        },
    });
    results.push(TestResult {
        name: "paths_well_formed".into(),
        passed: malformed == 0,
        detail: format!("{} malformed of {}", malformed, checked),
    });

    // Every station must be enterable from some free neighbor
    let bad_stations: Vec<_> = layout
        .battery_stations
        .iter()
        .filter(|s| {
            !bounds
                .neighbors4(**s)
                .any(|n| !walls.contains(&n) && !layout.battery_stations.contains(&n))
        })
        .collect();
    results.push(TestResult {
        name: "stations_accessible".into(),
        passed: bad_stations.is_empty(),
        detail: format!("{} sealed stations", bad_stations.len()),
    });

    results
}

// ── 3. Full run ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Violations {
    battery: u64,
    shelf: u64,
    shared_cell: u64,
    index: u64,
    conservation: u64,
    first: Option<String>,
}

impl Violations {
    fn note(&mut self, what: String) {
        if self.first.is_none() {
            self.first = Some(what);
        }
    }

    fn total(&self) -> u64 {
        self.battery + self.shelf + self.shared_cell + self.index + self.conservation
    }
}

fn check_tick(engine: &SimulationEngine, v: &mut Violations) {
    let tick = engine.current_tick();
    let mut cells = HashSet::new();
    for robot in engine.robots() {
        if robot.battery > 100 {
            v.battery += 1;
            v.note(format!("tick {}: robot {} battery {}", tick, robot.id, robot.battery));
        }
        if !cells.insert(robot.position) {
            v.shared_cell += 1;
            v.note(format!("tick {}: two robots on {}", tick, robot.position));
        }
        if engine.warehouse.grid.robot_at(robot.position) != Some(robot.id) {
            v.index += 1;
            v.note(format!("tick {}: robot {} missing from index", tick, robot.id));
        }
    }
    for shelf in &engine.warehouse.shelves {
        if shelf.current_load() > shelf.capacity() {
            v.shelf += 1;
            v.note(format!("tick {}: shelf {} over capacity", tick, shelf.position));
        }
    }
    let m = engine.metrics();
    let accounted = m.packages_in_unload + m.robots_carrying + m.packages_shelved + m.packages_in_load;
    if accounted != engine.config().initial_packages as usize {
        v.conservation += 1;
        v.note(format!("tick {}: {} packages accounted for", tick, accounted));
    }
}

fn run_fleet(
    layout: &WarehouseLayout,
    config: &SimConfig,
    verbose: bool,
    results: &mut Vec<TestResult>,
) -> Option<RunSummary> {
    println!("--- Fleet run ---");

    let mut engine = match SimulationEngine::new(layout, config.clone()) {
        Ok(e) => e,
        Err(e) => {
            results.push(TestResult {
                name: "engine_build".into(),
                passed: false,
                detail: e.to_string(),
            });
            return None;
        }
    };

    let mut violations = Violations::default();
    let report_every = (config.max_time / 10).max(1);
    let summary = SimulationClock::from_config(config).run_with(&mut engine, |e| {
        check_tick(e, &mut violations);
        if verbose && e.current_tick() % report_every == 0 {
            let m = e.metrics();
            println!(
                "  tick {:>5}: unload {:>3}, shelved {:>3}, load {:>3}, carrying {}, battery {:.1}",
                m.tick,
                m.packages_in_unload,
                m.packages_shelved,
                m.packages_in_load,
                m.robots_carrying,
                m.mean_battery
            );
        }
    });

    results.push(TestResult {
        name: "invariants_every_tick".into(),
        passed: violations.total() == 0,
        detail: match &violations.first {
            None => format!("{} ticks clean", summary.ticks),
            Some(first) => format!(
                "battery {}, shelf {}, shared cell {}, index {}, conservation {}; first: {}",
                violations.battery,
                violations.shelf,
                violations.shared_cell,
                violations.index,
                violations.conservation,
                first
            ),
        },
    });

    let m = &summary.metrics;
    results.push(TestResult {
        name: "deliveries_counted".into(),
        passed: m.total_delivered as usize
            == m.packages_shelved + m.packages_in_load - layout.preloaded_packages(),
        detail: format!(
            "{} delivered, {} shelved ({} preloaded), {} at load dock",
            m.total_delivered,
            m.packages_shelved,
            layout.preloaded_packages(),
            m.packages_in_load
        ),
    });

    results.push(TestResult {
        name: "fleet_made_progress".into(),
        passed: m.total_delivered > 0 || config.initial_packages as usize == layout.preloaded_packages(),
        detail: format!("{} moves over {} ticks", m.total_movements, summary.ticks),
    });

    let halt_consistent = match summary.reason {
        HaltReason::Quiescent => engine.is_quiescent(),
        HaltReason::TimeLimit => engine.current_tick() >= config.max_time,
    };
    results.push(TestResult {
        name: "halt_consistent".into(),
        passed: halt_consistent,
        detail: format!("{:?} at tick {}", summary.reason, engine.current_tick()),
    });

    let events = engine.telemetry.len() as u64;
    let expected = summary.ticks * engine.robot_count() as u64;
    results.push(TestResult {
        name: "telemetry_complete".into(),
        passed: events == expected,
        detail: format!("{} events, expected {}", events, expected),
    });

    Some(summary)
}

// ── 4. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(
    layout: &WarehouseLayout,
    config: &SimConfig,
    first: Option<&RunSummary>,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();
    let Some(first) = first else {
        return results;
    };

    let rerun = SimulationEngine::new(layout, config.clone())
        .map(|mut engine| SimulationClock::from_config(config).run(&mut engine));
    let (passed, detail) = match rerun {
        Ok(second) if second == *first => (true, format!("seed {} reproduced", config.seed)),
        Ok(second) => (
            false,
            format!(
                "seed {} diverged: {} vs {} ticks, {} vs {} delivered",
                config.seed,
                first.ticks,
                second.ticks,
                first.metrics.total_delivered,
                second.metrics.total_delivered
            ),
        ),
        Err(e) => (false, e.to_string()),
    };
    if verbose {
        println!("  {}", detail);
    }
    results.push(TestResult {
        name: "same_seed_same_run".into(),
        passed,
        detail,
    });

    results
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(layout: &WarehouseLayout, config: &SimConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let mut engine = match SimulationEngine::new(layout, config.clone()) {
        Ok(e) => e,
        Err(_) => return results,
    };
    SimulationClock::new(config.max_time.min(50)).run(&mut engine);

    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        results.push(TestResult {
            name: "save".into(),
            passed: false,
            detail: e.to_string(),
        });
        return results;
    }
    if verbose {
        println!("  save size: {} bytes", buffer.len());
    }

    let mut restored = match SimulationEngine::new(layout, config.clone()) {
        Ok(e) => e,
        Err(_) => return results,
    };
    let detail = match restored.load(&buffer[..]) {
        Ok(()) if restored.metrics() == engine.metrics() => {
            format!("tick {} restored ({} bytes)", restored.current_tick(), buffer.len())
        }
        Ok(()) => "metrics differ after load".to_string(),
        Err(e) => e.to_string(),
    };
    results.push(TestResult {
        name: "save_load_roundtrip".into(),
        passed: restored.metrics() == engine.metrics(),
        detail,
    });

    results
}
