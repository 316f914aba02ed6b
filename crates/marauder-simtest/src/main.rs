//! Marauder Headless Simulation Harness
//!
//! Validates the map, schedules, path search, movement and the engine
//! without any renderer. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p marauder-simtest
//!   cargo run -p marauder-simtest -- --verbose --seed 7 --ticks 5000
//!   cargo run -p marauder-simtest -- --map castle.json --dump-frame frame.json

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use marauder_core::engine::SimulationEngine;
use marauder_logic::clock::SimClock;
use marauder_logic::config::{load_config, SimConfig};
use marauder_logic::geometry::{Room, Severity, WorldPos};
use marauder_logic::grid::{build_grid, CellPos, Grid};
use marauder_logic::layout::{default_cast, MapLayout};
use marauder_logic::movement::{advance_character, Character, TickEnv};
use marauder_logic::pathfinding::{find_cell_path, find_path, Navigator, PathError};
use marauder_logic::schedule::{resolve, Archetype, MovementMode, TimeBlock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

/// Headless checks for the Marauder map simulation
#[derive(Parser, Debug)]
#[command(name = "marauder-simtest")]
#[command(about = "Validates the Marauder map simulation without a renderer", long_about = None)]
#[command(version)]
struct Args {
    /// Print every check, not just failures
    #[arg(short, long)]
    verbose: bool,

    /// RNG seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Engine ticks to run in the timed scenario
    #[arg(long, default_value_t = 3600)]
    ticks: u32,

    /// Real milliseconds per tick
    #[arg(long, default_value_t = 16.0)]
    tick_ms: f64,

    /// JSON simulation config (missing fields use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON map layout (defaults to the built-in castle)
    #[arg(long)]
    map: Option<PathBuf>,

    /// Write the final render frame as JSON
    #[arg(long)]
    dump_frame: Option<PathBuf>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            load_config(&json).with_context(|| format!("loading config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    config.seed = args.seed.or(config.seed).or(Some(42));

    let layout = match &args.map {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading map {}", path.display()))?;
            serde_json::from_str::<MapLayout>(&json)
                .with_context(|| format!("parsing map {}", path.display()))?
        }
        None => MapLayout::castle(),
    };
    info!(
        "seed {:?}, {} rooms, cell size {}",
        config.seed,
        layout.rooms.len(),
        config.cell_size
    );

    println!("=== Marauder Simulation Harness ===\n");

    let grid = build_grid(
        layout.world_width,
        layout.world_height,
        config.cell_size,
        &layout.rooms,
    );
    let mut results = Vec::new();

    // 1. Layout and doors
    results.extend(validate_layout(&layout, &grid, args.verbose));

    // 2. Schedule sweep
    results.extend(validate_schedules(&layout));

    // 3. Path search
    results.extend(validate_pathfinding(&layout, &grid, args.verbose));

    // 4. Footstep cadence
    results.extend(validate_footsteps(&layout, &grid, &config));

    // 5. End-to-end convergence
    results.extend(validate_convergence(&layout, &grid, &config));

    // 6. Engine run with save/load
    let engine = run_engine(&config, &layout, &args, &mut results)?;

    if let Some(path) = &args.dump_frame {
        if let Some(engine) = &engine {
            let json = engine.frame().to_json().context("serializing frame")?;
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("frame written to {}", path.display());
        }
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

// ── 1. Layout ───────────────────────────────────────────────────────────

fn validate_layout(layout: &MapLayout, grid: &Grid, verbose: bool) -> Vec<TestResult> {
    println!("--- Layout ---");
    let mut results = Vec::new();

    let problems = layout.validate();
    let errors: Vec<_> = problems
        .iter()
        .filter(|p| p.severity == Severity::Error)
        .collect();
    for p in problems.iter().filter(|p| p.severity == Severity::Warning) {
        warn!("[{}] {}", p.category, p.message);
    }
    results.push(TestResult::new(
        "layout_valid",
        errors.is_empty(),
        if errors.is_empty() {
            format!("{} rooms, {} warnings", layout.rooms.len(), problems.len())
        } else {
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        },
    ));

    results.push(TestResult::new(
        "grid_dimensions",
        grid.width() > 0 && grid.height() > 0,
        format!(
            "{}×{} cells, {} walkable",
            grid.width(),
            grid.height(),
            grid.walkable_count()
        ),
    ));

    for room in &layout.rooms {
        let doors = grid.door_cells(room);
        let open = doors.iter().filter(|d| grid.is_walkable(**d)).count();
        if verbose {
            println!("  {}: doors {:?}", room.id, doors);
        }
        results.push(TestResult::new(
            format!("doors_{}", room.id),
            open > 0,
            format!("{open} walkable door cells"),
        ));
    }

    if verbose {
        println!("{}", grid.render_ascii());
    }
    results
}

// ── 2. Schedules ────────────────────────────────────────────────────────

fn validate_schedules(layout: &MapLayout) -> Vec<TestResult> {
    println!("--- Schedules ---");
    let mut results = Vec::new();

    let boundaries = [
        (21.99, TimeBlock::Evening),
        (22.0, TimeBlock::Night),
        (5.99, TimeBlock::LateNight),
        (6.0, TimeBlock::Morning),
        (9.99, TimeBlock::Morning),
        (10.0, TimeBlock::Noon),
        (13.99, TimeBlock::Noon),
        (14.0, TimeBlock::Afternoon),
        (17.99, TimeBlock::Afternoon),
        (18.0, TimeBlock::Evening),
    ];
    let wrong: Vec<String> = boundaries
        .iter()
        .filter(|(hour, block)| TimeBlock::from_hour(*hour) != *block)
        .map(|(hour, block)| format!("{hour} → {:?}, want {block:?}", TimeBlock::from_hour(*hour)))
        .collect();
    results.push(TestResult::new(
        "block_boundaries",
        wrong.is_empty(),
        if wrong.is_empty() {
            format!("{} boundary hours", boundaries.len())
        } else {
            wrong.join("; ")
        },
    ));

    let rooms = layout.room_index();
    for &archetype in Archetype::all() {
        let missing: Vec<&str> = TimeBlock::all()
            .iter()
            .map(|b| resolve(archetype, b.start_hour()).room)
            .filter(|room| !rooms.contains_id(room))
            .collect();
        results.push(TestResult::new(
            format!("schedule_rooms_{archetype:?}").to_lowercase(),
            missing.is_empty(),
            if missing.is_empty() {
                "every block maps to a room on the map".to_string()
            } else {
                format!("missing rooms: {}", missing.join(", "))
            },
        ));
    }

    // Lookups are pure: sweeping the day twice gives identical answers.
    let sweep = || {
        (0..96)
            .map(|q| resolve(Archetype::Student, q as f32 * 0.25))
            .collect::<Vec<_>>()
    };
    results.push(TestResult::new(
        "schedule_deterministic",
        sweep() == sweep(),
        "quarter-hour sweep repeated",
    ));

    results
}

// ── 3. Path search ──────────────────────────────────────────────────────

fn corner_cuts(grid: &Grid, cells: &[CellPos]) -> usize {
    cells
        .windows(2)
        .filter(|w| {
            w[0].chebyshev(&w[1]) != 1
                || (w[0].x != w[1].x
                    && w[0].y != w[1].y
                    && !(grid.is_walkable(CellPos::new(w[1].x, w[0].y))
                        && grid.is_walkable(CellPos::new(w[0].x, w[1].y))))
        })
        .count()
}

fn validate_pathfinding(layout: &MapLayout, grid: &Grid, verbose: bool) -> Vec<TestResult> {
    println!("--- Path Search ---");
    let mut results = Vec::new();

    let mut failures = Vec::new();
    let mut longest = 0;
    for a in &layout.rooms {
        for b in &layout.rooms {
            match find_path(grid, a.center(), b.center()) {
                Ok(path) => {
                    let cells: Vec<CellPos> = path.iter().map(|p| grid.cell_of(*p)).collect();
                    let ends_ok = path
                        .first()
                        .zip(path.last())
                        .map(|(f, l)| {
                            f.distance(&a.center()) <= grid.cell_size()
                                && l.distance(&b.center()) <= grid.cell_size()
                        })
                        .unwrap_or(false);
                    if !ends_ok || corner_cuts(grid, &cells) > 0 {
                        failures.push(format!("{} → {}: bad path", a.id, b.id));
                    }
                    longest = longest.max(path.len());
                    if verbose && a.id < b.id {
                        println!("  {} → {}: {} waypoints", a.id, b.id, path.len());
                    }
                }
                Err(e) => failures.push(format!("{} → {}: {e}", a.id, b.id)),
            }
        }
    }
    results.push(TestResult::new(
        "room_pairs_connected",
        failures.is_empty(),
        if failures.is_empty() {
            format!(
                "{} pairs, longest {} waypoints",
                layout.rooms.len() * layout.rooms.len(),
                longest
            )
        } else {
            failures.join("; ")
        },
    ));

    // Corner-cutting fixture: the diagonal (0,0)→(1,1) squeezes past a wall.
    let mut fixture = Grid::open(3, 3, 10.0);
    fixture.set_walkable(CellPos::new(1, 0), false);
    let squeezed = find_cell_path(&fixture, CellPos::new(0, 0), CellPos::new(1, 1));
    results.push(TestResult::new(
        "no_corner_cutting",
        squeezed
            .as_ref()
            .map(|p| p.len() == 3 && corner_cuts(&fixture, p) == 0)
            .unwrap_or(false),
        format!("{squeezed:?}"),
    ));

    let off_map = find_path(grid, WorldPos::new(-50.0, 10.0), WorldPos::new(10.0, 10.0));
    results.push(TestResult::new(
        "out_of_bounds_rejected",
        matches!(off_map, Err(PathError::OutOfBounds { .. })),
        format!("{off_map:?}"),
    ));

    if let Some(room) = layout.rooms.first() {
        let wall = grid.cell_of(WorldPos::new(room.x + 1.0, room.y + 1.0));
        let blocked = find_cell_path(grid, CellPos::new(0, 0), wall);
        results.push(TestResult::new(
            "wall_goal_rejected",
            matches!(blocked, Err(PathError::GoalBlocked { .. })),
            format!("{blocked:?}"),
        ));
    }

    results
}

// ── 4. Footsteps ────────────────────────────────────────────────────────

fn validate_footsteps(layout: &MapLayout, grid: &Grid, config: &SimConfig) -> Vec<TestResult> {
    println!("--- Footsteps ---");
    let mut results = Vec::new();

    let rooms = layout.room_index();
    let mut nav = Navigator::new(grid.clone());
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));

    // Noon: students cross the map to their lesson.
    let hour = TimeBlock::Noon.start_hour() + 1.0;
    let entry = resolve(Archetype::Student, hour);
    let start = farthest_room_center(layout, entry.room);
    let mut walker = Character::new(0, "walker", Archetype::Student, start);
    let mut clock = SimClock::new(hour, 0.0);
    let mut steps = Vec::new();
    let window_ms = 3000.0;
    let mut walked_ms = 0.0;

    while clock.elapsed_ms < window_ms {
        clock.advance(16.0);
        let env = TickEnv {
            rooms: &rooms,
            time_of_day: clock.time_of_day,
            now_ms: clock.elapsed_ms,
            tuning: config.tuning(),
        };
        let out = advance_character(&walker, &env, &mut nav, &mut rng);
        if out.moved(&walker) {
            walked_ms = clock.elapsed_ms;
        }
        if let Some(step) = out.footstep {
            steps.push(step);
        }
        walker = out.character;
    }

    let expected = (walked_ms / config.footstep_spacing_ms).floor() as i64;
    let count = steps.len() as i64;
    results.push(TestResult::new(
        "footstep_cadence",
        (count - expected).abs() <= 1,
        format!("{count} footsteps in {walked_ms:.0} ms of walking, expected ~{expected}"),
    ));

    let alternates = steps.windows(2).all(|w| w[0].left != w[1].left);
    results.push(TestResult::new(
        "footstep_alternation",
        alternates,
        "left/right strictly alternate",
    ));

    let spaced = steps
        .windows(2)
        .all(|w| w[1].created_ms - w[0].created_ms > config.footstep_spacing_ms - 16.0);
    results.push(TestResult::new(
        "footstep_spacing",
        spaced,
        format!("> {} ms apart, less one tick", config.footstep_spacing_ms),
    ));

    results
}

fn farthest_room_center(layout: &MapLayout, from: &str) -> WorldPos {
    let anchor = layout
        .rooms
        .iter()
        .find(|r| r.id == from)
        .map(Room::center)
        .unwrap_or_default();
    layout
        .rooms
        .iter()
        .map(Room::center)
        .max_by(|a, b| a.distance(&anchor).total_cmp(&b.distance(&anchor)))
        .unwrap_or_default()
}

// ── 5. Convergence ──────────────────────────────────────────────────────

fn validate_convergence(layout: &MapLayout, grid: &Grid, config: &SimConfig) -> Vec<TestResult> {
    println!("--- Convergence ---");
    let mut results = Vec::new();

    let rooms = layout.room_index();
    let mut nav = Navigator::with_cache(grid.clone(), config.path_cache_capacity);
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(0));
    let max_ticks = 5000;

    for &archetype in Archetype::all() {
        for &block in TimeBlock::all() {
            let hour = block.start_hour() + 1.0;
            let entry = resolve(archetype, hour);
            let Some(room) = rooms.get(entry.room) else {
                continue;
            };
            let start = farthest_room_center(layout, entry.room);
            let mut c = Character::new(0, "walker", archetype, start);
            let mut settled_at = None;

            for tick in 0..max_ticks {
                let env = TickEnv {
                    rooms: &rooms,
                    time_of_day: hour,
                    now_ms: tick as f64 * 16.0,
                    tuning: config.tuning(),
                };
                c = advance_character(&c, &env, &mut nav, &mut rng).character;
                let settled = match entry.mode {
                    MovementMode::Walk | MovementMode::Wander => {
                        !c.has_path() && room.contains(c.position)
                    }
                    MovementMode::Sleep => c.position == room.center(),
                };
                if settled {
                    settled_at = Some(tick);
                    break;
                }
            }

            results.push(TestResult::new(
                format!("converge_{archetype:?}_{block:?}").to_lowercase(),
                settled_at.is_some(),
                match settled_at {
                    Some(t) => format!("{} ({:?}) in {t} ticks", entry.room, entry.mode),
                    None => format!("{} ({:?}) not reached, at {:?}", entry.room, entry.mode, c.position),
                },
            ));
        }
    }

    let (hits, misses) = nav.cache_stats();
    info!("convergence path cache: {hits} hits, {misses} misses");
    results
}

// ── 6. Engine ───────────────────────────────────────────────────────────

fn run_engine(
    config: &SimConfig,
    layout: &MapLayout,
    args: &Args,
    results: &mut Vec<TestResult>,
) -> Result<Option<SimulationEngine>> {
    println!("--- Engine ---");

    let mut engine = match SimulationEngine::new(config.clone(), layout.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            results.push(TestResult::new("engine_build", false, e.to_string()));
            return Ok(None);
        }
    };
    engine.spawn_cast(&default_cast());

    let mut moved = 0;
    let mut emitted = 0;
    let mut pruned = 0;
    let mut peak_trail = 0;
    for _ in 0..args.ticks {
        let summary = engine.tick(args.tick_ms);
        moved += summary.moved;
        emitted += summary.footsteps_emitted;
        pruned += summary.footsteps_pruned;
        peak_trail = peak_trail.max(engine.footsteps().len());
    }
    let clock = engine.clock();
    info!(
        "ran {} ticks: day {} {:.2}h, {} moves, {} footsteps (+{} -{}, peak {})",
        args.ticks,
        clock.day(),
        clock.time_of_day,
        moved,
        engine.footsteps().len(),
        emitted,
        pruned,
        peak_trail
    );

    results.push(TestResult::new(
        "engine_cast_moves",
        moved > 0 || args.ticks == 0,
        format!("{moved} character-moves over {} ticks", args.ticks),
    ));
    results.push(TestResult::new(
        "engine_trail_bounded",
        peak_trail <= config.max_footsteps,
        format!("peak {peak_trail} of {}", config.max_footsteps),
    ));

    let now = engine.clock().elapsed_ms;
    let stale = engine
        .footsteps()
        .iter()
        .filter(|s| now - s.created_ms > config.footstep_fade_ms)
        .count();
    results.push(TestResult::new(
        "engine_trail_pruned",
        stale == 0,
        format!("{stale} footsteps past their fade"),
    ));

    let mut buffer = Vec::new();
    engine.save(&mut buffer).context("saving engine snapshot")?;
    let restored = SimulationEngine::load(&buffer[..], layout.clone());
    results.push(TestResult::new(
        "engine_save_load",
        restored
            .as_ref()
            .map(|r| r.characters() == engine.characters() && r.clock() == engine.clock())
            .unwrap_or(false),
        match &restored {
            Ok(_) => format!("{} byte snapshot round-tripped", buffer.len()),
            Err(e) => e.to_string(),
        },
    ));

    Ok(Some(engine))
}
