//! maze-sim-app - micromouse maze simulator
//!
//! Wires the simulator together and runs one demo algorithm:
//! - physics thread (`physics`): fixed-rate pose integration
//! - algorithm thread (`algorithm`): drives the mouse through the control interface
//! - main thread: replays scripted user requests and logs text snapshots
//!
//! # Usage
//!
//! ```bash
//! # With default config (or ./maze-sim.json when present)
//! cargo run -p maze-sim-app
//!
//! # With a custom config file
//! cargo run -p maze-sim-app -- --config my-maze.json
//! ```

mod algorithms;
mod config;
mod render;

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use control::{ControlInterface, run_algorithm};
use mechanics::{CellGeometry, Maze, PhysicsEngine, Robot, lock_read};
use simcore::{Clock, SharedControlState, Shutdown};
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use crate::algorithms::build_algorithm;
use crate::config::{AppConfig, AppError, DEFAULT_CONFIG_PATH, RequestKind, ScriptedRequest};
use crate::render::TextRenderer;

// ============================================================================
// Command Line
// ============================================================================

struct Args {
    config_path: Option<String>,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut result = Args { config_path: None };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    result.config_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    result
}

fn print_help() {
    println!("maze-sim-app - micromouse maze simulator");
    println!();
    println!("USAGE:");
    println!("    maze-sim-app [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>     JSON configuration file (default: {})", DEFAULT_CONFIG_PATH);
    println!("    -h, --help              Print help information");
    println!();
    println!("CONFIGURATION:");
    println!("    - sim: frame rate, maze dimensions in meters, drive, sensors");
    println!("    - maze: width, height and interior walls");
    println!("    - algorithm: wall_follower (discrete) or range_cruiser (continuous)");
    println!("    - requests: timed undo/reset/pause/resume requests");
}

/// Explicit path first, then the default file if it exists, then defaults.
fn load_config(args: &Args) -> Result<(AppConfig, Option<String>), AppError> {
    match &args.config_path {
        Some(path) => Ok((AppConfig::from_file(path)?, Some(path.clone()))),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Ok((
            AppConfig::from_file(DEFAULT_CONFIG_PATH)?,
            Some(DEFAULT_CONFIG_PATH.to_string()),
        )),
        None => Ok((AppConfig::default(), None)),
    }
}

fn init_logging(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_thread_level(LevelFilter::Debug)
        .build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

/// Ctrl-C handler body: wakes every pacing wait so threads unwind and join.
fn on_interrupt(shutdown: Shutdown) -> impl Fn() + Send + 'static {
    move || {
        log::info!("Received shutdown signal");
        shutdown.trigger();
    }
}

// ============================================================================
// Scripted Input
// ============================================================================

/// Replays configured requests into the shared control state, each once.
struct ScriptedInput {
    pending: Vec<ScriptedRequest>,
}

impl ScriptedInput {
    fn new(mut requests: Vec<ScriptedRequest>) -> Self {
        // Latest first, so due requests pop off the end
        requests.sort_by(|a, b| b.at_ms.cmp(&a.at_ms));
        ScriptedInput { pending: requests }
    }

    fn apply(&mut self, elapsed: Duration, control: &SharedControlState) {
        let now_ms = elapsed.as_millis() as u64;
        while self.pending.last().is_some_and(|r| r.at_ms <= now_ms) {
            let Some(request) = self.pending.pop() else {
                break;
            };
            log::info!("input: {:?} at {} ms", request.kind, request.at_ms);
            match request.kind {
                RequestKind::Undo => control.request_undo(),
                RequestKind::Reset => control.request_reset(),
                RequestKind::Pause => control.set_paused(true),
                RequestKind::Resume => control.set_paused(false),
            }
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = parse_args();
    let loaded = load_config(&args);

    let level = loaded
        .as_ref()
        .ok()
        .and_then(|(config, _)| config.log_level().ok())
        .unwrap_or(LevelFilter::Info);
    init_logging(level);

    let config = match loaded {
        Ok((config, Some(path))) => {
            log::info!("Loaded config from {}", path);
            config
        }
        Ok((config, None)) => {
            log::info!("Using default configuration");
            config
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
    log::info!("maze-sim-app shutdown complete");
}

fn run(config: &AppConfig) -> Result<(), AppError> {
    config.validate()?;
    let limit = config.run_limit()?;

    let clock = Arc::new(Clock::new());
    let control = Arc::new(SharedControlState::new(clock.run_id()));
    let shutdown = Shutdown::new();
    if let Err(e) = ctrlc::set_handler(on_interrupt(shutdown.clone())) {
        log::warn!("Failed to set Ctrl-C handler: {}", e);
    }
    log::info!("maze-sim-app starting, run {}", control.run_id());
    log::info!(
        "  Maze: {}x{} cells, {} interior walls",
        config.maze.width,
        config.maze.height,
        config.maze.walls.len()
    );
    log::info!("  Algorithm: {:?}", config.algorithm.kind);

    // 1. Maze, robot and physics
    let maze: Arc<dyn Maze> = Arc::new(config.maze.build());
    let robot = Robot::from_config(&config.sim, Arc::clone(&maze));
    let mut engine = PhysicsEngine::new(
        config.sim.clone(),
        robot,
        Arc::clone(&control),
        Arc::clone(&clock),
        shutdown.clone(),
    );
    engine.start()?;
    let robot = engine.robot();

    // 2. Algorithm thread
    let mouse = ControlInterface::new(
        &config.sim,
        engine.robot(),
        Arc::clone(&control),
        Arc::clone(&clock),
        shutdown.clone(),
    );
    let mut algorithm = build_algorithm(&config.algorithm);
    let handle = thread::Builder::new()
        .name("algorithm".into())
        .spawn(move || run_algorithm(algorithm.as_mut(), &mouse))
        .map_err(AppError::Spawn)?;

    // 3. Render loop on the main thread
    let renderer = TextRenderer::new(Arc::clone(&maze), CellGeometry::from_config(&config.sim));
    let mut input = ScriptedInput::new(config.requests.clone());
    let interval = Duration::from_millis(config.render_interval_ms.max(1));

    while !handle.is_finished() {
        input.apply(clock.elapsed(), &control);

        let snapshot = lock_read(&robot).snapshot();
        log::info!("{}", renderer.status_line(&snapshot, clock.elapsed().as_secs_f64()));
        log::debug!("\n{}", renderer.render(&snapshot));

        if limit.is_some_and(|limit| clock.elapsed() >= limit) {
            log::warn!("run time limit reached, shutting down");
            shutdown.trigger();
        }
        if !shutdown.sleep(interval) {
            break;
        }
    }

    let result = handle.join();
    engine.stop();

    let snapshot = lock_read(&robot).snapshot();
    log::info!("final state:\n{}", renderer.render(&snapshot));

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) if e.is_interrupted() => {
            log::info!("algorithm interrupted by shutdown");
            Ok(())
        }
        Ok(Err(e)) => Err(AppError::Algorithm(e)),
        Err(_) => Err(AppError::AlgorithmPanicked),
    }
}
