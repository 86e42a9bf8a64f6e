//! Driftway CLI - scaffold, validate and run driving simulations headlessly

use clap::{Parser, Subcommand};
use std::io::{BufRead, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use driftway::config::{SimConfig, CONFIG_FILE_NAME};
use driftway::game::input::InputEvent;
use driftway::game::instance::{FrameSnapshot, Simulation};
use driftway::game::vehicle::VehicleAsset;
use driftway::game::{GameLoop, RenderSink, ScriptedEvent, StopHandle};

/// Frames run by a non-realtime session when no limit is given
const DEFAULT_HEADLESS_FRAMES: u64 = 600;

#[derive(Parser)]
#[command(name = "driftway")]
#[command(about = "Endless-ground driving simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a drive.toml with every default spelled out
    Init {
        /// Directory to write into (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Parse and validate a config without running it
    Check {
        /// Config file or directory containing drive.toml
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Run the simulation and stream frame snapshots as JSON lines
    Run {
        /// Config file or directory containing drive.toml
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
        /// JSON array of {"frame", "key", "pressed"} events
        #[arg(long)]
        script: Option<PathBuf>,
        /// Pace to wall-clock time and read key events from stdin
        #[arg(long)]
        realtime: bool,
        /// Emit one snapshot every N frames (0 disables output)
        #[arg(long, default_value = "1")]
        snapshot_every: u64,
        /// Obstacle layout seed, overrides the config
        #[arg(long, env = "DRIFTWAY_SEED")]
        seed: Option<u64>,
        /// Vehicle model bounds as min_x,min_y,min_z,max_x,max_y,max_z
        #[arg(long, value_delimiter = ',', num_args = 6, allow_hyphen_values = true)]
        vehicle_bbox: Option<Vec<f32>>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { path } => init_config(&path),
        Commands::Check { path } => check_config(&path),
        Commands::Run {
            path,
            frames,
            script,
            realtime,
            snapshot_every,
            seed,
            vehicle_bbox,
        } => run_simulation(RunOptions {
            path,
            frames,
            script,
            realtime,
            snapshot_every,
            seed,
            vehicle_bbox,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// =============================================================================
// Config Commands
// =============================================================================

fn config_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}

fn init_config(dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
    let target = dir.join(CONFIG_FILE_NAME);
    if target.exists() {
        return Err(format!("{} already exists", target.display()));
    }

    let contents = SimConfig::default().to_toml_string().map_err(|e| e.to_string())?;
    std::fs::write(&target, contents).map_err(|e| format!("Failed to write {}: {}", target.display(), e))?;

    println!("Created {}", target.display());
    println!();
    println!("Next steps:");
    println!("  driftway run {} --frames 600", dir.display());
    Ok(())
}

fn check_config(path: &Path) -> Result<(), String> {
    let file = config_path(path);
    let config = SimConfig::from_file(&file).map_err(|e| e.to_string())?;

    println!("{} is valid", file.display());
    println!(
        "  timestep {:.4}s, gravity {}, {} obstacles, {}x{} ground tiles of {}",
        config.physics.timestep,
        config.physics.gravity,
        config.obstacles.count,
        2 * config.ground.grid_radius + 1,
        2 * config.ground.grid_radius + 1,
        config.ground.tile_size,
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<SimConfig, String> {
    let file = config_path(path);
    if !file.exists() && path.is_dir() {
        warn!(path = %file.display(), "no config found, using defaults");
        return Ok(SimConfig::default());
    }
    SimConfig::from_file(&file).map_err(|e| e.to_string())
}

// =============================================================================
// Run Command
// =============================================================================

struct RunOptions {
    path: PathBuf,
    frames: Option<u64>,
    script: Option<PathBuf>,
    realtime: bool,
    snapshot_every: u64,
    seed: Option<u64>,
    vehicle_bbox: Option<Vec<f32>>,
}

/// Writes every Nth frame to stdout as one JSON object per line.
struct JsonLinesSink {
    out: BufWriter<Stdout>,
    every: u64,
    seen: u64,
    failed: bool,
}

impl JsonLinesSink {
    fn new(every: u64) -> Self {
        Self {
            out: BufWriter::new(std::io::stdout()),
            every,
            seen: 0,
            failed: false,
        }
    }

    fn write_frame(&mut self, frame: &FrameSnapshot) -> Result<(), String> {
        serde_json::to_writer(&mut self.out, frame).map_err(|e| e.to_string())?;
        self.out.write_all(b"\n").map_err(|e| e.to_string())
    }
}

impl RenderSink for JsonLinesSink {
    fn present(&mut self, frame: &FrameSnapshot) {
        let index = self.seen;
        self.seen += 1;
        if self.failed || self.every == 0 || index % self.every != 0 {
            return;
        }
        if let Err(e) = self.write_frame(frame) {
            // Usually a closed pipe; keep simulating, stop writing.
            warn!(error = %e, "snapshot output failed, disabling it");
            self.failed = true;
        }
    }

    fn release(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "failed to flush snapshot output");
        }
    }
}

fn load_script(path: &Path) -> Result<Vec<ScriptedEvent>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid script {}: {}", path.display(), e))
}

/// Ctrl-C flips the stop flag. The runtime lives on its own thread so the game loop stays synchronous.
fn spawn_ctrl_c_watcher(stop: StopHandle) -> Result<(), String> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;
    thread::spawn(move || {
        rt.block_on(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received, stopping");
                stop.stop();
            }
        });
    });
    Ok(())
}

/// Forwards JSON key events from stdin, one per line, until EOF.
fn spawn_stdin_reader(input: crossbeam_channel::Sender<InputEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<InputEvent>(&line) {
                Ok(event) => {
                    if input.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, line = %line, "ignoring malformed input event"),
            }
        }
    });
}

/// Collision box for the vehicle: the given model bounds, or the configured half extents.
fn vehicle_asset(bbox: Option<&[f32]>, config: &SimConfig) -> Result<VehicleAsset, String> {
    match bbox {
        None => Ok(VehicleAsset::from_config(&config.vehicle)),
        Some(&[min_x, min_y, min_z, max_x, max_y, max_z]) => {
            VehicleAsset::from_bounding_box([min_x, min_y, min_z], [max_x, max_y, max_z])
                .map_err(|e| e.to_string())
        }
        Some(values) => Err(format!("--vehicle-bbox needs 6 values, got {}", values.len())),
    }
}

fn run_simulation(options: RunOptions) -> Result<(), String> {
    let mut config = load_config(&options.path)?;
    if options.seed.is_some() {
        config.obstacles.seed = options.seed;
    }

    let asset = vehicle_asset(options.vehicle_bbox.as_deref(), &config)?;
    let mut simulation = Simulation::new(config).map_err(|e| e.to_string())?;
    simulation.attach_vehicle(asset);

    let sink = JsonLinesSink::new(options.snapshot_every);
    let (mut game_loop, input) = GameLoop::new(simulation, sink);
    game_loop = game_loop.realtime(options.realtime);

    if let Some(script) = &options.script {
        game_loop = game_loop.with_script(load_script(script)?);
    }

    match (options.frames, options.realtime) {
        (Some(frames), _) => game_loop = game_loop.with_frame_limit(frames),
        (None, false) => game_loop = game_loop.with_frame_limit(DEFAULT_HEADLESS_FRAMES),
        (None, true) => {}
    }

    spawn_ctrl_c_watcher(game_loop.stop_handle())?;
    if options.realtime {
        spawn_stdin_reader(input);
    } else {
        drop(input);
    }

    let summary = game_loop.run();
    eprintln!(
        "Ran {} frames ({} ticks, {} failed ticks, {} skipped frames)",
        summary.frames, summary.ticks, summary.failed_ticks, summary.skipped_frames
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(args: &[&str]) -> Option<Vec<f32>> {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Run { vehicle_bbox, .. } => vehicle_bbox,
            _ => panic!("expected the run command"),
        }
    }

    #[test]
    fn vehicle_bbox_parses_negative_bounds() {
        let bbox = run_args(&["driftway", "run", "--vehicle-bbox", "-1,-0.5,-2,1,0.5,2"]).unwrap();
        let asset = vehicle_asset(Some(&bbox), &SimConfig::default()).unwrap();
        assert_eq!(asset.half_extents, [1.0, 0.5, 2.0]);
    }

    #[test]
    fn missing_bbox_uses_configured_extents() {
        assert!(run_args(&["driftway", "run"]).is_none());
        let config = SimConfig::default();
        let asset = vehicle_asset(None, &config).unwrap();
        assert_eq!(asset.half_extents, config.vehicle.half_extents);
    }

    #[test]
    fn degenerate_bbox_is_an_error() {
        let flat = [0.0, 0.0, 0.0, 1.0, 0.0, 1.0];
        assert!(vehicle_asset(Some(&flat), &SimConfig::default()).is_err());
        assert!(vehicle_asset(Some(&[1.0, 2.0]), &SimConfig::default()).is_err());
        assert!(Cli::try_parse_from(["driftway", "run", "--vehicle-bbox", "1,2,3"]).is_err());
    }
}
