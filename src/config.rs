//! Simulation configuration parsing from drive.toml files

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::game::camera::CameraMode;
use crate::game::constants::{
    camera as camera_consts, frame as frame_consts, ground as ground_consts, jump as jump_consts,
    obstacles as obstacle_consts, physics as physics_consts, vehicle as vehicle_consts,
};
use crate::game::input::KeyBindings;

/// File name looked up by [`SimConfig::from_dir`]
pub const CONFIG_FILE_NAME: &str = "drive.toml";

/// Friction/restitution pair used for one kind of contact
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    pub friction: f32,
    pub restitution: f32,
}

impl MaterialConfig {
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self { friction, restitution }
    }
}

/// Rigid-body world section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity magnitude (m/s², applied along -Y)
    pub gravity: f32,
    /// Fixed simulation timestep in seconds
    pub timestep: f32,
    /// Height of the physical ground plane
    pub ground_height: f32,
    /// Material for every pair without a dedicated entry
    pub default_material: MaterialConfig,
    pub ground_obstacle: MaterialConfig,
    pub vehicle_obstacle: MaterialConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: physics_consts::DEFAULT_GRAVITY,
            timestep: physics_consts::TIMESTEP,
            ground_height: physics_consts::GROUND_PLANE_HEIGHT,
            default_material: MaterialConfig::new(
                physics_consts::DEFAULT_FRICTION,
                physics_consts::DEFAULT_RESTITUTION,
            ),
            ground_obstacle: MaterialConfig::new(
                physics_consts::GROUND_OBSTACLE_FRICTION,
                physics_consts::GROUND_OBSTACLE_RESTITUTION,
            ),
            vehicle_obstacle: MaterialConfig::new(
                physics_consts::VEHICLE_OBSTACLE_FRICTION,
                physics_consts::VEHICLE_OBSTACLE_RESTITUTION,
            ),
        }
    }
}

/// Vehicle body and driving section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub spawn: [f32; 3],
    /// Fallback collision half extents when the asset has no bounding box
    pub half_extents: [f32; 3],
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub speed: f32,
    pub force_gain: f32,
    /// Radians per tick
    pub turn_rate: f32,
}

impl VehicleConfig {
    /// Force magnitude applied while Forward or Backward is held
    pub fn drive_force(&self) -> f32 {
        self.speed * self.force_gain
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            spawn: vehicle_consts::SPAWN_POSITION,
            half_extents: vehicle_consts::DEFAULT_HALF_EXTENTS,
            mass: vehicle_consts::MASS,
            linear_damping: vehicle_consts::LINEAR_DAMPING,
            angular_damping: vehicle_consts::ANGULAR_DAMPING,
            speed: vehicle_consts::SPEED,
            force_gain: vehicle_consts::FORCE_GAIN,
            turn_rate: vehicle_consts::TURN_RATE,
        }
    }
}

/// Jump arc section (per-tick units)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    pub strength: f32,
    pub gravity: f32,
    /// Added to the resting height (plane height + vehicle half height)
    pub clearance: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            strength: jump_consts::STRENGTH,
            gravity: jump_consts::GRAVITY,
            clearance: jump_consts::CLEARANCE,
        }
    }
}

/// Infinite ground section
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub tile_size: f32,
    pub grid_radius: u32,
    pub tile_height: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            tile_size: ground_consts::TILE_SIZE,
            grid_radius: ground_consts::GRID_RADIUS,
            tile_height: ground_consts::TILE_HEIGHT,
        }
    }
}

/// Obstacle field section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub count: usize,
    pub spawn_range: f32,
    pub size: f32,
    pub mass: f32,
    /// Fixed seed for reproducible layouts; entropy when absent
    pub seed: Option<u64>,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: obstacle_consts::COUNT,
            spawn_range: obstacle_consts::SPAWN_RANGE,
            size: obstacle_consts::SIZE,
            mass: obstacle_consts::MASS,
            seed: None,
        }
    }
}

/// Chase camera section
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub height: f32,
    pub follow_distance: f32,
    pub mode: CameraMode,
    /// Exponential decay rate; `None` snaps to the target every tick
    pub smoothing: Option<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            height: camera_consts::HEIGHT,
            follow_distance: camera_consts::FOLLOW_DISTANCE,
            mode: CameraMode::Fixed,
            smoothing: None,
        }
    }
}

/// Frame pacing section
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLoopConfig {
    pub target_fps: u32,
    /// Seconds
    pub max_frame_delta: f32,
    pub max_ticks_per_frame: u32,
}

impl Default for FrameLoopConfig {
    fn default() -> Self {
        Self {
            target_fps: frame_consts::TARGET_FPS,
            max_frame_delta: frame_consts::MAX_FRAME_DELTA,
            max_ticks_per_frame: frame_consts::MAX_TICKS_PER_FRAME,
        }
    }
}

/// Full simulation configuration from drive.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub physics: PhysicsConfig,
    pub vehicle: VehicleConfig,
    pub jump: JumpConfig,
    pub ground: GroundConfig,
    pub obstacles: ObstacleConfig,
    pub camera: CameraConfig,
    pub keys: KeyBindings,
    #[serde(rename = "loop")]
    pub frame_loop: FrameLoopConfig,
}

impl SimConfig {
    /// Load simulation configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load simulation configuration from a directory
    /// Looks for drive.toml in the given directory
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Render the configuration back to TOML (used by `driftway init`)
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Rejects values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be a positive number, got {v}")))
            }
        };
        let finite = |name: &str, v: f32| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be finite, got {v}")))
            }
        };

        let at_most = |name: &str, v: f32, max: f32| {
            if v <= max {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be at most {max}, got {v}")))
            }
        };

        positive("physics.timestep", self.physics.timestep)?;
        at_most("physics.timestep", self.physics.timestep, frame_consts::MAX_STEP_SECONDS)?;
        finite("physics.gravity", self.physics.gravity)?;
        finite("physics.ground_height", self.physics.ground_height)?;
        for (name, m) in [
            ("physics.default_material", self.physics.default_material),
            ("physics.ground_obstacle", self.physics.ground_obstacle),
            ("physics.vehicle_obstacle", self.physics.vehicle_obstacle),
        ] {
            if !(m.friction.is_finite() && m.friction >= 0.0)
                || !(m.restitution.is_finite() && m.restitution >= 0.0)
            {
                return Err(ConfigError::Invalid(format!(
                    "{name} needs non-negative friction and restitution"
                )));
            }
        }

        positive("vehicle.mass", self.vehicle.mass)?;
        for (axis, v) in self.vehicle.half_extents.iter().enumerate() {
            positive(format!("vehicle.half_extents[{axis}]").as_str(), *v)?;
        }
        for (axis, v) in self.vehicle.spawn.iter().enumerate() {
            finite(format!("vehicle.spawn[{axis}]").as_str(), *v)?;
        }
        finite("vehicle.speed", self.vehicle.speed)?;
        finite("vehicle.force_gain", self.vehicle.force_gain)?;
        finite("vehicle.turn_rate", self.vehicle.turn_rate)?;

        positive("jump.strength", self.jump.strength)?;
        if !(self.jump.gravity.is_finite() && self.jump.gravity < 0.0) {
            return Err(ConfigError::Invalid(format!(
                "jump.gravity must be negative, got {}",
                self.jump.gravity
            )));
        }
        if !(self.jump.clearance.is_finite() && self.jump.clearance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "jump.clearance must be zero or positive, got {}",
                self.jump.clearance
            )));
        }

        positive("ground.tile_size", self.ground.tile_size)?;
        if self.ground.grid_radius > ground_consts::MAX_GRID_RADIUS {
            return Err(ConfigError::Invalid(format!(
                "ground.grid_radius must be at most {}, got {}",
                ground_consts::MAX_GRID_RADIUS,
                self.ground.grid_radius
            )));
        }

        positive("obstacles.spawn_range", self.obstacles.spawn_range)?;
        positive("obstacles.size", self.obstacles.size)?;
        positive("obstacles.mass", self.obstacles.mass)?;

        finite("camera.height", self.camera.height)?;
        finite("camera.follow_distance", self.camera.follow_distance)?;
        if let Some(rate) = self.camera.smoothing {
            positive("camera.smoothing", rate)?;
        }

        if self.frame_loop.target_fps == 0 || self.frame_loop.target_fps > frame_consts::MAX_TARGET_FPS {
            return Err(ConfigError::Invalid(format!(
                "loop.target_fps must be between 1 and {}, got {}",
                frame_consts::MAX_TARGET_FPS,
                self.frame_loop.target_fps
            )));
        }
        positive("loop.max_frame_delta", self.frame_loop.max_frame_delta)?;
        at_most(
            "loop.max_frame_delta",
            self.frame_loop.max_frame_delta,
            frame_consts::MAX_STEP_SECONDS,
        )?;

        Ok(())
    }
}

/// Errors that can occur when loading simulation configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("Failed to parse {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
