mod snapshot;
mod tick_pipeline;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{debug, info, warn};

pub use snapshot::{FrameSnapshot, ObstacleSnapshot, VehicleSnapshot};

use super::camera::CameraFollow;
use super::error::SimError;
use super::ground::GroundTiler;
use super::input::{InputEvent, InputState};
use super::jump::{rest_height, JumpStateMachine};
use super::obstacles::ObstacleField;
use super::physics::PhysicsWorld;
use super::timestep::{FixedTimestep, StepPlan};
use super::vehicle::{Vehicle, VehicleAsset, VehicleController};
use crate::config::SimConfig;

/// What one call to [`Simulation::advance`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub ticks_run: u32,
    /// Ticks that hit a non-finite vehicle state and were cut short
    pub failed_ticks: u32,
    pub dropped_backlog: Duration,
    /// The frame time itself was unusable and nothing ran
    pub skipped: bool,
}

/// The driving simulation: exclusive owner of the physics world and every
/// component layered on it. All mutation happens through `tick`.
pub struct Simulation {
    pub config: SimConfig,
    pub physics: PhysicsWorld,
    pub input: InputState,
    /// Absent until the vehicle model has loaded
    pub vehicle: Option<Vehicle>,
    pub controller: VehicleController,
    pub jump: JumpStateMachine,
    pub ground: GroundTiler,
    pub obstacles: ObstacleField,
    pub camera: CameraFollow,
    pub timestep: FixedTimestep,
    pub tick: u64,
    torn_down: bool,
}

impl Simulation {
    /// Builds the world, ground and obstacle field. The vehicle is attached later.
    /// Obstacles use `obstacles.seed` when set, entropy otherwise.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let mut rng = match config.obstacles.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new_with_rng(config, &mut rng)
    }

    pub fn new_with_rng(config: SimConfig, rng: &mut StdRng) -> Result<Self, SimError> {
        config.validate()?;

        let timestep = FixedTimestep::new(config.physics.timestep, &config.frame_loop)?;
        let mut physics = PhysicsWorld::new(&config.physics);
        physics.add_ground_plane(config.physics.ground_height);
        let obstacles = ObstacleField::spawn(&mut physics, &config.obstacles, rng);

        info!(
            obstacles = obstacles.len(),
            tile_size = config.ground.tile_size,
            timestep = config.physics.timestep,
            "simulation created"
        );

        // Replaced once the real asset is attached and its height is known.
        let rest = rest_height(
            config.physics.ground_height,
            config.vehicle.half_extents[1],
            &config.jump,
        );

        Ok(Self {
            controller: VehicleController::from_config(&config.vehicle),
            jump: JumpStateMachine::new(config.jump, rest),
            ground: GroundTiler::new(&config.ground),
            camera: CameraFollow::new(config.camera),
            timestep,
            input: InputState::new(),
            vehicle: None,
            physics,
            obstacles,
            config,
            tick: 0,
            torn_down: false,
        })
    }

    /// Called by the asset loader once the vehicle model is available.
    /// Returns false when a vehicle is already attached (the new asset is ignored).
    pub fn attach_vehicle(&mut self, asset: VehicleAsset) -> bool {
        if self.vehicle.is_some() {
            warn!("vehicle already attached, ignoring new asset");
            return false;
        }
        let vehicle = Vehicle::spawn(&mut self.physics, &self.config.vehicle, asset);
        let rest = rest_height(
            self.config.physics.ground_height,
            asset.half_extents[1],
            &self.config.jump,
        );
        self.jump = JumpStateMachine::new(self.config.jump, rest);
        info!(
            half_extents = ?asset.half_extents,
            spawn = ?self.config.vehicle.spawn,
            rest_height = rest,
            "vehicle attached"
        );
        self.vehicle = Some(vehicle);
        true
    }

    pub fn has_vehicle(&self) -> bool {
        self.vehicle.is_some()
    }

    /// Applies a raw key transition. Unbound keys are ignored.
    pub fn handle_key(&mut self, key: &str, pressed: bool) -> bool {
        self.input.apply_key(&self.config.keys, key, pressed)
    }

    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.input.apply_event(&self.config.keys, event)
    }

    /// Runs one fixed tick of the ordered pipeline.
    pub fn tick(&mut self) -> Result<(), SimError> {
        let dt = self.timestep.fixed_dt();
        self.tick += 1;
        tick_pipeline::run_tick_phases(self, dt)
    }

    /// Feeds one rendered frame's elapsed time and runs the ticks it pays for.
    /// Failures are logged and skipped; they never stop the loop.
    pub fn advance(&mut self, frame_elapsed: f32) -> FrameReport {
        match self.timestep.plan(frame_elapsed) {
            Ok(plan) => self.run_plan(plan),
            Err(e) => {
                warn!(error = %e, "skipping frame");
                FrameReport { skipped: true, ..FrameReport::default() }
            }
        }
    }

    /// [`advance`](Self::advance) for an exact frame length, used by virtual frames.
    pub fn advance_duration(&mut self, frame_elapsed: Duration) -> FrameReport {
        let plan = self.timestep.plan_duration(frame_elapsed);
        self.run_plan(plan)
    }

    fn run_plan(&mut self, plan: StepPlan) -> FrameReport {
        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_ms = plan.dropped_backlog.as_secs_f32() * 1000.0,
                "simulation fell behind, dropping backlog"
            );
        }

        let mut report = FrameReport {
            dropped_backlog: plan.dropped_backlog,
            ..FrameReport::default()
        };
        for _ in 0..plan.ticks_to_run {
            report.ticks_run += 1;
            if let Err(e) = self.tick() {
                warn!(tick = self.tick, error = %e, "tick skipped");
                report.failed_ticks += 1;
            }
        }
        report
    }

    /// Final transforms for the renderer.
    pub fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot::capture(self)
    }

    /// Releases every body and forgets the vehicle and obstacles. Safe to call twice.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let released = self.physics.teardown();
        self.obstacles.clear();
        self.vehicle = None;
        self.input.clear();
        self.timestep.reset();
        info!(bodies = released, ticks = self.tick, "simulation torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if !self.torn_down {
            debug!("simulation dropped without explicit teardown");
            self.teardown();
        }
    }
}
