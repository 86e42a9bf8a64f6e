//! Simulation tuning constants.
//! These are the defaults behind every `SimConfig` section.

/// Physics constants
pub mod physics {
    /// Rigid-body gravity in m/s² (magnitude, applied along -Y)
    pub const DEFAULT_GRAVITY: f32 = 9.81;

    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// Height of the physical ground plane
    pub const GROUND_PLANE_HEIGHT: f32 = -1.0;

    /// Friction used when no pair-specific material exists
    pub const DEFAULT_FRICTION: f32 = 0.1;

    /// Restitution used when no pair-specific material exists
    pub const DEFAULT_RESTITUTION: f32 = 0.3;

    /// Ground against obstacle contact
    pub const GROUND_OBSTACLE_FRICTION: f32 = 0.21;
    pub const GROUND_OBSTACLE_RESTITUTION: f32 = 0.02;

    /// Vehicle against obstacle contact (obstacles slide away instead of sticking)
    pub const VEHICLE_OBSTACLE_FRICTION: f32 = 0.000002;
    pub const VEHICLE_OBSTACLE_RESTITUTION: f32 = 0.003;
}

/// Vehicle body and driving defaults
pub mod vehicle {
    /// Spawn position of the vehicle body
    pub const SPAWN_POSITION: [f32; 3] = [0.0, 2.0, 0.0];

    /// Collision box half extents used when the model gives no bounding box
    pub const DEFAULT_HALF_EXTENTS: [f32; 3] = [2.0, 1.0, 4.0];

    pub const MASS: f32 = 1.0;
    pub const LINEAR_DAMPING: f32 = 0.5;
    pub const ANGULAR_DAMPING: f32 = 0.9;

    /// Drive speed constant
    pub const SPEED: f32 = 10.0;

    /// Gain applied to `SPEED` to get the drive force
    pub const FORCE_GAIN: f32 = 100.0;

    /// Heading change per tick while a turn key is held (radians)
    pub const TURN_RATE: f32 = 0.06;
}

/// Jump arc defaults, in per-tick units
pub mod jump {
    /// Initial vertical velocity of a jump
    pub const STRENGTH: f32 = 0.3;

    /// Vertical velocity change per tick while airborne
    pub const GRAVITY: f32 = -0.02;

    /// Gap kept between the vehicle's underside and the ground plane at rest
    pub const CLEARANCE: f32 = 0.0;
}

/// Infinite ground defaults
pub mod ground {
    /// Edge length of one ground tile
    pub const TILE_SIZE: f32 = 50.0;

    /// Tiles on each side of the center tile (1 gives a 3x3 lattice)
    pub const GRID_RADIUS: u32 = 1;

    /// Largest accepted radius (a 129x129 lattice)
    pub const MAX_GRID_RADIUS: u32 = 64;

    /// Height the visual tiles are placed at
    pub const TILE_HEIGHT: f32 = -1.0;
}

/// Obstacle field defaults
pub mod obstacles {
    pub const COUNT: usize = 10;

    /// Side of the square, centered at the origin, obstacles spawn in
    pub const SPAWN_RANGE: f32 = 300.0;

    /// Cube edge length
    pub const SIZE: f32 = 5.0;

    pub const MASS: f32 = 1.0;
}

/// Chase camera defaults
pub mod camera {
    pub const HEIGHT: f32 = 8.0;
    pub const FOLLOW_DISTANCE: f32 = 10.0;
}

/// Frame loop defaults
pub mod frame {
    /// Longest frame delta fed to the accumulator (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Upper bound on ticks executed for a single frame
    pub const MAX_TICKS_PER_FRAME: u32 = 5;

    /// Target render rate for the paced loop
    pub const TARGET_FPS: u32 = 60;

    /// Upper bound for the physics timestep and the frame delta clamp (seconds)
    pub const MAX_STEP_SECONDS: f32 = 1.0;

    /// Upper bound for the target render rate
    pub const MAX_TARGET_FPS: u32 = 1000;
}
