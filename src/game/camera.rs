use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraMode {
    /// World-aligned offset: always looks toward +Z from behind
    Fixed,
    /// Offset rotates with the vehicle heading
    Chase,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub position: [f32; 3],
    pub target: [f32; 3],
}

/// Chase camera derived from the vehicle transform.
/// Without smoothing the result is a pure function of the vehicle position.
#[derive(Debug, Clone)]
pub struct CameraFollow {
    config: CameraConfig,
    state: CameraState,
}

impl CameraFollow {
    pub fn new(config: CameraConfig) -> Self {
        // Looks at the origin before any vehicle exists.
        let state = Self::desired(&config, [0.0, 0.0, 0.0], 0.0);
        Self { config, state }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    fn desired(config: &CameraConfig, vehicle: [f32; 3], heading: f32) -> CameraState {
        let (dx, dz) = match config.mode {
            CameraMode::Fixed => (0.0, -config.follow_distance),
            CameraMode::Chase => (
                -heading.sin() * config.follow_distance,
                -heading.cos() * config.follow_distance,
            ),
        };
        CameraState {
            position: [vehicle[0] + dx, config.height, vehicle[2] + dz],
            target: vehicle,
        }
    }

    /// Places the camera for this tick. `dt` only matters when smoothing is on.
    pub fn update(&mut self, vehicle_position: [f32; 3], heading: f32, dt: f32) -> CameraState {
        let target = Self::desired(&self.config, vehicle_position, heading);
        self.state = match self.config.smoothing {
            None => target,
            Some(rate) => {
                let t = 1.0 - (-rate * dt).exp();
                let mut position = self.state.position;
                for (p, goal) in position.iter_mut().zip(target.position) {
                    *p += (goal - *p) * t;
                }
                CameraState { position, target: target.target }
            }
        };
        self.state
    }
}
