use serde::Serialize;

use super::Simulation;
use crate::game::camera::CameraState;
use crate::game::ground::GroundTile;
use crate::game::jump::JumpPhase;

#[derive(Debug, Clone, Serialize)]
pub struct VehicleSnapshot {
    pub position: [f32; 3],
    pub heading: f32,
    pub jump: JumpPhase,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObstacleSnapshot {
    pub id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

/// Everything a renderer needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub vehicle: Option<VehicleSnapshot>,
    pub obstacles: Vec<ObstacleSnapshot>,
    pub tiles: Vec<GroundTile>,
    pub camera: CameraState,
}

impl FrameSnapshot {
    pub(super) fn capture(sim: &Simulation) -> Self {
        let vehicle = sim.vehicle.as_ref().map(|v| VehicleSnapshot {
            position: v.visual.position,
            heading: v.visual.heading,
            jump: sim.jump.phase(),
        });

        let obstacles = sim
            .obstacles
            .obstacles()
            .iter()
            .map(|o| ObstacleSnapshot {
                id: o.id,
                position: o.visual.position,
                rotation: o.visual.rotation,
            })
            .collect();

        Self {
            tick: sim.tick,
            vehicle,
            obstacles,
            tiles: sim.ground.tiles().to_vec(),
            camera: sim.camera.state(),
        }
    }
}
