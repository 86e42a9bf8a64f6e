use rand::Rng;
use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;

use super::physics::PhysicsWorld;
use crate::config::ObstacleConfig;

/// Visual transform of an obstacle, copied from its body every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObstacleVisual {
    pub position: [f32; 3],
    /// Quaternion [x, y, z, w]
    pub rotation: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: u32,
    pub spawn_position: [f32; 3],
    pub body: RigidBodyHandle,
    pub visual: ObstacleVisual,
}

/// Passive obstacle bodies scattered once at startup.
/// They never follow ground recycling, so they stay inside the spawn square.
#[derive(Debug, Clone, Default)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    /// Samples `count` positions uniformly in the spawn square and adds a body for each.
    pub fn spawn<R: Rng>(physics: &mut PhysicsWorld, config: &ObstacleConfig, rng: &mut R) -> Self {
        let half_range = config.spawn_range / 2.0;
        let height = config.size / 2.0;

        let obstacles = (0..config.count)
            .map(|i| {
                let position = [
                    rng.gen_range(-half_range..half_range),
                    height,
                    rng.gen_range(-half_range..half_range),
                ];
                let body = physics.add_obstacle(position, config.size, config.mass);
                Obstacle {
                    id: i as u32,
                    spawn_position: position,
                    body,
                    visual: ObstacleVisual { position, rotation: [0.0, 0.0, 0.0, 1.0] },
                }
            })
            .collect();

        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    /// Copies every body transform into its visual. Physics is authoritative.
    pub fn sync(&mut self, physics: &PhysicsWorld) {
        for obstacle in &mut self.obstacles {
            if let Some(position) = physics.get_position(obstacle.body) {
                obstacle.visual.position = position;
            }
            if let Some(rotation) = physics.get_rotation(obstacle.body) {
                obstacle.visual.rotation = rotation;
            }
        }
    }

    /// Forgets every obstacle (their bodies are released with the world).
    pub fn clear(&mut self) {
        self.obstacles.clear();
    }
}
