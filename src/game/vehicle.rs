use rapier3d::prelude::RigidBodyHandle;
use serde::Serialize;

use super::error::SimError;
use super::input::InputState;
use super::physics::PhysicsWorld;
use crate::config::VehicleConfig;

/// Physical description of a loaded vehicle model, handed over by the asset loader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleAsset {
    pub half_extents: [f32; 3],
}

impl VehicleAsset {
    /// Builds the collision box from the model's axis-aligned bounding box.
    pub fn from_bounding_box(min: [f32; 3], max: [f32; 3]) -> Result<Self, SimError> {
        let mut half_extents = [0.0; 3];
        for axis in 0..3 {
            let half = (max[axis] - min[axis]) / 2.0;
            if !half.is_finite() || half <= 0.0 {
                return Err(SimError::InvalidAsset(format!(
                    "bounding box is empty along axis {axis} (min {:?}, max {:?})",
                    min, max
                )));
            }
            half_extents[axis] = half;
        }
        Ok(Self { half_extents })
    }

    /// Fallback box used when the model carries no usable bounds
    pub fn from_config(config: &VehicleConfig) -> Self {
        Self { half_extents: config.half_extents }
    }
}

/// Transform the renderer draws for the vehicle. Mirrors the body, never the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VehicleVisual {
    pub position: [f32; 3],
    pub heading: f32,
}

/// The live vehicle: its rigid body handle plus the kinematic heading.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub body: RigidBodyHandle,
    pub heading: f32,
    pub visual: VehicleVisual,
    /// Last transform known to be finite, used to recover from a bad step
    pub last_good_position: [f32; 3],
}

impl Vehicle {
    pub fn spawn(physics: &mut PhysicsWorld, config: &VehicleConfig, asset: VehicleAsset) -> Self {
        let body = physics.add_vehicle(
            config.spawn,
            asset.half_extents,
            config.mass,
            config.linear_damping,
            config.angular_damping,
        );
        Self {
            body,
            heading: 0.0,
            visual: VehicleVisual { position: config.spawn, heading: 0.0 },
            last_good_position: config.spawn,
        }
    }

    /// Copies the body transform into the visual transform
    pub fn sync_visual(&mut self, physics: &PhysicsWorld) {
        if let Some(position) = physics.get_position(self.body) {
            self.visual.position = position;
        }
        self.visual.heading = self.heading;
    }
}

/// Unit vector the vehicle drives along for a heading (rotation about +Y, 0 faces +Z).
pub fn forward_vector(heading: f32) -> [f32; 3] {
    [heading.sin(), 0.0, heading.cos()]
}

/// Maps held input to a drive force and a kinematic heading change.
#[derive(Debug, Clone, Copy)]
pub struct VehicleController {
    pub drive_force: f32,
    pub turn_rate: f32,
}

impl VehicleController {
    pub fn from_config(config: &VehicleConfig) -> Self {
        Self {
            drive_force: config.drive_force(),
            turn_rate: config.turn_rate,
        }
    }

    /// Drops horizontal and angular momentum left over from the last step.
    /// Vertical velocity is kept so gravity and landings still work.
    /// The force accumulator is cleared too, so only this tick's input drives the next step.
    pub fn reset_velocities(&self, physics: &mut PhysicsWorld, vehicle: &Vehicle) {
        let vertical = physics
            .get_velocity(vehicle.body)
            .map(|v| v[1])
            .unwrap_or(0.0);
        physics.set_velocity(vehicle.body, [0.0, vertical, 0.0]);
        physics.set_angular_velocity(vehicle.body, [0.0, 0.0, 0.0]);
        physics.reset_forces(vehicle.body);
    }

    /// Applies this tick's input: drive force along the current heading, then the turn.
    pub fn apply_input(&self, input: &InputState, physics: &mut PhysicsWorld, vehicle: &mut Vehicle) {
        let throttle = input.throttle();
        if throttle != 0.0 {
            let [fx, fy, fz] = forward_vector(vehicle.heading);
            let magnitude = throttle * self.drive_force;
            physics.add_force(vehicle.body, [fx * magnitude, fy * magnitude, fz * magnitude]);
        }

        vehicle.heading += input.steering() * self.turn_rate;
        physics.set_heading(vehicle.body, vehicle.heading);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::game::constants::physics as consts;
    use crate::game::input::Action;

    fn setup() -> (PhysicsWorld, Vehicle, VehicleController) {
        let mut physics = PhysicsWorld::new(&PhysicsConfig {
            gravity: 0.0,
            ..PhysicsConfig::default()
        });
        let config = VehicleConfig {
            spawn: [0.0, 0.0, 0.0],
            ..VehicleConfig::default()
        };
        let vehicle = Vehicle::spawn(&mut physics, &config, VehicleAsset::from_config(&config));
        (physics, vehicle, VehicleController::from_config(&config))
    }

    #[test]
    fn bounding_box_becomes_half_extents() {
        let asset = VehicleAsset::from_bounding_box([-2.0, 0.0, -4.0], [2.0, 2.0, 4.0]).unwrap();
        assert_eq!(asset.half_extents, [2.0, 1.0, 4.0]);

        let err = VehicleAsset::from_bounding_box([0.0, 0.0, 0.0], [1.0, 0.0, 1.0]);
        assert!(matches!(err, Err(SimError::InvalidAsset(_))));
    }

    #[test]
    fn reset_keeps_only_vertical_velocity() {
        let (mut physics, vehicle, controller) = setup();
        physics.set_velocity(vehicle.body, [5.0, 2.0, -3.0]);
        physics.set_angular_velocity(vehicle.body, [1.0, 1.0, 1.0]);

        controller.reset_velocities(&mut physics, &vehicle);

        assert_eq!(physics.get_velocity(vehicle.body).unwrap(), [0.0, 2.0, 0.0]);
        assert_eq!(physics.get_angular_velocity(vehicle.body).unwrap(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn forward_drives_along_heading() {
        let (mut physics, mut vehicle, controller) = setup();
        let mut input = InputState::new();
        input.set_pressed(Action::Forward, true);

        controller.apply_input(&input, &mut physics, &mut vehicle);
        physics.step(consts::TIMESTEP);

        let vel = physics.get_velocity(vehicle.body).unwrap();
        assert!(vel[2] > 10.0, "expected strong +Z velocity, got {:?}", vel);
        assert!(vel[0].abs() < 1e-4);
    }

    #[test]
    fn backward_is_symmetric_to_forward() {
        let (mut physics, mut vehicle, controller) = setup();
        let mut input = InputState::new();
        input.set_pressed(Action::Forward, true);
        controller.apply_input(&input, &mut physics, &mut vehicle);
        physics.step(consts::TIMESTEP);
        let forward = physics.get_velocity(vehicle.body).unwrap()[2];

        let (mut physics, mut vehicle, controller) = setup();
        let mut input = InputState::new();
        input.set_pressed(Action::Backward, true);
        controller.apply_input(&input, &mut physics, &mut vehicle);
        physics.step(consts::TIMESTEP);
        let backward = physics.get_velocity(vehicle.body).unwrap()[2];

        assert!((forward + backward).abs() < 1e-4);
    }

    #[test]
    fn turning_is_a_fixed_step_per_tick() {
        let (mut physics, mut vehicle, controller) = setup();
        let mut input = InputState::new();
        input.set_pressed(Action::TurnLeft, true);
        for _ in 0..3 {
            controller.apply_input(&input, &mut physics, &mut vehicle);
        }
        assert!((vehicle.heading - 0.18).abs() < 1e-6);

        input.set_pressed(Action::TurnLeft, false);
        input.set_pressed(Action::TurnRight, true);
        controller.apply_input(&input, &mut physics, &mut vehicle);
        assert!((vehicle.heading - 0.12).abs() < 1e-6);
    }

    #[test]
    fn reset_clears_force_accumulator() {
        let (mut physics, mut vehicle, controller) = setup();
        let mut input = InputState::new();
        input.set_pressed(Action::Forward, true);
        controller.apply_input(&input, &mut physics, &mut vehicle);

        controller.reset_velocities(&mut physics, &vehicle);
        physics.step(consts::TIMESTEP);

        assert_eq!(physics.get_velocity(vehicle.body).unwrap(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn forward_vector_follows_heading() {
        let v = forward_vector(std::f32::consts::FRAC_PI_2);
        assert!((v[0] - 1.0).abs() < 1e-6);
        assert!(v[2].abs() < 1e-6);
    }
}
