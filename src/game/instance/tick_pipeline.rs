use tracing::{debug, warn};

use super::Simulation;
use crate::game::error::SimError;

/// Executes simulation phases for one tick, in a fixed order:
/// physics -> velocity reset -> input -> jump -> visual sync -> obstacles -> ground -> camera.
///
/// Vehicle phases are skipped while no vehicle is attached.
pub(super) fn run_tick_phases(sim: &mut Simulation, dt: f32) -> Result<(), SimError> {
    // Step physics simulation.
    sim.physics.step(dt);

    if sim.vehicle.is_none() {
        // Jump presses made before the vehicle exists are dropped, not queued.
        sim.input.consume_jump_edge();
        sim.obstacles.sync(&sim.physics);
        return Ok(());
    }

    // Recover from a blown-up step before anything reads the vehicle state.
    sim.check_vehicle_state()?;

    // Clear momentum and forces left from the previous tick.
    sim.reset_vehicle_velocities();

    // Drive force and heading change from held keys.
    sim.apply_vehicle_input();

    // Jump machine owns the height while airborne.
    sim.update_jump();

    // Copy the body transform into what gets drawn.
    sim.sync_vehicle_visual();

    sim.obstacles.sync(&sim.physics);

    sim.recenter_ground();

    sim.update_camera(dt);

    Ok(())
}

impl Simulation {
    fn check_vehicle_state(&mut self) -> Result<(), SimError> {
        let Some(vehicle) = self.vehicle.as_ref() else {
            return Ok(());
        };
        let position = self.physics.get_position(vehicle.body);
        let velocity = self.physics.get_velocity(vehicle.body);
        let finite = |v: Option<[f32; 3]>| v.map_or(true, |v| v.iter().all(|c| c.is_finite()));
        if finite(position) && finite(velocity) {
            return Ok(());
        }

        let body = vehicle.body;
        let restore = vehicle.last_good_position;
        warn!(?position, ?velocity, ?restore, "vehicle state went non-finite, restoring");
        self.physics.set_translation(body, restore);
        self.physics.set_velocity(body, [0.0, 0.0, 0.0]);
        self.physics.set_angular_velocity(body, [0.0, 0.0, 0.0]);
        self.physics.reset_forces(body);
        Err(SimError::NonFiniteState { what: "vehicle" })
    }

    fn reset_vehicle_velocities(&mut self) {
        if let Some(vehicle) = self.vehicle.as_ref() {
            self.controller.reset_velocities(&mut self.physics, vehicle);
        }
    }

    fn apply_vehicle_input(&mut self) {
        if let Some(vehicle) = self.vehicle.as_mut() {
            self.controller.apply_input(&self.input, &mut self.physics, vehicle);
        }
    }

    fn update_jump(&mut self) {
        let requested = self.input.consume_jump_edge();
        let Some(vehicle) = self.vehicle.as_ref() else {
            return;
        };
        let Some([x, y, z]) = self.physics.get_position(vehicle.body) else {
            return;
        };

        let update = self.jump.update(y, requested);
        if update.started {
            debug!(tick = self.tick, height = y, "jump started");
        }
        if update.landed {
            debug!(tick = self.tick, "jump landed");
        }

        if let Some(height) = update.height {
            self.physics.set_translation(vehicle.body, [x, height, z]);
            // The solver must not add its own vertical motion on top of the arc.
            let [vx, _, vz] = self.physics.get_velocity(vehicle.body).unwrap_or([0.0; 3]);
            self.physics.set_velocity(vehicle.body, [vx, 0.0, vz]);
        }
    }

    fn sync_vehicle_visual(&mut self) {
        if let Some(vehicle) = self.vehicle.as_mut() {
            vehicle.sync_visual(&self.physics);
            vehicle.last_good_position = vehicle.visual.position;
        }
    }

    fn recenter_ground(&mut self) {
        if let Some(vehicle) = self.vehicle.as_ref() {
            let shifts = self.ground.recenter(vehicle.visual.position);
            if shifts > 0 {
                debug!(tick = self.tick, shifts, "ground tiles recycled");
            }
        }
    }

    fn update_camera(&mut self, dt: f32) {
        if let Some(vehicle) = self.vehicle.as_ref() {
            self.camera.update(vehicle.visual.position, vehicle.heading, dt);
        }
    }
}
