use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;

use crate::config::{MaterialConfig, PhysicsConfig};

/// What a body represents in the driving scene.
/// Stored in each collider's `user_data` so contact hooks can pick a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Ground,
    Vehicle,
    Obstacle,
}

impl BodyKind {
    fn tag(self) -> u128 {
        match self {
            BodyKind::Ground => 1,
            BodyKind::Vehicle => 2,
            BodyKind::Obstacle => 3,
        }
    }

    fn from_tag(tag: u128) -> Option<Self> {
        match tag {
            1 => Some(BodyKind::Ground),
            2 => Some(BodyKind::Vehicle),
            3 => Some(BodyKind::Obstacle),
            _ => None,
        }
    }
}

/// Friction/restitution per pair of body kinds, applied to every solver contact.
#[derive(Debug, Clone, Copy)]
pub struct ContactMaterials {
    pub default: MaterialConfig,
    pub ground_obstacle: MaterialConfig,
    pub vehicle_obstacle: MaterialConfig,
}

impl ContactMaterials {
    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self {
            default: config.default_material,
            ground_obstacle: config.ground_obstacle,
            vehicle_obstacle: config.vehicle_obstacle,
        }
    }

    pub fn for_pair(&self, a: BodyKind, b: BodyKind) -> MaterialConfig {
        use BodyKind::*;
        match (a, b) {
            (Ground, Obstacle) | (Obstacle, Ground) => self.ground_obstacle,
            (Vehicle, Obstacle) | (Obstacle, Vehicle) => self.vehicle_obstacle,
            _ => self.default,
        }
    }
}

impl PhysicsHooks for ContactMaterials {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let kind1 = context
            .colliders
            .get(context.collider1)
            .and_then(|c| BodyKind::from_tag(c.user_data));
        let kind2 = context
            .colliders
            .get(context.collider2)
            .and_then(|c| BodyKind::from_tag(c.user_data));
        let (Some(kind1), Some(kind2)) = (kind1, kind2) else {
            return;
        };

        let material = self.for_pair(kind1, kind2);
        for contact in context.solver_contacts.iter_mut() {
            contact.friction = material.friction;
            contact.restitution = material.restitution;
        }
    }
}

/// Rotation about +Y for a heading in radians.
pub fn heading_to_quaternion(heading: f32) -> UnitQuaternion<f32> {
    UnitQuaternion::from_euler_angles(0.0, heading, 0.0)
}

/// Wrapper around Rapier3D physics world for the driving scene.
/// Owns every rigid body; the rest of the simulation holds handles only.
pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub materials: ContactMaterials,
}

impl PhysicsWorld {
    /// Creates a new physics world from the physics config section
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = config.timestep;

        Self {
            gravity: vector![0.0, -config.gravity, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            materials: ContactMaterials::from_config(config),
        }
    }

    /// Steps the physics simulation forward by dt seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &self.materials,
            &(),
        );
    }

    fn insert(&mut self, body: RigidBody, collider: ColliderBuilder, kind: BodyKind) -> RigidBodyHandle {
        let handle = self.rigid_body_set.insert(body);
        let default = self.materials.default;
        let collider = collider
            .friction(default.friction)
            .restitution(default.restitution)
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .user_data(kind.tag())
            .build();
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Adds the infinite static ground plane at the given height (normal +Y)
    pub fn add_ground_plane(&mut self, height: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(vector![0.0, height, 0.0])
            .build();
        self.insert(body, ColliderBuilder::halfspace(Vector::y_axis()), BodyKind::Ground)
    }

    /// Adds the vehicle body: a dynamic box whose rotation is locked.
    /// Heading is driven kinematically through [`PhysicsWorld::set_heading`].
    pub fn add_vehicle(
        &mut self,
        position: [f32; 3],
        half_extents: [f32; 3],
        mass: f32,
        linear_damping: f32,
        angular_damping: f32,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .linear_damping(linear_damping)
            .angular_damping(angular_damping)
            .lock_rotations()
            .can_sleep(false)
            .build();
        let [hx, hy, hz] = half_extents;
        self.insert(body, ColliderBuilder::cuboid(hx, hy, hz).mass(mass), BodyKind::Vehicle)
    }

    /// Adds a dynamic cube obstacle
    pub fn add_obstacle(&mut self, position: [f32; 3], size: f32, mass: f32) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(vector![position[0], position[1], position[2]])
            .build();
        let half = size / 2.0;
        self.insert(body, ColliderBuilder::cuboid(half, half, half).mass(mass), BodyKind::Obstacle)
    }

    /// Gets the position of a rigid body
    pub fn get_position(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let pos = body.translation();
            [pos.x, pos.y, pos.z]
        })
    }

    /// Gets the rotation of a rigid body as quaternion [x, y, z, w]
    pub fn get_rotation(&self, handle: RigidBodyHandle) -> Option<[f32; 4]> {
        self.rigid_body_set.get(handle).map(|body| {
            let rot = body.rotation();
            [rot.i, rot.j, rot.k, rot.w]
        })
    }

    /// Gets the velocity of a rigid body
    pub fn get_velocity(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let vel = body.linvel();
            [vel.x, vel.y, vel.z]
        })
    }

    /// Gets the angular velocity of a rigid body
    #[cfg(test)]
    pub fn get_angular_velocity(&self, handle: RigidBodyHandle) -> Option<[f32; 3]> {
        self.rigid_body_set.get(handle).map(|body| {
            let vel = body.angvel();
            [vel.x, vel.y, vel.z]
        })
    }

    /// Sets the velocity of a dynamic body
    pub fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_linvel(vector![velocity[0], velocity[1], velocity[2]], true);
            }
        }
    }

    /// Sets the angular velocity of a dynamic body
    pub fn set_angular_velocity(&mut self, handle: RigidBodyHandle, velocity: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            if body.is_dynamic() {
                body.set_angvel(vector![velocity[0], velocity[1], velocity[2]], true);
            }
        }
    }

    /// Teleports a body
    pub fn set_translation(&mut self, handle: RigidBodyHandle, position: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_translation(vector![position[0], position[1], position[2]], true);
        }
    }

    /// Sets the body's rotation to a pure heading about +Y
    pub fn set_heading(&mut self, handle: RigidBodyHandle, heading: f32) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.set_rotation(heading_to_quaternion(heading), true);
        }
    }

    /// Clears the user force accumulator (forces otherwise persist across steps)
    pub fn reset_forces(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.reset_forces(true);
        }
    }

    /// Adds a force at the center of mass, applied during the following steps
    pub fn add_force(&mut self, handle: RigidBodyHandle, force: [f32; 3]) {
        if let Some(body) = self.rigid_body_set.get_mut(handle) {
            body.add_force(vector![force[0], force[1], force[2]], true);
        }
    }

    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    /// Removes every body and collider. The world is empty but still usable afterwards.
    pub fn teardown(&mut self) -> usize {
        let handles: Vec<RigidBodyHandle> = self.rigid_body_set.iter().map(|(h, _)| h).collect();
        for handle in &handles {
            self.rigid_body_set.remove(
                *handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
        }
        handles.len()
    }
}
