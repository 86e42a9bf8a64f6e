//! Spike tests pinning down the Rapier3D 0.25 behaviors the driving scene relies on.
//! These exercise Rapier APIs directly (no dependency on PhysicsWorld) so a Rapier
//! upgrade that changes force accumulation, halfspace contacts or contact hooks
//! shows up here first.
//!
//! Run with: cargo test --test physics_spike_test -- --nocapture

use nalgebra::UnitQuaternion;
use rapier3d::prelude::*;

// ---------------------------------------------------------------------------
// Shared test pipeline
// ---------------------------------------------------------------------------

/// Minimal Rapier pipeline mirroring the PhysicsWorld fields but fully decoupled.
struct TestPipeline {
    gravity: Vector<Real>,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
}

impl TestPipeline {
    fn new(gravity: f32) -> Self {
        Self {
            gravity: vector![0.0, -gravity, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
        }
    }

    fn step_with(&mut self, hooks: &dyn PhysicsHooks) {
        self.integration_parameters.dt = 1.0 / 60.0;
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
            hooks,
            &(),
        );
    }

    fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step_with(&());
        }
    }

    fn add_ground(&mut self, height: f32) {
        let body = self
            .rigid_body_set
            .insert(RigidBodyBuilder::fixed().translation(vector![0.0, height, 0.0]).build());
        let collider = ColliderBuilder::halfspace(Vector::y_axis())
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
    }

    fn add_box(&mut self, position: Vector<Real>, half: f32, tag: u128) -> RigidBodyHandle {
        let body = self.rigid_body_set.insert(
            RigidBodyBuilder::dynamic()
                .translation(position)
                .lock_rotations()
                .can_sleep(false)
                .build(),
        );
        let collider = ColliderBuilder::cuboid(half, half, half)
            .mass(1.0)
            .user_data(tag)
            .active_hooks(ActiveHooks::MODIFY_SOLVER_CONTACTS)
            .build();
        self.collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);
        body
    }
}

/// Overrides friction per contact from the non-ground collider's user_data (0 or 1).
struct FrictionFromTag;

impl PhysicsHooks for FrictionFromTag {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let tag = |h: ColliderHandle| context.colliders.get(h).map(|c| c.user_data).unwrap_or(0);
        let friction = tag(context.collider1).max(tag(context.collider2)) as f32;
        for contact in context.solver_contacts.iter_mut() {
            contact.friction = friction;
        }
    }
}

// ===========================================================================
// Test 1: Forces accumulate until explicitly reset
// ===========================================================================

/// `add_force` is persistent in Rapier 0.25: without `reset_forces` the body keeps
/// accelerating on later steps even if nothing re-applies the force.
#[test]
fn spike_forces_persist_until_reset() {
    let mut p = TestPipeline::new(0.0);
    let h = p.add_box(vector![0.0, 0.0, 0.0], 1.0, 0);

    p.rigid_body_set[h].add_force(vector![0.0, 0.0, 60.0], true);
    p.step_n(1);
    let v1 = p.rigid_body_set[h].linvel().z;
    p.step_n(1);
    let v2 = p.rigid_body_set[h].linvel().z;
    println!("after 1 step: {:.3}, after 2 steps: {:.3}", v1, v2);
    assert!(v1 > 0.5);
    assert!(v2 > v1 * 1.5, "force should still be applied on the second step");

    p.rigid_body_set[h].reset_forces(true);
    p.step_n(5);
    let v3 = p.rigid_body_set[h].linvel().z;
    assert!((v3 - v2).abs() < 1e-4, "velocity should hold once forces are reset");
}

// ===========================================================================
// Test 2: Box rests on a halfspace
// ===========================================================================

/// A 2-unit-tall box dropped onto a halfspace at y = -1 settles with its center at y ~ 0.
#[test]
fn spike_box_rests_on_halfspace() {
    let mut p = TestPipeline::new(9.81);
    p.add_ground(-1.0);
    let h = p.add_box(vector![0.0, 2.0, 0.0], 1.0, 0);

    p.step_n(180);

    let y = p.rigid_body_set[h].translation().y;
    let vy = p.rigid_body_set[h].linvel().y;
    println!("rest height {:.4}, vy {:.4}", y, vy);
    assert!(y.abs() < 0.05, "box should rest on the plane, y={}", y);
    assert!(vy.abs() < 0.05);
}

// ===========================================================================
// Test 3: Contact hook overrides friction per pair
// ===========================================================================

/// Two identical boxes slide with the same initial speed. The hook gives one
/// zero friction and the other full friction; only the first keeps sliding.
#[test]
fn spike_contact_hook_sets_friction() {
    let mut p = TestPipeline::new(9.81);
    p.add_ground(-1.0);
    let slippery = p.add_box(vector![-10.0, 0.0, 0.0], 1.0, 0);
    let grippy = p.add_box(vector![10.0, 0.0, 0.0], 1.0, 1);

    // Settle first so both are in contact.
    for _ in 0..60 {
        p.step_with(&FrictionFromTag);
    }
    for h in [slippery, grippy] {
        p.rigid_body_set[h].set_linvel(vector![0.0, 0.0, 5.0], true);
    }
    for _ in 0..60 {
        p.step_with(&FrictionFromTag);
    }

    let z_slippery = p.rigid_body_set[slippery].translation().z;
    let z_grippy = p.rigid_body_set[grippy].translation().z;
    println!("slippery travelled {:.3}, grippy travelled {:.3}", z_slippery, z_grippy);
    assert!(z_slippery > 4.5, "frictionless box should keep sliding");
    assert!(z_grippy < z_slippery * 0.5, "high-friction box should stop early");
}

// ===========================================================================
// Test 4: set_rotation on a rotation-locked body
// ===========================================================================

/// Locked rotations only block the solver; a rotation written directly is kept.
#[test]
fn spike_locked_body_keeps_written_rotation() {
    let mut p = TestPipeline::new(0.0);
    let h = p.add_box(vector![0.0, 0.0, 0.0], 1.0, 0);
    let heading = UnitQuaternion::from_euler_angles(0.0, 0.7, 0.0);

    p.rigid_body_set[h].set_rotation(heading, true);
    p.step_n(10);

    let rot = *p.rigid_body_set[h].rotation();
    assert!(rot.angle_to(&heading) < 1e-4, "rotation drifted: {:?}", rot.euler_angles());
}
