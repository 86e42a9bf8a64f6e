//! Grounded/Airborne state machine owning the vehicle's jump arc.
//!
//! The arc runs in per-tick units on its own gravity, separate from the
//! rigid-body solver, so jump height and airtime only depend on the
//! configured constants. Heights are body-center heights; the ground level
//! is where the vehicle's center rests on the plane.

use serde::Serialize;

use crate::config::JumpConfig;

/// Body-center height of a box with `half_height` resting on a plane at `plane_height`.
pub fn rest_height(plane_height: f32, half_height: f32, config: &JumpConfig) -> f32 {
    plane_height + half_height + config.clearance
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpPhase {
    Grounded,
    Airborne,
}

/// Result of one machine update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpUpdate {
    /// Height the vehicle must be placed at, when the machine overrides it
    pub height: Option<f32>,
    pub started: bool,
    pub landed: bool,
}

#[derive(Debug, Clone)]
pub struct JumpStateMachine {
    config: JumpConfig,
    ground_level: f32,
    phase: JumpPhase,
    vertical_velocity: f32,
    height: f32,
}

impl JumpStateMachine {
    /// `ground_level` is the body-center height at rest, see [`rest_height`].
    pub fn new(config: JumpConfig, ground_level: f32) -> Self {
        Self {
            config,
            ground_level,
            phase: JumpPhase::Grounded,
            vertical_velocity: 0.0,
            height: ground_level,
        }
    }

    pub fn ground_level(&self) -> f32 {
        self.ground_level
    }

    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Advances one tick.
    ///
    /// `current_height` is the body's height after the physics step and
    /// `jump_requested` the consumed jump edge. Requests while airborne are dropped.
    pub fn update(&mut self, current_height: f32, jump_requested: bool) -> JumpUpdate {
        let ground = self.ground_level;
        let mut started = false;

        if self.phase == JumpPhase::Grounded {
            if !jump_requested {
                // Grounded bodies are only ever lifted back up to the ground.
                let height = (current_height < ground).then_some(ground);
                return JumpUpdate { height, started: false, landed: false };
            }
            self.phase = JumpPhase::Airborne;
            self.vertical_velocity = self.config.strength;
            self.height = current_height.max(ground);
            started = true;
        }

        self.height += self.vertical_velocity;
        self.vertical_velocity += self.config.gravity;

        if self.height <= ground {
            self.height = ground;
            self.vertical_velocity = 0.0;
            self.phase = JumpPhase::Grounded;
            return JumpUpdate { height: Some(ground), started, landed: true };
        }

        JumpUpdate { height: Some(self.height), started, landed: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> JumpStateMachine {
        JumpStateMachine::new(JumpConfig { strength: 0.3, gravity: -0.02, clearance: 0.0 }, 0.0)
    }

    /// Ticks until landing, returning the tick count and the heights visited.
    fn run_jump(m: &mut JumpStateMachine) -> (u32, Vec<f32>) {
        let mut heights = Vec::new();
        let first = m.update(0.0, true);
        assert!(first.started);
        heights.push(first.height.unwrap());
        let mut ticks = 1;
        if first.landed {
            return (ticks, heights);
        }
        loop {
            let u = m.update(*heights.last().unwrap(), false);
            ticks += 1;
            heights.push(u.height.unwrap());
            if u.landed {
                return (ticks, heights);
            }
            assert!(ticks < 1000, "jump never landed");
        }
    }

    #[test]
    fn grounded_has_zero_vertical_velocity() {
        let mut m = machine();
        for _ in 0..10 {
            assert_eq!(m.vertical_velocity(), 0.0);
            let u = m.update(0.0, false);
            assert_eq!(u.height, None);
            assert_eq!(m.phase(), JumpPhase::Grounded);
            assert_eq!(m.vertical_velocity(), 0.0);
        }
    }

    #[test]
    fn jump_arc_is_closed_and_deterministic() {
        let mut a = machine();
        let (ticks_a, heights_a) = run_jump(&mut a);
        let mut b = machine();
        let (ticks_b, heights_b) = run_jump(&mut b);

        assert_eq!(ticks_a, ticks_b);
        assert_eq!(heights_a, heights_b);
        // y_n = 0.3n - 0.01n(n-1) reaches 0 at n = 31; float rounding may add one tick.
        assert!((31..=32).contains(&ticks_a), "landed after {} ticks", ticks_a);
        assert_eq!(*heights_a.last().unwrap(), 0.0);
        assert!(heights_a[..heights_a.len() - 1].iter().all(|&h| h > 0.0));

        assert_eq!(a.phase(), JumpPhase::Grounded);
        assert_eq!(a.vertical_velocity(), 0.0);
    }

    #[test]
    fn apex_matches_recurrence() {
        let mut m = machine();
        let (_, heights) = run_jump(&mut m);
        let apex = heights.iter().cloned().fold(f32::MIN, f32::max);
        // Peak of 0.3n - 0.01n(n-1) is at n = 15 or 16: 2.4
        assert!((apex - 2.4).abs() < 1e-3, "apex {}", apex);
    }

    #[test]
    fn no_reentrant_jump_while_airborne() {
        let mut m = machine();
        m.update(0.0, true);
        let v_before = m.vertical_velocity();
        let u = m.update(0.3, true);
        assert!(!u.started);
        assert!((m.vertical_velocity() - (v_before - 0.02)).abs() < 1e-6);
        assert_eq!(m.phase(), JumpPhase::Airborne);
    }

    #[test]
    fn grounded_body_below_ground_is_lifted() {
        let mut m = machine();
        let u = m.update(-0.4, false);
        assert_eq!(u.height, Some(0.0));
        assert_eq!(m.phase(), JumpPhase::Grounded);
    }

    #[test]
    fn can_jump_again_after_landing() {
        let mut m = machine();
        let (first, _) = run_jump(&mut m);
        let (second, _) = run_jump(&mut m);
        assert_eq!(first, second);
    }

    #[test]
    fn raised_ground_level_closes_arc_at_same_height() {
        let config = JumpConfig { strength: 0.3, gravity: -0.02, clearance: 0.0 };
        let rest = rest_height(-1.0, 2.0, &config);
        assert_eq!(rest, 1.0);

        let mut m = JumpStateMachine::new(config, rest);
        assert!(m.update(rest, true).started);
        let mut last = None;
        for _ in 0..100 {
            let u = m.update(rest, false);
            if u.landed {
                last = u.height;
                break;
            }
            assert!(u.height.unwrap() > rest);
        }
        assert_eq!(last, Some(rest));

        // A body sitting at rest is left alone; one sunk below is lifted to rest.
        assert_eq!(m.update(rest, false).height, None);
        assert_eq!(m.update(0.5, false).height, Some(rest));
    }
}
