use std::time::Duration;

use super::error::SimError;
use crate::config::{ConfigError, FrameLoopConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    /// Simulated time thrown away because the frame needed more than the tick cap
    pub dropped_backlog: Duration,
}

/// Accumulates real frame time and converts it into whole fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl FixedTimestep {
    /// Fails when either duration is not a positive, representable number of seconds.
    pub fn new(fixed_dt: f32, config: &FrameLoopConfig) -> Result<Self, SimError> {
        let seconds = |name: &str, v: f32| match Duration::try_from_secs_f32(v) {
            Ok(d) if !d.is_zero() => Ok(d),
            _ => Err(ConfigError::Invalid(format!("{name} is not a usable duration: {v}"))),
        };
        Ok(Self {
            fixed_dt: seconds("physics.timestep", fixed_dt)?,
            max_frame_delta: seconds("loop.max_frame_delta", config.max_frame_delta)?,
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
        })
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    pub fn fixed_duration(&self) -> Duration {
        self.fixed_dt
    }

    /// Leftover time not yet consumed by a tick, in [0, fixed_dt)
    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Adds one frame's elapsed seconds and returns how many ticks to run now.
    /// Non-finite or negative deltas are rejected without touching the accumulator.
    pub fn plan(&mut self, frame_elapsed: f32) -> Result<StepPlan, SimError> {
        if !frame_elapsed.is_finite() || frame_elapsed < 0.0 {
            return Err(SimError::InvalidFrameTime(frame_elapsed));
        }

        // Clamp before converting so huge deltas never overflow a Duration.
        let clamped = frame_elapsed.min(self.max_frame_delta.as_secs_f32());
        let elapsed = Duration::try_from_secs_f32(clamped).unwrap_or(self.max_frame_delta);
        Ok(self.plan_duration(elapsed))
    }

    /// Same as [`plan`](Self::plan) for a delta that is already a `Duration`.
    pub fn plan_duration(&mut self, frame_elapsed: Duration) -> StepPlan {
        let clamped = frame_elapsed.min(self.max_frame_delta);
        let mut accumulator = self.accumulator.saturating_add(clamped);
        let mut ticks_to_run = 0u32;

        while accumulator >= self.fixed_dt && ticks_to_run < self.max_ticks_per_frame {
            accumulator = accumulator.saturating_sub(self.fixed_dt);
            ticks_to_run += 1;
        }

        let dropped_backlog = if accumulator >= self.fixed_dt {
            std::mem::replace(&mut accumulator, Duration::ZERO)
        } else {
            Duration::ZERO
        };

        self.accumulator = accumulator;
        StepPlan { ticks_to_run, dropped_backlog }
    }

    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
    }
}
