pub mod camera;
pub mod constants;
pub mod error;
pub mod ground;
pub mod input;
pub mod instance;
pub mod jump;
pub mod obstacles;
pub mod physics;
pub mod timestep;
pub mod vehicle;

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use input::InputEvent;
use instance::{FrameSnapshot, Simulation};

/// Consumer of finished frames. Owned by the loop and released with the world.
pub trait RenderSink {
    fn present(&mut self, frame: &FrameSnapshot);

    /// Called exactly once when the loop ends, on every exit path.
    fn release(&mut self) {}
}

/// Key transition applied right before a given frame's ticks run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub frame: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

/// Cloneable flag that asks a running loop to stop after the current frame.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub ticks: u64,
    pub failed_ticks: u64,
    pub skipped_frames: u64,
}

/// Owns the simulation and the sink for the duration of a run.
/// Dropping it tears both down, including on panic.
struct Session<S: RenderSink> {
    simulation: Simulation,
    sink: S,
}

impl<S: RenderSink> Drop for Session<S> {
    fn drop(&mut self) {
        self.sink.release();
        self.simulation.teardown();
    }
}

/// Per-frame driver: drains input, advances the fixed-step simulation,
/// hands the snapshot to the sink and paces to the target frame rate.
pub struct GameLoop<S: RenderSink> {
    simulation: Simulation,
    sink: S,
    input_rx: Receiver<InputEvent>,
    script: Vec<ScriptedEvent>,
    frame_duration: Duration,
    /// Simulated length of a frame when not running in real time
    virtual_frame: Duration,
    max_frames: Option<u64>,
    realtime: bool,
    stop: StopHandle,
}

impl<S: RenderSink> GameLoop<S> {
    /// Returns the loop and the sender side of its input channel.
    pub fn new(simulation: Simulation, sink: S) -> (Self, Sender<InputEvent>) {
        let (input_tx, input_rx) = crossbeam_channel::unbounded();
        let fps = simulation.config.frame_loop.target_fps.max(1);
        let frame_duration = Duration::from_secs(1) / fps;
        // Whole ticks only, so virtual frames never leave a remainder behind.
        let fixed = simulation.timestep.fixed_duration();
        let ticks_per_frame = (frame_duration.as_secs_f64() / fixed.as_secs_f64()).round().max(1.0) as u32;
        let game_loop = Self {
            simulation,
            sink,
            input_rx,
            script: Vec::new(),
            frame_duration,
            virtual_frame: fixed * ticks_per_frame,
            max_frames: None,
            realtime: true,
            stop: StopHandle::default(),
        };
        (game_loop, input_tx)
    }

    /// Scripted input, applied in frame order. Events sharing a frame keep their order.
    pub fn with_script(mut self, mut script: Vec<ScriptedEvent>) -> Self {
        script.sort_by_key(|e| e.frame);
        self.script = script;
        self
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// When false, every frame advances by the whole number of ticks closest to
    /// one target frame and the loop never sleeps, so a run is reproducible.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn run(self) -> LoopSummary {
        let Self {
            simulation,
            sink,
            input_rx,
            script,
            frame_duration,
            virtual_frame,
            max_frames,
            realtime,
            stop,
        } = self;

        let mut session = Session { simulation, sink };
        let mut summary = LoopSummary::default();
        let mut script = script.into_iter().peekable();
        let mut input_open = true;
        let mut last_frame = Instant::now();

        info!(
            fps = (1.0 / frame_duration.as_secs_f32()).round(),
            realtime,
            max_frames = ?max_frames,
            "game loop started"
        );

        loop {
            if stop.is_stopped() {
                debug!("stop requested");
                break;
            }
            if max_frames.is_some_and(|max| summary.frames >= max) {
                break;
            }

            let start = Instant::now();
            let simulation = &mut session.simulation;

            while let Some(scripted) = script.next_if(|e| e.frame <= summary.frames) {
                simulation.handle_event(&scripted.event);
            }

            while input_open {
                match input_rx.try_recv() {
                    Ok(event) => {
                        simulation.handle_event(&event);
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        debug!("input channel closed");
                        input_open = false;
                    }
                }
            }

            let report = if realtime {
                let now = Instant::now();
                let elapsed = now.duration_since(last_frame);
                last_frame = now;
                simulation.advance(elapsed.as_secs_f32())
            } else {
                simulation.advance_duration(virtual_frame)
            };
            summary.ticks += u64::from(report.ticks_run);
            summary.failed_ticks += u64::from(report.failed_ticks);
            if report.skipped {
                summary.skipped_frames += 1;
            }

            let frame = simulation.snapshot();
            session.sink.present(&frame);
            summary.frames += 1;

            if realtime {
                let spent = start.elapsed();
                if spent < frame_duration {
                    thread::sleep(frame_duration - spent);
                }
            }
        }

        info!(
            frames = summary.frames,
            ticks = summary.ticks,
            failed_ticks = summary.failed_ticks,
            "game loop finished"
        );
        summary
    }
}
