//! The prize wheel
//!
//! `Wheel` ties together the spin physics, a frame scheduler, a drawing
//! surface and the spin listener. Frames arrive through `frame(timestamp)`;
//! the wheel only ever keeps one frame requested at a time.

pub mod layout;
pub mod physics;
pub mod render;
pub mod scheduler;
#[cfg(target_arch = "wasm32")]
pub mod web;

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

pub use physics::{SpinPhase, StepOutcome, WheelPhysics, WheelTuning};
pub use render::{WheelSurface, WheelView};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};

/// Shown instead of the wheel when there is nothing to spin
pub const EMPTY_MESSAGE: &str = "Pick an allergen to spin";

/// Pointer tap strength lost per second
const POINTER_TAP_DECAY: f64 = 4.0;
/// Step used for the first frame of a loop (no previous timestamp)
const FIRST_FRAME_DT: f64 = 1.0 / 60.0;

/// What a segment shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WheelLabelDescriptor {
    pub label: String,
    pub emoji: Option<String>,
}

impl WheelLabelDescriptor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            emoji: None,
        }
    }
}

/// Receives spin progress. Both methods are required.
pub trait SpinListener {
    /// A new segment passed under the pointer
    fn on_tick(&mut self, index: usize);
    /// The wheel came to rest; called once per spin
    fn on_stop(&mut self, winner: usize);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOptions {
    pub randomize_start: bool,
}

/// Automatic stop once both thresholds are passed; `duration_ms == 0`
/// leaves stopping to the player
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutoStop {
    pub duration_ms: f64,
    pub revolutions: f64,
}

/// A wheel drawn on one surface
pub struct Wheel<S: FrameScheduler> {
    physics: WheelPhysics,
    labels: Vec<WheelLabelDescriptor>,
    scheduler: S,
    frame: Option<FrameHandle>,
    last_timestamp: Option<f64>,
    surface: Option<Box<dyn WheelSurface>>,
    listener: Option<Box<dyn SpinListener>>,
    auto_stop: AutoStop,
    spin_elapsed_ms: f64,
    last_pointer_index: Option<usize>,
    pointer_tap: f64,
    reduced_motion: bool,
    winner: Option<usize>,
    rng: Pcg32,
}

impl<S: FrameScheduler> Wheel<S> {
    pub fn new(scheduler: S, tuning: WheelTuning, seed: u64) -> Self {
        Self {
            physics: WheelPhysics::new(tuning),
            labels: Vec::new(),
            scheduler,
            frame: None,
            last_timestamp: None,
            surface: None,
            listener: None,
            auto_stop: AutoStop::default(),
            spin_elapsed_ms: 0.0,
            last_pointer_index: None,
            pointer_tap: 0.0,
            reduced_motion: false,
            winner: None,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Attach the drawing surface, size it and draw
    pub fn initialize(&mut self, surface: Box<dyn WheelSurface>) {
        self.surface = Some(surface);
        self.ensure_size();
    }

    pub fn set_labels(&mut self, labels: Vec<WheelLabelDescriptor>) {
        self.labels = labels;
        self.physics.set_segment_count(self.labels.len());
        self.draw();
    }

    pub fn labels(&self) -> &[WheelLabelDescriptor] {
        &self.labels
    }

    pub fn register_spin_callbacks(&mut self, listener: Box<dyn SpinListener>) {
        self.listener = Some(listener);
    }

    pub fn set_spin_duration(&mut self, ms: f64) {
        self.auto_stop.duration_ms = ms.max(0.0);
    }

    pub fn set_revolutions(&mut self, revolutions: f64) {
        self.auto_stop.revolutions = revolutions.max(0.0);
    }

    /// Start a new spin from rest, optionally with segment `hint` under the
    /// pointer. Re-kicks instead if a spin is already running.
    pub fn spin(&mut self, starting_index_hint: Option<usize>) {
        if self.labels.is_empty() {
            self.draw();
            return;
        }
        if self.physics.phase() != SpinPhase::Idle {
            self.start();
            return;
        }

        let pos = self.physics.pos();
        self.physics.reset(pos);
        if let Some(index) = starting_index_hint.filter(|&i| i < self.labels.len()) {
            self.physics.align_index(index);
        }
        self.spin_elapsed_ms = 0.0;
        self.winner = None;
        self.last_pointer_index = Some(self.physics.index_at_pointer());
        log::debug!("Spin started over {} segments", self.labels.len());
        self.start();
    }

    /// Enter free spin and make sure a frame loop is running
    pub fn start(&mut self) {
        if self.labels.is_empty() {
            self.draw();
            return;
        }
        self.physics.start();
        if self.frame.is_none() {
            self.last_timestamp = None;
            self.frame = Some(self.scheduler.request_frame());
        }
    }

    /// Ask the wheel to wind down; repeated calls are absorbed
    pub fn stop(&mut self) {
        if self.physics.request_stop() {
            log::debug!("Stop requested at segment {}", self.physics.index_at_pointer());
        }
    }

    /// Back to rest, cancelling any running loop
    pub fn reset_for_new_spin(&mut self, options: ResetOptions) {
        self.cancel_loop();
        let pos = if options.randomize_start {
            self.rng.random_range(0.0..TAU)
        } else {
            0.0
        };
        self.physics.reset(pos);
        self.spin_elapsed_ms = 0.0;
        self.last_pointer_index = None;
        self.pointer_tap = 0.0;
        self.winner = None;
        self.draw();
    }

    /// Recompute the backing store for the current CSS size and redraw.
    /// Physics state is untouched.
    pub fn ensure_size(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            if surface.ensure_backing_store() {
                let (w, h) = surface.css_size();
                log::debug!("Wheel canvas resized to {}x{}", w, h);
            }
        }
        self.draw();
    }

    /// Keep the pointer still; ticks are still reported
    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
        if reduced {
            self.pointer_tap = 0.0;
        }
    }

    /// Kick the pointer deflection
    pub fn trigger_pointer_tap(&mut self) {
        if !self.reduced_motion {
            self.pointer_tap = 1.0;
        }
    }

    pub fn draw(&mut self) {
        let Some(surface) = self.surface.as_deref_mut() else {
            return;
        };
        let view = WheelView {
            labels: &self.labels,
            pos: self.physics.pos(),
            pointer_angle: self.physics.tuning().pointer_angle,
            pointer_tap: self.pointer_tap,
            empty_message: EMPTY_MESSAGE,
        };
        render::draw_wheel(surface, &view);
    }

    /// One animation frame. Ignored unless a frame was requested.
    pub fn frame(&mut self, timestamp: f64) {
        if self.frame.is_none() {
            return;
        }
        let max_dt = self.physics.tuning().max_dt;
        let dt = match self.last_timestamp {
            Some(prev) => ((timestamp - prev) / 1000.0).clamp(0.0, max_dt),
            None => FIRST_FRAME_DT.min(max_dt),
        };
        self.last_timestamp = Some(timestamp);

        let outcome = self.advance(dt);
        self.draw();

        match outcome {
            StepOutcome::Moving => self.frame = Some(self.scheduler.request_frame()),
            StepOutcome::Idle => self.cancel_loop(),
            StepOutcome::Stopped(winner) => {
                self.cancel_loop();
                self.winner = Some(winner);
                log::info!("Wheel stopped on segment {}", winner);
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_stop(winner);
                }
            }
        }
    }

    fn advance(&mut self, dt: f64) -> StepOutcome {
        self.pointer_tap = (self.pointer_tap - dt * POINTER_TAP_DECAY).max(0.0);

        if self.physics.phase() == SpinPhase::Spinning {
            self.spin_elapsed_ms += dt * 1000.0;
            if self.auto_stop_due() {
                log::debug!("Auto-stop after {:.0}ms", self.spin_elapsed_ms);
                self.stop();
            }
        }

        let outcome = self.physics.step(dt);
        if outcome != StepOutcome::Idle {
            let index = self.physics.index_at_pointer();
            if self.last_pointer_index != Some(index) {
                self.last_pointer_index = Some(index);
                self.trigger_pointer_tap();
                if let Some(listener) = self.listener.as_mut() {
                    listener.on_tick(index);
                }
            }
        }
        outcome
    }

    fn auto_stop_due(&self) -> bool {
        let a = self.auto_stop;
        a.duration_ms > 0.0
            && self.spin_elapsed_ms >= a.duration_ms
            && self.physics.travelled() >= a.revolutions * TAU
    }

    fn cancel_loop(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.last_timestamp = None;
    }

    /// Segment under the pointer right now
    pub fn index_at_pointer(&self) -> usize {
        self.physics.index_at_pointer()
    }

    /// Winner of the last completed spin
    pub fn winner(&self) -> Option<usize> {
        self.winner
    }

    pub fn phase(&self) -> SpinPhase {
        self.physics.phase()
    }

    pub fn is_spinning(&self) -> bool {
        self.physics.phase() != SpinPhase::Idle
    }

    pub fn physics(&self) -> &WheelPhysics {
        &self.physics
    }

    pub fn pointer_tap(&self) -> f64 {
        self.pointer_tap
    }

    pub fn has_frame_loop(&self) -> bool {
        self.frame.is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl Wheel<ManualScheduler> {
    /// Fire pending frames on the fake clock until the loop ends or
    /// `max_frames` have run. Returns frames run.
    pub fn pump(&mut self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames {
            let Some(timestamp) = self.scheduler.fire() else {
                break;
            };
            self.frame(timestamp);
            frames += 1;
        }
        frames
    }
}
