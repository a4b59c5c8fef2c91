//! Spin physics
//!
//! Explicit state machine:
//! - `Idle`: at rest, `vel == 0`, no frame loop
//! - `Spinning`: accelerating toward `max_vel` with a light drag
//! - `Stopping`: decelerating; once slow enough the wheel snaps so the
//!   segment under the pointer is exactly centred, then returns to `Idle`
//!
//! `Stopping -> Idle` is the only transition that reports a winner, so a
//! completed spin is reported exactly once no matter how often a stop is
//! requested.

use std::f64::consts::TAU;

use crate::normalize_angle;

/// Physics constants (radians, seconds)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelTuning {
    /// Free-spin acceleration (rad/s²)
    pub accel: f64,
    /// Free-spin speed cap (rad/s)
    pub max_vel: f64,
    /// Constant drag while spinning (rad/s²)
    pub drag_spin: f64,
    /// Braking while stopping (rad/s²)
    pub drag_stop: f64,
    /// Below this speed a stopping wheel snaps to rest (rad/s)
    pub min_stop_vel: f64,
    /// Largest simulated step per frame (s)
    pub max_dt: f64,
    /// Minimum speed given by `start` (rad/s)
    pub min_kick: f64,
    /// Fixed pointer angle (canvas convention, -π/2 is the top)
    pub pointer_angle: f64,
}

impl Default for WheelTuning {
    fn default() -> Self {
        Self {
            accel: 12.0,
            max_vel: 14.0,
            drag_spin: 0.6,
            drag_stop: 5.0,
            min_stop_vel: 0.35,
            max_dt: 0.05,
            min_kick: 2.0,
            pointer_angle: -std::f64::consts::FRAC_PI_2,
        }
    }
}

/// Current phase of the spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
    Stopping,
}

/// Result of one physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to simulate
    Idle,
    /// Still moving
    Moving,
    /// Came to rest this step with the given segment under the pointer
    Stopped(usize),
}

/// Angular state of the wheel
#[derive(Debug, Clone)]
pub struct WheelPhysics {
    pos: f64,
    vel: f64,
    phase: SpinPhase,
    segment_count: usize,
    travelled: f64,
    tuning: WheelTuning,
}

impl WheelPhysics {
    pub fn new(tuning: WheelTuning) -> Self {
        Self {
            pos: 0.0,
            vel: 0.0,
            phase: SpinPhase::Idle,
            segment_count: 1,
            travelled: 0.0,
            tuning,
        }
    }

    pub fn pos(&self) -> f64 {
        self.pos
    }

    pub fn vel(&self) -> f64 {
        self.vel
    }

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn tuning(&self) -> &WheelTuning {
        &self.tuning
    }

    /// Radians travelled since the last `reset`
    pub fn travelled(&self) -> f64 {
        self.travelled
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Width of one segment (radians)
    pub fn segment(&self) -> f64 {
        TAU / self.segment_count as f64
    }

    /// Set the number of segments (at least one)
    pub fn set_segment_count(&mut self, count: usize) {
        self.segment_count = count.max(1);
    }

    /// Back to rest at `pos`
    pub fn reset(&mut self, pos: f64) {
        self.pos = normalize_angle(pos);
        self.vel = 0.0;
        self.travelled = 0.0;
        self.phase = SpinPhase::Idle;
    }

    /// Rotate so segment `index` is centred under the pointer
    pub fn align_index(&mut self, index: usize) {
        let index = index.min(self.segment_count - 1);
        let center = (index as f64 + 0.5) * self.segment();
        self.pos = normalize_angle(self.tuning.pointer_angle - center);
    }

    /// Enter (or re-enter) free spin with at least `min_kick` speed
    pub fn start(&mut self) {
        self.phase = SpinPhase::Spinning;
        self.vel = self.vel.max(self.tuning.min_kick);
    }

    /// Latch the stop intent. Returns true only on the Spinning -> Stopping
    /// transition; repeated requests and requests while idle are absorbed.
    pub fn request_stop(&mut self) -> bool {
        if self.phase == SpinPhase::Spinning {
            self.phase = SpinPhase::Stopping;
            true
        } else {
            false
        }
    }

    /// Advance by `dt` seconds
    pub fn step(&mut self, dt: f64) -> StepOutcome {
        let t = &self.tuning;
        match self.phase {
            SpinPhase::Idle => return StepOutcome::Idle,
            SpinPhase::Spinning => {
                self.vel = (self.vel + t.accel * dt).min(t.max_vel);
                self.vel = (self.vel - t.drag_spin * dt).max(0.0);
            }
            SpinPhase::Stopping => {
                self.vel = (self.vel - t.drag_stop * dt).max(0.0);
                if self.vel <= t.min_stop_vel {
                    self.snap_to_pointer();
                    self.vel = 0.0;
                }
            }
        }

        let delta = self.vel * dt;
        self.travelled += delta;
        self.pos = normalize_angle(self.pos + delta);

        if self.phase == SpinPhase::Stopping && self.vel == 0.0 {
            self.phase = SpinPhase::Idle;
            return StepOutcome::Stopped(self.index_at_pointer());
        }
        StepOutcome::Moving
    }

    /// Segment currently under the pointer, in [0, segment_count)
    pub fn index_at_pointer(&self) -> usize {
        let offset = self.pointer_offset();
        let index = (offset / self.segment()).floor() as usize;
        index.min(self.segment_count - 1)
    }

    /// Signed distance from the pointer to the centre of the segment under it
    pub fn pointer_misalignment(&self) -> f64 {
        let center = (self.index_at_pointer() as f64 + 0.5) * self.segment();
        self.pointer_offset() - center
    }

    /// Pointer angle measured in wheel coordinates, in [0, 2π)
    fn pointer_offset(&self) -> f64 {
        normalize_angle(self.tuning.pointer_angle - self.pos)
    }

    /// Nudge `pos` so the segment under the pointer is exactly centred
    fn snap_to_pointer(&mut self) {
        let delta = self.pointer_misalignment();
        self.pos = normalize_angle(self.pos + delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f64 = 1.0 / 60.0;

    fn physics(segments: usize) -> WheelPhysics {
        let mut p = WheelPhysics::new(WheelTuning::default());
        p.set_segment_count(segments);
        p
    }

    fn run_to_rest(p: &mut WheelPhysics) -> (usize, usize) {
        let mut stops = 0;
        let mut winner = usize::MAX;
        for _ in 0..10_000 {
            if let StepOutcome::Stopped(i) = p.step(DT) {
                stops += 1;
                winner = i;
            }
        }
        (winner, stops)
    }

    #[test]
    fn test_idle_does_not_move() {
        let mut p = physics(8);
        p.reset(1.0);
        assert_eq!(p.step(DT), StepOutcome::Idle);
        assert_eq!(p.pos(), 1.0);
        // Stop while idle is a no-op
        assert!(!p.request_stop());
        assert_eq!(p.phase(), SpinPhase::Idle);
    }

    #[test]
    fn test_start_gives_minimum_kick() {
        let mut p = physics(8);
        p.start();
        assert_eq!(p.phase(), SpinPhase::Spinning);
        assert!(p.vel() >= WheelTuning::default().min_kick);
    }

    #[test]
    fn test_spin_velocity_capped() {
        let mut p = physics(8);
        p.start();
        for _ in 0..1000 {
            p.step(DT);
        }
        let t = WheelTuning::default();
        assert!(p.vel() <= t.max_vel);
        assert!(p.vel() > t.max_vel - t.drag_spin * DT - 1e-9);
        assert!((0.0..TAU).contains(&p.pos()));
    }

    #[test]
    fn test_stop_snaps_to_segment_center() {
        let mut p = physics(8);
        p.start();
        for _ in 0..90 {
            p.step(DT);
        }
        assert!(p.request_stop());

        let (winner, stops) = run_to_rest(&mut p);
        assert_eq!(stops, 1);
        assert!(winner < 8);
        assert_eq!(p.phase(), SpinPhase::Idle);
        assert_eq!(p.vel(), 0.0);
        assert_eq!(p.index_at_pointer(), winner);
        assert!(p.pointer_misalignment().abs() < 1e-9);
    }

    #[test]
    fn test_repeated_stop_requests_absorbed() {
        let mut p = physics(6);
        p.start();
        p.step(DT);
        assert!(p.request_stop());
        assert!(!p.request_stop());
        p.step(DT);
        assert!(!p.request_stop());

        let (_, stops) = run_to_rest(&mut p);
        assert_eq!(stops, 1);
    }

    #[test]
    fn test_restart_while_stopping_clears_intent() {
        let mut p = physics(8);
        p.start();
        p.request_stop();
        p.start();
        assert_eq!(p.phase(), SpinPhase::Spinning);
        for _ in 0..600 {
            assert_eq!(p.step(DT), StepOutcome::Moving);
        }
    }

    #[test]
    fn test_align_index_puts_segment_under_pointer() {
        let mut p = physics(8);
        for i in 0..8 {
            p.align_index(i);
            assert_eq!(p.index_at_pointer(), i);
            assert!(p.pointer_misalignment().abs() < 1e-9);
        }
    }

    #[test]
    fn test_travelled_accumulates() {
        let mut p = physics(8);
        p.start();
        for _ in 0..60 {
            p.step(DT);
        }
        assert!(p.travelled() > 2.0);
        p.reset(0.0);
        assert_eq!(p.travelled(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_index_in_range(pos in -100.0f64..100.0, n in 1usize..40) {
            let mut p = physics(n);
            p.reset(pos);
            prop_assert!(p.index_at_pointer() < n);
        }

        #[test]
        fn prop_stop_is_exactly_aligned(n in 1usize..24, spin_frames in 1usize..200, pos in 0.0f64..TAU) {
            let mut p = physics(n);
            p.reset(pos);
            p.start();
            for _ in 0..spin_frames {
                p.step(DT);
            }
            p.request_stop();
            let (winner, stops) = run_to_rest(&mut p);
            prop_assert_eq!(stops, 1);
            prop_assert_eq!(p.index_at_pointer(), winner);
            prop_assert!(p.pointer_misalignment().abs() < 1e-9);
        }
    }
}
