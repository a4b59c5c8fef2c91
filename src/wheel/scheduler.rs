//! Frame scheduling seam
//!
//! The wheel asks its scheduler for one frame at a time. In the browser that
//! is `requestAnimationFrame`; natively and in tests a `ManualScheduler`
//! hands out frames on a fake clock.

/// Opaque id of a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Something that can call the wheel back on the next frame
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Fake frame clock: frames fire only when pumped
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    frame_ms: f64,
    clock_ms: f64,
    next_id: i32,
    pending: Option<FrameHandle>,
    /// Total frames ever requested
    pub requested: usize,
    /// Total cancel calls
    pub cancelled: usize,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new(1000.0 / 60.0)
    }
}

impl ManualScheduler {
    pub fn new(frame_ms: f64) -> Self {
        Self {
            frame_ms,
            clock_ms: 0.0,
            next_id: 0,
            pending: None,
            requested: 0,
            cancelled: 0,
        }
    }

    /// The frame waiting to fire, if any
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Fire the pending frame: returns its timestamp (ms) and clears it
    pub fn fire(&mut self) -> Option<f64> {
        self.pending.take()?;
        self.clock_ms += self.frame_ms;
        Some(self.clock_ms)
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        self.requested += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancelled += 1;
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }
}
