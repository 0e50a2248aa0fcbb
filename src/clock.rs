//! Frame loop driver
//!
//! The driver owns at most one pending frame request. The browser backs
//! `FrameScheduler` with `requestAnimationFrame`; headless runs and tests
//! use `ManualScheduler`.

use crate::consts::{FRAME_DT_MS, MAX_FRAME_DT_MS};

/// Something that can deliver one frame callback per request
pub trait FrameScheduler {
    type Handle;

    /// Ask for one frame callback. `None` if the request could not be made.
    fn request_frame(&mut self) -> Option<Self::Handle>;

    fn cancel_frame(&mut self, handle: Self::Handle);
}

/// Start/stop lifecycle and frame-delta bookkeeping
pub struct LoopDriver<S: FrameScheduler> {
    scheduler: S,
    pending: Option<S::Handle>,
    /// Timestamp of the previous frame; cleared on every (re)start
    last_frame_ms: Option<f64>,
}

impl<S: FrameScheduler> LoopDriver<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            pending: None,
            last_frame_ms: None,
        }
    }

    /// Arm the loop. The next frame uses the nominal delta.
    pub fn start(&mut self) {
        self.last_frame_ms = None;
        if self.pending.is_none() {
            self.schedule_next();
        }
    }

    /// Cancel the pending frame. Returns false if nothing was pending.
    pub fn stop(&mut self) -> bool {
        self.last_frame_ms = None;
        match self.pending.take() {
            Some(handle) => {
                self.scheduler.cancel_frame(handle);
                true
            }
            None => false,
        }
    }

    /// Consume the pending request for a frame at `now_ms` and return the
    /// clamped delta. `None` means the driver was stopped in between.
    pub fn begin_frame(&mut self, now_ms: f64) -> Option<f32> {
        self.pending.take()?;

        let dt = match self.last_frame_ms {
            Some(last) => ((now_ms - last) as f32).clamp(0.0, MAX_FRAME_DT_MS),
            None => FRAME_DT_MS,
        };
        self.last_frame_ms = Some(now_ms);
        Some(dt)
    }

    /// Request the following frame
    pub fn schedule_next(&mut self) {
        if self.pending.is_some() {
            return;
        }
        self.pending = self.scheduler.request_frame();
        if self.pending.is_none() {
            log::warn!("Frame request failed, loop halted");
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

/// Scheduler that only counts requests; frames are delivered by calling
/// `App::on_frame` directly
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_handle: u32,
    pub requested: u32,
    pub cancelled: u32,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for ManualScheduler {
    type Handle = u32;

    fn request_frame(&mut self) -> Option<u32> {
        self.next_handle += 1;
        self.requested += 1;
        Some(self.next_handle)
    }

    fn cancel_frame(&mut self, _handle: u32) {
        self.cancelled += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_keeps_single_pending_request() {
        let mut driver = LoopDriver::new(ManualScheduler::new());
        assert!(!driver.is_running());

        driver.start();
        driver.start();

        assert!(driver.is_running());
        assert_eq!(driver.scheduler().requested, 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut driver = LoopDriver::new(ManualScheduler::new());
        driver.start();

        assert!(driver.stop());
        assert!(!driver.stop());
        assert_eq!(driver.scheduler().cancelled, 1);
        assert!(!driver.is_running());
    }

    #[test]
    fn test_first_frame_uses_nominal_delta() {
        let mut driver = LoopDriver::new(ManualScheduler::new());
        driver.start();
        assert_eq!(driver.begin_frame(5_000.0), Some(FRAME_DT_MS));

        driver.schedule_next();
        assert_eq!(driver.begin_frame(5_020.0), Some(20.0));
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut driver = LoopDriver::new(ManualScheduler::new());
        driver.start();
        driver.begin_frame(0.0);

        driver.schedule_next();
        assert_eq!(driver.begin_frame(2_000.0), Some(MAX_FRAME_DT_MS));

        driver.schedule_next();
        assert_eq!(driver.begin_frame(1_000.0), Some(0.0));
    }

    #[test]
    fn test_stale_callback_after_stop_is_ignored() {
        let mut driver = LoopDriver::new(ManualScheduler::new());
        driver.start();
        driver.stop();
        assert_eq!(driver.begin_frame(16.0), None);
    }

    #[test]
    fn test_restart_forgets_paused_time() {
        let mut driver = LoopDriver::new(ManualScheduler::new());
        driver.start();
        driver.begin_frame(1_000.0);
        driver.schedule_next();
        driver.stop();

        driver.start();
        assert_eq!(driver.begin_frame(60_000.0), Some(FRAME_DT_MS));
    }
}
