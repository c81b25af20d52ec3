//! Frame request pacing and frame rate measurement.

use std::time::{Duration, Instant};

/// Reschedule delay while the view is hidden, roughly one display refresh.
pub const HIDDEN_RESCHEDULE: Duration = Duration::from_millis(16);

/// How often the frame rate is recomputed.
pub const FPS_WINDOW: Duration = Duration::from_millis(1500);

/// Shortest and longest interval the update slider can select, in ms.
pub const MIN_FRAME_INTERVAL_MS: f64 = 1.0;
pub const MAX_FRAME_INTERVAL_MS: f64 = 1000.0;

/// Map a slider position to a frame interval in milliseconds.
///
/// Cubic so the slider has fine resolution at low latencies.
pub fn frame_update_scale(position: f64) -> f64 {
    (position / 100.0).powi(3)
}

/// Inverse of [`frame_update_scale`].
pub fn frame_update_scale_inv(interval_ms: f64) -> f64 {
    100.0 * interval_ms.cbrt()
}

/// Slider range covering [`MIN_FRAME_INTERVAL_MS`]..=[`MAX_FRAME_INTERVAL_MS`].
pub fn slider_range() -> (f64, f64) {
    (
        frame_update_scale_inv(MIN_FRAME_INTERVAL_MS),
        frame_update_scale_inv(MAX_FRAME_INTERVAL_MS),
    )
}

/// Decision of one pacer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerTick {
    /// Ask the host for a frame, then tick again after the delay.
    RequestFrame(Duration),
    /// Tick again after the delay without requesting anything.
    Wait(Duration),
    /// The connection is gone; stop ticking.
    Stop,
}

/// Drives `"TryGetFrame"` requests.
#[derive(Debug, Clone, Default)]
pub struct FramePacer {
    running: bool,
}

impl FramePacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start pacing. Returns `false` if already running.
    pub fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.running, true)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Decide what to do on a timer tick.
    pub fn tick(
        &mut self,
        connection_open: bool,
        hidden: bool,
        video_enabled: bool,
        interval: Duration,
    ) -> PacerTick {
        if !self.running || !connection_open {
            self.running = false;
            return PacerTick::Stop;
        }
        if hidden {
            return PacerTick::Wait(HIDDEN_RESCHEDULE);
        }
        if video_enabled {
            PacerTick::RequestFrame(interval)
        } else {
            PacerTick::Wait(interval)
        }
    }
}

/// Counts received frames and reports a rate once per [`FPS_WINDOW`].
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frames: u64,
    since: Instant,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self {
            frames: 0,
            since: now,
        }
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }

    /// Recompute the rate if the window elapsed. Rounded to one decimal.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.since);
        if elapsed <= FPS_WINDOW {
            return None;
        }
        let fps = (self.frames as f64 / elapsed.as_secs_f64() * 10.0).round() / 10.0;
        self.frames = 0;
        self.since = now;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_roundtrip() {
        for ms in [1.0, 33.0, 250.0, 1000.0] {
            let back = frame_update_scale(frame_update_scale_inv(ms));
            assert!((back - ms).abs() < 1e-9, "{ms} -> {back}");
        }
        assert_eq!(frame_update_scale(100.0), 1.0);
        assert_eq!(frame_update_scale(1000.0), 1000.0);
    }

    #[test]
    fn slider_covers_one_to_thousand_ms() {
        let (lo, hi) = slider_range();
        assert!((lo - 100.0).abs() < 1e-9);
        assert!((hi - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn start_is_idempotent() {
        let mut pacer = FramePacer::new();
        assert!(pacer.start());
        assert!(!pacer.start());
        assert!(pacer.is_running());
    }

    #[test]
    fn tick_decisions() {
        let interval = Duration::from_millis(33);
        let mut pacer = FramePacer::new();
        assert_eq!(pacer.tick(true, false, true, interval), PacerTick::Stop);

        pacer.start();
        assert_eq!(
            pacer.tick(true, false, true, interval),
            PacerTick::RequestFrame(interval)
        );
        assert_eq!(
            pacer.tick(true, true, true, interval),
            PacerTick::Wait(HIDDEN_RESCHEDULE)
        );
        assert_eq!(pacer.tick(true, false, false, interval), PacerTick::Wait(interval));
        assert_eq!(pacer.tick(false, false, true, interval), PacerTick::Stop);
        assert!(!pacer.is_running());
    }

    #[test]
    fn never_requests_while_hidden() {
        let mut pacer = FramePacer::new();
        pacer.start();
        for _ in 0..100 {
            assert!(!matches!(
                pacer.tick(true, true, true, Duration::from_millis(1)),
                PacerTick::RequestFrame(_)
            ));
        }
    }

    #[test]
    fn fps_published_after_window() {
        let t0 = Instant::now();
        let mut fps = FpsCounter::new(t0);
        for _ in 0..30 {
            fps.record_frame();
        }
        assert_eq!(fps.poll(t0 + Duration::from_millis(1000)), None);
        assert_eq!(fps.poll(t0 + Duration::from_millis(2000)), Some(15.0));
        assert_eq!(fps.poll(t0 + Duration::from_millis(3600)), Some(0.0));
    }
}
