//! Deadline-based timing for timed-progress tasks.
//!
//! `draw_web()` calls at ~60fps with variable delta. Instead of counting
//! frames, a `ProgressTimer` records when it started and compares every
//! frame's timestamp against a fixed deadline, so frame-rate variance can
//! only delay completion until the next frame, never change the duration.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressTimer {
    started_ms: f64,
    duration_ms: f64,
}

impl ProgressTimer {
    /// Start a timer at `now_ms` (from `performance.now()` or [`now_ms`]).
    pub fn start(now_ms: f64, duration_ms: f64) -> Self {
        Self {
            started_ms: now_ms,
            duration_ms: duration_ms.max(0.0),
        }
    }

    pub fn deadline_ms(&self) -> f64 {
        self.started_ms + self.duration_ms
    }

    /// Fractional progress `elapsed / duration`, clamped to `[0, 1]`.
    pub fn fraction(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    pub fn is_done(&self, now_ms: f64) -> bool {
        now_ms >= self.deadline_ms()
    }
}

/// Monotonic milliseconds for the current frame.
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Monotonic milliseconds since the first call.
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static ORIGIN: OnceLock<Instant> = OnceLock::new();
    ORIGIN.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let t = ProgressTimer::start(1000.0, 3000.0);
        assert_eq!(t.fraction(1000.0), 0.0);
        assert!(!t.is_done(1000.0));
    }

    #[test]
    fn halfway() {
        let t = ProgressTimer::start(0.0, 3000.0);
        assert!((t.fraction(1500.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clamps_before_start_and_after_deadline() {
        let t = ProgressTimer::start(500.0, 1000.0);
        assert_eq!(t.fraction(0.0), 0.0);
        assert_eq!(t.fraction(10_000.0), 1.0);
    }

    #[test]
    fn done_exactly_at_deadline() {
        let t = ProgressTimer::start(0.0, 3000.0);
        assert!(!t.is_done(2999.9));
        assert!(t.is_done(3000.0));
        assert_eq!(t.deadline_ms(), 3000.0);
    }

    #[test]
    fn zero_duration_is_immediately_done() {
        let t = ProgressTimer::start(42.0, 0.0);
        assert!(t.is_done(42.0));
        assert_eq!(t.fraction(42.0), 1.0);
    }

    #[test]
    fn negative_duration_treated_as_zero() {
        let t = ProgressTimer::start(0.0, -5.0);
        assert_eq!(t.deadline_ms(), 0.0);
        assert!(t.is_done(0.0));
    }

    #[test]
    fn steady_60fps_finishes_within_one_frame() {
        let t = ProgressTimer::start(0.0, 3000.0);
        let frame = 16.667;
        let mut i = 0u32;
        while !t.is_done(i as f64 * frame) {
            i += 1;
        }
        let finished_at = i as f64 * frame;
        assert!(finished_at >= 3000.0);
        assert!(finished_at < 3000.0 + frame);
    }

    #[test]
    fn jittery_frames_never_overshoot_by_more_than_one_frame() {
        let t = ProgressTimer::start(100.0, 5000.0);
        let deltas = [16.0, 33.0, 8.0, 50.0, 16.0, 120.0, 4.0];
        let mut now = 100.0;
        let mut last = now;
        let mut k = 0;
        while !t.is_done(now) {
            last = now;
            now += deltas[k % deltas.len()];
            k += 1;
            assert!(t.fraction(now) >= t.fraction(last));
        }
        assert!(last < t.deadline_ms());
        assert!(now >= t.deadline_ms());
    }

    #[test]
    fn native_clock_is_monotonic() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }
}
