use std::time::Instant;

/// Delta reported for the first sample after a reset (one 60 Hz frame).
const RESET_DELTA: f32 = 1.0 / 60.0;

/// Monotonic frame timer.
///
/// `total()` is seconds since the last reset and `delta()` is seconds since the
/// previous `update()`. Both are never negative.
#[derive(Debug, Clone)]
pub struct BasicTimer {
    start: Instant,
    last: Instant,
    total: f32,
    delta: f32,
}

impl BasicTimer {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            total: 0.0,
            delta: RESET_DELTA,
        }
    }

    /// Restarts elapsed time at zero.
    pub fn reset(&mut self) {
        self.reset_at(Instant::now());
    }

    /// Samples the clock.
    pub fn update(&mut self) {
        self.update_at(Instant::now());
    }

    #[inline]
    pub fn total(&self) -> f32 {
        self.total
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    fn reset_at(&mut self, now: Instant) {
        self.start = now;
        self.last = now;
        self.total = 0.0;
        self.delta = RESET_DELTA;
    }

    fn update_at(&mut self, now: Instant) {
        self.total = now.saturating_duration_since(self.start).as_secs_f32();

        self.delta = if self.last == self.start {
            RESET_DELTA
        } else {
            now.saturating_duration_since(self.last).as_secs_f32()
        };

        self.last = now;
    }
}

impl Default for BasicTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_update_after_reset_reports_sixty_hz() {
        let t0 = Instant::now();
        let mut timer = BasicTimer::new();
        timer.reset_at(t0);
        timer.update_at(t0 + Duration::from_millis(5));
        assert_eq!(timer.delta(), RESET_DELTA);
        assert!((timer.total() - 0.005).abs() < 1.0e-6);
    }

    #[test]
    fn later_updates_report_elapsed_delta() {
        let t0 = Instant::now();
        let mut timer = BasicTimer::new();
        timer.reset_at(t0);
        timer.update_at(t0 + Duration::from_millis(10));
        timer.update_at(t0 + Duration::from_millis(30));
        assert!((timer.delta() - 0.020).abs() < 1.0e-6);
        assert!((timer.total() - 0.030).abs() < 1.0e-6);
    }

    #[test]
    fn clock_going_backwards_never_yields_negative_values() {
        let t0 = Instant::now() + Duration::from_secs(1);
        let mut timer = BasicTimer::new();
        timer.reset_at(t0);
        timer.update_at(t0 + Duration::from_millis(10));
        timer.update_at(t0);
        assert!(timer.delta() >= 0.0);
        assert!(timer.total() >= 0.0);
    }

    #[test]
    fn reset_zeroes_total() {
        let t0 = Instant::now();
        let mut timer = BasicTimer::new();
        timer.reset_at(t0);
        timer.update_at(t0 + Duration::from_secs(2));
        timer.reset_at(t0 + Duration::from_secs(3));
        assert_eq!(timer.total(), 0.0);
        assert_eq!(timer.delta(), RESET_DELTA);
    }
}
