use std::time::{Duration, Instant};
const WINDOW: Duration = Duration::from_secs(1);
/// Once-per-second sample rate estimate. No smoothing: each window's
/// count divided by its true length replaces the previous value.
pub struct RateMeter {
    count: u64,
    window_start: Instant,
    rate_hz: f64,
}
impl RateMeter {
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            rate_hz: 0.0,
        }
    }
    /// Counts `samples` and returns the fresh rate when a window closed.
    pub fn record(&mut self, samples: usize, now: Instant) -> Option<f64> {
        self.count += samples as u64;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < WINDOW {
            return None;
        }
        self.rate_hz = self.count as f64 / elapsed.as_secs_f64();
        self.count = 0;
        self.window_start = now;
        Some(self.rate_hz)
    }
    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }
}
