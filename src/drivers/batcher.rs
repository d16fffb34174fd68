use std::time::{Duration, Instant};
use log::debug;
use crate::drivers::decoder::FrameSink;
use crate::drivers::SampleFrame;
/// Flush cadence. The interval widens from `min_interval` towards
/// `max_interval` as the downstream fullness signal rises.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchTiming {
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub idle_delay: Duration,
}
impl Default for BatchTiming {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(16),
            max_interval: Duration::from_millis(100),
            idle_delay: Duration::from_millis(50),
        }
    }
}
/// Frames released together, tagged with their generation order.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameBatch {
    pub sequence: u64,
    pub frames: Vec<SampleFrame>,
}
/// Time-bounded accumulator between the decoder and the store.
///
/// Nothing here owns a timer: callers ask for [`FrameBatcher::next_deadline`]
/// and call [`FrameBatcher::poll`] once it has passed.
pub struct FrameBatcher {
    timing: BatchTiming,
    pending: Vec<SampleFrame>,
    last_flush: Instant,
    idle_deadline: Option<Instant>,
    fullness: f64,
    next_sequence: u64,
}
impl FrameBatcher {
    pub fn new(timing: BatchTiming, now: Instant) -> Self {
        let max_interval = timing.max_interval.max(timing.min_interval);
        Self {
            timing: BatchTiming {
                max_interval,
                ..timing
            },
            pending: Vec::new(),
            last_flush: now,
            idle_deadline: None,
            fullness: 0.0,
            next_sequence: 0,
        }
    }
    pub fn timing(&self) -> BatchTiming {
        self.timing
    }
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
    /// Occupancy of whatever the batches feed into, in `[0, 1]`.
    pub fn set_fullness(&mut self, fullness: f64) {
        self.fullness = if fullness.is_nan() {
            0.0
        } else {
            fullness.clamp(0.0, 1.0)
        };
    }
    pub fn current_interval(&self) -> Duration {
        let span = self.timing.max_interval - self.timing.min_interval;
        self.timing.min_interval + span.mul_f64(self.fullness)
    }
    pub fn push(&mut self, frame: SampleFrame, now: Instant) {
        self.pending.push(frame);
        self.idle_deadline = Some(now + self.timing.idle_delay);
    }
    /// Earliest instant at which [`poll`](Self::poll) could release a batch.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.pending.is_empty() {
            return None;
        }
        let interval_due = self.last_flush + self.current_interval();
        Some(match self.idle_deadline {
            Some(idle) => idle.min(interval_due),
            None => interval_due,
        })
    }
    pub fn poll(&mut self, now: Instant) -> Option<FrameBatch> {
        let due = self.next_deadline()?;
        if now < due {
            return None;
        }
        self.last_flush = now;
        self.idle_deadline = None;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Some(FrameBatch {
            sequence,
            frames: std::mem::take(&mut self.pending),
        })
    }
    /// Drops the pending partial batch and cancels the idle flush.
    pub fn reset(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        self.idle_deadline = None;
        if dropped > 0 {
            debug!("batcher reset discarded {} pending frames", dropped);
        }
        dropped
    }
}
impl FrameSink for FrameBatcher {
    fn accept(&mut self, frame: SampleFrame) {
        self.push(frame, Instant::now());
    }
}
