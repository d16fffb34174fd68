use std::collections::VecDeque;
use serde::Serialize;
use crate::drivers::SampleFrame;
/// Summary of everything seen on one channel since the last clear.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub current: f64,
}
#[derive(Clone, Copy, Debug)]
struct RunningStats {
    min: f64,
    max: f64,
    sum: f64,
    count: u64,
    last: f64,
}
impl Default for RunningStats {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            count: 0,
            last: 0.0,
        }
    }
}
impl RunningStats {
    fn update(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
        self.last = value;
    }
    fn snapshot(&self) -> Option<ChannelStats> {
        if self.count == 0 {
            return None;
        }
        Some(ChannelStats {
            min: self.min,
            max: self.max,
            avg: self.sum / self.count as f64,
            current: self.last,
        })
    }
}
/// Fixed-capacity history of the most recent frames, oldest at index 0.
///
/// Channel statistics are updated on every insert and are never recomputed
/// from the retained frames, so they keep covering frames that have already
/// been evicted until [`RollingStore::clear`].
pub struct RollingStore {
    frames: VecDeque<SampleFrame>,
    capacity: usize,
    stats: Vec<RunningStats>,
}
impl RollingStore {
    /// `capacity` is raised to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            stats: Vec::new(),
        }
    }
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Occupancy in `[0, 1]`.
    pub fn fullness(&self) -> f64 {
        self.frames.len() as f64 / self.capacity as f64
    }
    /// Widest frame seen since the last clear.
    pub fn max_channels(&self) -> usize {
        self.stats.len()
    }
    pub fn push(&mut self, frame: SampleFrame) {
        self.record_stats(&frame);
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }
    pub fn push_batch(&mut self, frames: impl IntoIterator<Item = SampleFrame>) {
        for frame in frames {
            self.push(frame);
        }
    }
    pub fn get(&self, index: usize) -> Option<&SampleFrame> {
        self.frames.get(index)
    }
    /// Frames in `[start, end)`, clamped to what is stored.
    pub fn get_range(&self, start: usize, end: usize) -> Vec<SampleFrame> {
        let end = end.min(self.frames.len());
        if start >= end {
            return Vec::new();
        }
        self.frames.range(start..end).cloned().collect()
    }
    pub fn iter(&self) -> impl Iterator<Item = &SampleFrame> {
        self.frames.iter()
    }
    pub fn clear(&mut self) {
        self.frames.clear();
        self.stats.clear();
    }
    /// Keeps the newest `min(len, new_capacity)` frames. Statistics are untouched.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(1);
        let mut retained = self.export_all();
        if retained.len() > new_capacity {
            retained.drain(..retained.len() - new_capacity);
        }
        self.capacity = new_capacity;
        self.frames = VecDeque::from(retained);
    }
    pub fn export_all(&self) -> Vec<SampleFrame> {
        self.frames.iter().cloned().collect()
    }
    /// Replaces contents and statistics with `frames`, keeping the newest that fit.
    pub fn import_replacing_all(&mut self, frames: Vec<SampleFrame>) {
        self.clear();
        let skip = frames.len().saturating_sub(self.capacity);
        self.push_batch(frames.into_iter().skip(skip));
    }
    pub fn channel_stats(&self, channel: usize) -> Option<ChannelStats> {
        self.stats.get(channel).and_then(RunningStats::snapshot)
    }
    fn record_stats(&mut self, frame: &SampleFrame) {
        if frame.values.len() > self.stats.len() {
            self.stats.resize(frame.values.len(), RunningStats::default());
        }
        for (stats, &value) in self.stats.iter_mut().zip(&frame.values) {
            stats.update(value);
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn frame(i: usize) -> SampleFrame {
        SampleFrame::new(i as f64, vec![i as f64])
    }
    #[test]
    fn keeps_newest_frames_in_order() {
        let mut store = RollingStore::new(1_000);
        store.push_batch((0..1_250).map(frame));
        assert_eq!(store.len(), 1_000);
        assert_eq!(store.get(0), Some(&frame(250)));
        assert_eq!(store.get(999), Some(&frame(1_249)));
        assert!(store.get(1_000).is_none());
        let range = store.get_range(10, 13);
        assert_eq!(range, vec![frame(260), frame(261), frame(262)]);
        assert!(store.get_range(5, 5).is_empty());
        assert_eq!(store.get_range(998, 5_000).len(), 2);
    }
    #[test]
    fn channel_stats_are_running() {
        let mut store = RollingStore::new(3);
        for v in [3.0, -1.0, 4.0, 1.0, 5.0] {
            store.push(SampleFrame::new(0.0, vec![v]));
        }
        let stats = store.channel_stats(0).unwrap();
        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 5.0);
        assert!((stats.avg - 2.4).abs() < 1e-12);
        assert_eq!(stats.current, 5.0);
        assert!(store.channel_stats(1).is_none());
        store.clear();
        assert!(store.channel_stats(0).is_none());
        assert_eq!(store.max_channels(), 0);
    }
    #[test]
    fn ragged_frames_grow_stats() {
        let mut store = RollingStore::new(10);
        store.push(SampleFrame::new(0.0, vec![1.0]));
        store.push(SampleFrame::new(1.0, vec![2.0, 8.0]));
        assert_eq!(store.max_channels(), 2);
        assert_eq!(store.channel_stats(0).unwrap().avg, 1.5);
        assert_eq!(store.channel_stats(1).unwrap().min, 8.0);
    }
    #[test]
    fn resize_keeps_most_recent() {
        let mut store = RollingStore::new(1_000);
        store.push_batch((0..1_000).map(frame));
        store.resize(500);
        assert_eq!(store.capacity(), 500);
        assert_eq!(store.len(), 500);
        let kept = store.export_all();
        assert_eq!(kept.first(), Some(&frame(500)));
        assert_eq!(kept.last(), Some(&frame(999)));
        assert!(kept.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
        // Statistics still cover the evicted half.
        assert_eq!(store.channel_stats(0).unwrap().min, 0.0);
        store.resize(2_000);
        assert_eq!(store.len(), 500);
        store.push(frame(1_000));
        assert_eq!(store.len(), 501);
    }
    #[test]
    fn huge_capacity_does_not_preallocate() {
        let mut store = RollingStore::new(10);
        store.push_batch((0..3).map(frame));
        store.resize(usize::MAX);
        assert_eq!(store.capacity(), usize::MAX);
        assert_eq!(store.len(), 3);
        store.push(frame(3));
        assert_eq!(store.get(3), Some(&frame(3)));
    }
    #[test]
    fn import_replaces_contents_and_stats() {
        let mut store = RollingStore::new(4);
        store.push(SampleFrame::new(0.0, vec![-100.0]));
        store.import_replacing_all((0..6).map(frame).collect());
        assert_eq!(store.export_all(), (2..6).map(frame).collect::<Vec<_>>());
        assert_eq!(store.channel_stats(0).unwrap().min, 2.0);
        assert!((store.fullness() - 1.0).abs() < f64::EPSILON);
    }
}
