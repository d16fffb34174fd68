use std::sync::{Arc, Mutex};
use std::time::Instant;
use log::info;
use crate::drivers::batcher::{BatchTiming, FrameBatch, FrameBatcher};
use crate::drivers::decimate::{display_series, DisplaySeries};
use crate::drivers::decoder::{ProtocolDecoder, WireFormat};
use crate::drivers::error::ScopeError;
use crate::drivers::rate::RateMeter;
use crate::drivers::source::ByteSource;
use crate::drivers::{RollingStore, SampleFrame};
/// Store handle shared between the producer and any number of readers.
pub type SharedStore = Arc<Mutex<RollingStore>>;
const READ_CHUNK_BYTES: usize = 4_096;
/// What a single [`ScopePipeline::pump_once`] call did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PumpReport {
    pub bytes_read: usize,
    pub frames_decoded: usize,
    pub frames_stored: usize,
    /// Set when the one-second rate window closed during this pump.
    pub rate_hz: Option<f64>,
}
/// Source -> decoder -> batcher -> store, driven from one execution context.
pub struct ScopePipeline<S: ByteSource> {
    source: S,
    decoder: ProtocolDecoder,
    batcher: FrameBatcher,
    store: SharedStore,
    rate: RateMeter,
    read_buf: Vec<u8>,
    decoded: Vec<SampleFrame>,
}
impl<S: ByteSource> ScopePipeline<S> {
    pub fn new(source: S, format: WireFormat, capacity: usize, timing: BatchTiming) -> Self {
        let now = Instant::now();
        Self {
            source,
            decoder: ProtocolDecoder::new(format),
            batcher: FrameBatcher::new(timing, now),
            store: Arc::new(Mutex::new(RollingStore::new(capacity))),
            rate: RateMeter::new(now),
            read_buf: vec![0; READ_CHUNK_BYTES],
            decoded: Vec::new(),
        }
    }
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }
    pub fn decoder(&self) -> &ProtocolDecoder {
        &self.decoder
    }
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
    pub fn rate_hz(&self) -> f64 {
        self.rate.rate_hz()
    }
    pub fn next_deadline(&self) -> Option<Instant> {
        self.batcher.next_deadline()
    }
    /// Decoder's established count, else the widest frame stored so far.
    pub fn channel_count(&self) -> Result<usize, ScopeError> {
        match self.decoder.channel_count() {
            0 => Ok(self.store.lock()?.max_channels()),
            n => Ok(n),
        }
    }
    pub fn set_channel_count(&mut self, channels: usize) {
        self.decoder.set_channel_count(channels);
    }
    /// Switches protocol; the in-flight frame and pending batch are dropped, not delivered.
    pub fn set_format(&mut self, format: WireFormat) {
        self.decoder.set_format(format);
        self.batcher.reset();
    }
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.batcher.reset();
    }
    pub fn full_reset(&mut self) -> Result<(), ScopeError> {
        self.decoder.full_reset();
        self.batcher.reset();
        self.rate.reset(Instant::now());
        self.store.lock()?.clear();
        Ok(())
    }
    pub fn clear(&mut self) -> Result<(), ScopeError> {
        self.batcher.reset();
        self.store.lock()?.clear();
        Ok(())
    }
    pub fn resize(&mut self, capacity: usize) -> Result<(), ScopeError> {
        let mut store = self.store.lock()?;
        store.resize(capacity);
        info!("store capacity now {}", store.capacity());
        Ok(())
    }
    /// One read, decode and (if due) flush step. Never blocks beyond the source's own timeout.
    pub fn pump_once(&mut self, now: Instant) -> Result<PumpReport, ScopeError> {
        let mut report = PumpReport::default();
        report.bytes_read = self.source.read_chunk(&mut self.read_buf)?;
        if report.bytes_read > 0 {
            report.frames_decoded = self
                .decoder
                .feed(&self.read_buf[..report.bytes_read], &mut self.decoded);
            for frame in self.decoded.drain(..) {
                self.batcher.push(frame, now);
            }
        }
        if let Some(batch) = self.batcher.poll(now) {
            report.frames_stored = self.deliver(batch)?;
        }
        report.rate_hz = self.rate.record(report.frames_stored, now);
        Ok(report)
    }
    pub fn display_series(&self, coefficients: &[f64]) -> Result<Option<DisplaySeries>, ScopeError> {
        let channels = self.channel_count()?;
        let store = self.store.lock()?;
        Ok(display_series(&store, channels, coefficients))
    }
    fn deliver(&mut self, batch: FrameBatch) -> Result<usize, ScopeError> {
        let count = batch.frames.len();
        let fullness = {
            let mut store = self.store.lock()?;
            store.push_batch(batch.frames);
            store.fullness()
        };
        self.batcher.set_fullness(fullness);
        Ok(count)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::binary::encode_frames;
    use crate::drivers::source::ManualSource;
    use std::time::Duration;
    fn binary_chunks(frames: usize) -> Vec<Vec<u8>> {
        let values: Vec<[f32; 2]> = (0..frames).map(|i| [i as f32, -(i as f32)]).collect();
        let stream = encode_frames(values.iter().map(|v| &v[..]));
        stream.chunks(13).map(|c| c.to_vec()).collect()
    }
    #[test]
    fn pipeline_moves_frames_into_store() {
        let source = ManualSource::new(binary_chunks(300));
        let mut pipeline =
            ScopePipeline::new(source, WireFormat::Binary, 1_000, BatchTiming::default());
        let t0 = Instant::now();
        let mut stored = 0;
        for step in 0..2_000u64 {
            let report = pipeline.pump_once(t0 + Duration::from_millis(step)).unwrap();
            stored += report.frames_stored;
        }
        assert_eq!(stored, 300);
        assert_eq!(pipeline.channel_count().unwrap(), 2);
        let store = pipeline.store();
        let store = store.lock().unwrap();
        assert_eq!(store.len(), 300);
        assert_eq!(store.get(299).unwrap().values, vec![299.0, -299.0]);
        let stats = store.channel_stats(1).unwrap();
        assert_eq!(stats.min, -299.0);
        assert_eq!(stats.current, -299.0);
    }
    #[test]
    fn format_switch_drops_pending_batch() {
        let source = ManualSource::new(vec![b"1,2\n3,4\n".to_vec()]);
        let slow = BatchTiming {
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(1),
            idle_delay: Duration::from_secs(1),
        };
        let mut pipeline = ScopePipeline::new(source, WireFormat::Text, 1_000, slow);
        let t0 = Instant::now();
        let report = pipeline.pump_once(t0).unwrap();
        assert_eq!(report.frames_decoded, 2);
        assert_eq!(report.frames_stored, 0);
        pipeline.set_format(WireFormat::Binary);
        assert!(pipeline.next_deadline().is_none());
        pipeline.pump_once(t0 + Duration::from_secs(5)).unwrap();
        assert!(pipeline.store().lock().unwrap().is_empty());
        assert!(pipeline.display_series(&[]).unwrap().is_none());
    }
    #[test]
    fn display_series_uses_learned_channels() {
        let source = ManualSource::new(binary_chunks(10));
        let mut pipeline =
            ScopePipeline::new(source, WireFormat::Binary, 1_000, BatchTiming::default());
        let t0 = Instant::now();
        for step in 0..200u64 {
            pipeline.pump_once(t0 + Duration::from_millis(step)).unwrap();
        }
        let series = pipeline.display_series(&[1.0, 10.0]).unwrap().unwrap();
        assert_eq!(series.channels.len(), 2);
        assert_eq!(series.channels[1][3], -30.0);
        pipeline.full_reset().unwrap();
        assert_eq!(pipeline.channel_count().unwrap(), 0);
        assert_eq!(pipeline.decoder().counters().frames_decoded, 0);
    }
}
