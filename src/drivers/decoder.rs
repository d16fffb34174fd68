use std::time::Instant;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use crate::drivers::binary::{BinaryFramer, FramerStep, MAX_PAYLOAD_BYTES};
use crate::drivers::text::{parse_line, LineEvent, LineSplitter, ParsedLine};
use crate::drivers::SampleFrame;
/// Most channels a binary frame may carry.
pub const MAX_CHANNELS: usize = MAX_PAYLOAD_BYTES / 4;
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Marker-delimited little-endian f32 frames.
    #[default]
    Binary,
    /// Comma-separated numeric lines.
    Text,
}
/// Receives frames as soon as they are validated.
pub trait FrameSink {
    fn accept(&mut self, frame: SampleFrame);
}
impl FrameSink for Vec<SampleFrame> {
    fn accept(&mut self, frame: SampleFrame) {
        self.push(frame);
    }
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecoderCounters {
    pub bytes_received: u64,
    pub frames_decoded: u64,
    pub candidates_rejected: u64,
    pub lines_discarded: u64,
    pub lines_skipped: u64,
    pub overflows: u64,
}
/// Stateful byte-stream decoder for one instrument connection.
pub struct ProtocolDecoder {
    format: WireFormat,
    binary: BinaryFramer,
    lines: LineSplitter,
    channel_count: usize,
    counters: DecoderCounters,
    origin: Instant,
}
impl Default for ProtocolDecoder {
    fn default() -> Self {
        Self::new(WireFormat::default())
    }
}
impl ProtocolDecoder {
    pub fn new(format: WireFormat) -> Self {
        Self {
            format,
            binary: BinaryFramer::new(),
            lines: LineSplitter::new(),
            channel_count: 0,
            counters: DecoderCounters::default(),
            origin: Instant::now(),
        }
    }
    pub fn format(&self) -> WireFormat {
        self.format
    }
    /// Established channel count, 0 while still unknown.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }
    /// Pins the expected channel count; 0 goes back to learning it from the stream.
    pub fn set_channel_count(&mut self, channels: usize) {
        self.channel_count = channels.min(MAX_CHANNELS);
    }
    pub fn counters(&self) -> DecoderCounters {
        self.counters
    }
    /// Switches protocol, dropping any partially received frame.
    pub fn set_format(&mut self, format: WireFormat) {
        if format != self.format {
            info!("decoder format {:?} -> {:?}", self.format, format);
        }
        self.format = format;
        self.reset();
    }
    /// Clears parsing state; channel count and counters survive.
    pub fn reset(&mut self) {
        self.binary.reset();
        self.lines.reset();
    }
    pub fn full_reset(&mut self) {
        self.reset();
        self.channel_count = 0;
        self.counters = DecoderCounters::default();
        info!("decoder fully reset");
    }
    /// Decodes a chunk, stamping frames with the decoder's monotonic clock.
    pub fn feed(&mut self, bytes: &[u8], sink: &mut impl FrameSink) -> usize {
        let now_ms = self.origin.elapsed().as_secs_f64() * 1000.0;
        self.feed_at(bytes, now_ms, sink)
    }
    /// Decodes a chunk with an explicit timestamp. Returns the number of frames emitted.
    pub fn feed_at(&mut self, bytes: &[u8], timestamp_ms: f64, sink: &mut impl FrameSink) -> usize {
        self.counters.bytes_received += bytes.len() as u64;
        let before = self.counters.frames_decoded;
        match self.format {
            WireFormat::Binary => self.feed_binary(bytes, timestamp_ms, sink),
            WireFormat::Text => self.feed_text(bytes, timestamp_ms, sink),
        }
        (self.counters.frames_decoded - before) as usize
    }
    fn feed_binary(&mut self, bytes: &[u8], timestamp_ms: f64, sink: &mut impl FrameSink) {
        for &byte in bytes {
            match self.binary.push(byte, self.channel_count) {
                None => {}
                Some(FramerStep::Frame(values)) => {
                    self.learn_channel_count(values.len());
                    self.emit(values, timestamp_ms, sink);
                }
                Some(FramerStep::Rejected(reason)) => {
                    self.counters.candidates_rejected += 1;
                    debug!("binary candidate rejected: {:?}", reason);
                }
                Some(FramerStep::Overflow) => {
                    self.counters.overflows += 1;
                    warn!("binary scratch buffer overflowed; resynchronising");
                }
            }
        }
    }
    fn feed_text(&mut self, bytes: &[u8], timestamp_ms: f64, sink: &mut impl FrameSink) {
        for &byte in bytes {
            match self.lines.push(byte) {
                None => {}
                Some(LineEvent::Line(line)) => match parse_line(&line) {
                    ParsedLine::Values(values) => self.emit(values, timestamp_ms, sink),
                    ParsedLine::Blank => {}
                    ParsedLine::Reserved => self.counters.lines_skipped += 1,
                    ParsedLine::Malformed => {
                        self.counters.lines_discarded += 1;
                        debug!("discarded malformed line {:?}", line);
                    }
                },
                Some(LineEvent::Overflow) => {
                    self.counters.overflows += 1;
                    warn!("line buffer overflowed without a terminator; truncated");
                }
            }
        }
    }
    // Only ever raises the visible count; a mismatch is rejected before it gets here.
    fn learn_channel_count(&mut self, channels: usize) {
        if channels > self.channel_count {
            info!("channel count {} -> {}", self.channel_count, channels);
            self.channel_count = channels;
        }
    }
    fn emit(&mut self, values: Vec<f64>, timestamp_ms: f64, sink: &mut impl FrameSink) {
        self.counters.frames_decoded += 1;
        sink.accept(SampleFrame::new(timestamp_ms, values));
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::binary::{encode_frames, MARKER};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    fn sample_frames(count: usize, channels: usize) -> Vec<Vec<f32>> {
        (0..count)
            .map(|i| (0..channels).map(|c| i as f32 * 0.5 - c as f32).collect())
            .collect()
    }
    #[test]
    fn chunking_does_not_change_output() {
        let frames = sample_frames(200, 4);
        let stream = encode_frames(frames.iter().map(|f| f.as_slice()));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut decoder = ProtocolDecoder::new(WireFormat::Binary);
            let mut out = Vec::new();
            let mut rest = &stream[..];
            while !rest.is_empty() {
                let take = rng.gen_range(1..=rest.len().min(37));
                let (chunk, tail) = rest.split_at(take);
                decoder.feed_at(chunk, 0.0, &mut out);
                rest = tail;
            }
            assert_eq!(out.len(), frames.len());
            for (got, want) in out.iter().zip(&frames) {
                let want: Vec<f64> = want.iter().map(|&v| v as f64).collect();
                assert_eq!(got.values, want);
            }
            assert_eq!(decoder.channel_count(), 4);
        }
    }
    #[test]
    fn embedded_marker_does_not_end_session() {
        let good = sample_frames(3, 3);
        let mut stream = encode_frames(good.iter().map(|f| f.as_slice()));
        // A payload whose middle value is bit-identical to the marker.
        stream.extend_from_slice(&1.0f32.to_le_bytes());
        stream.extend_from_slice(&MARKER);
        stream.extend_from_slice(&2.0f32.to_le_bytes());
        stream.extend_from_slice(&MARKER);
        let after = [[10.0f32, 11.0, 12.0], [13.0, 14.0, 15.0]];
        for f in &after {
            for v in f {
                stream.extend_from_slice(&v.to_le_bytes());
            }
            stream.extend_from_slice(&MARKER);
        }
        let mut decoder = ProtocolDecoder::new(WireFormat::Binary);
        let mut out = Vec::new();
        decoder.feed_at(&stream, 0.0, &mut out);
        assert_eq!(out.len(), 5);
        assert_eq!(out[3].values, vec![10.0, 11.0, 12.0]);
        assert_eq!(out[4].values, vec![13.0, 14.0, 15.0]);
        assert_eq!(decoder.counters().candidates_rejected, 2);
    }
    #[test]
    fn text_lines_follow_protocol_rules() {
        let mut decoder = ProtocolDecoder::new(WireFormat::Text);
        let mut out = Vec::new();
        decoder.feed_at(b"tag:1,2,abc\n1,2,3\r\nimage:4,5\nch:4.5\n", 1.0, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].values, vec![1.0, 2.0, 3.0]);
        assert_eq!(out[1].values, vec![4.5]);
        let counters = decoder.counters();
        assert_eq!(counters.lines_discarded, 1);
        assert_eq!(counters.lines_skipped, 1);
    }
    #[test]
    fn reset_keeps_learned_state_full_reset_clears_it() {
        let mut decoder = ProtocolDecoder::new(WireFormat::Binary);
        let mut out = Vec::new();
        let frames = sample_frames(2, 2);
        decoder.feed_at(&encode_frames(frames.iter().map(|f| f.as_slice())), 0.0, &mut out);
        assert_eq!(decoder.channel_count(), 2);
        // Partial frame in flight when reset arrives.
        decoder.feed_at(&[1, 2, 3], 0.0, &mut out);
        decoder.reset();
        assert_eq!(decoder.channel_count(), 2);
        assert_eq!(decoder.counters().frames_decoded, 2);
        decoder.full_reset();
        assert_eq!(decoder.channel_count(), 0);
        assert_eq!(decoder.counters(), DecoderCounters::default());
    }
    #[test]
    fn format_switch_discards_partial_line() {
        let mut decoder = ProtocolDecoder::new(WireFormat::Text);
        let mut out = Vec::new();
        decoder.feed_at(b"1,2", 0.0, &mut out);
        decoder.set_format(WireFormat::Text);
        decoder.feed_at(b"4\n", 0.0, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values, vec![4.0]);
    }
    #[test]
    fn explicit_channel_count_filters_frames() {
        let mut decoder = ProtocolDecoder::new(WireFormat::Binary);
        decoder.set_channel_count(3);
        let mut out = Vec::new();
        let two = sample_frames(1, 2);
        let three = sample_frames(1, 3);
        let stream = encode_frames([two[0].as_slice(), three[0].as_slice()]);
        assert_eq!(decoder.feed_at(&stream, 0.0, &mut out), 1);
        assert_eq!(out[0].values.len(), 3);
    }
}
