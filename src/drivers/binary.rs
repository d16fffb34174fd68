//! Framer for the sync-delimited float protocol.
//!
//! Frames look like `MARKER payload MARKER payload MARKER ...`, where the
//! payload is a run of little-endian `f32` values and the closing marker of
//! one frame doubles as the opening marker of the next.
/// Frame delimiter. Read as a little-endian `f32` this is `+inf`.
pub const MARKER: [u8; 4] = [0x00, 0x00, 0x80, 0x7F];
/// Upper bound on a single payload (64 channels).
pub const MAX_PAYLOAD_BYTES: usize = 256;
/// Scratch high-water mark; past this the unparsed tail is thrown away.
pub const MAX_SCRATCH_BYTES: usize = 100_000;
const MARKER_LEN: usize = MARKER.len();
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SyncState {
    SeekFirst,
    SeekSecond { payload_start: usize },
}
/// Why a candidate payload between two markers was thrown away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    Empty,
    Misaligned(usize),
    TooLong(usize),
    ChannelMismatch { expected: usize, actual: usize },
}
#[derive(Clone, Debug, PartialEq)]
pub enum FramerStep {
    Frame(Vec<f64>),
    Rejected(RejectReason),
    Overflow,
}
#[derive(Debug)]
pub struct BinaryFramer {
    scratch: Vec<u8>,
    state: SyncState,
}
impl Default for BinaryFramer {
    fn default() -> Self {
        Self::new()
    }
}
impl BinaryFramer {
    pub fn new() -> Self {
        Self {
            scratch: Vec::with_capacity(MAX_PAYLOAD_BYTES + 2 * MARKER_LEN),
            state: SyncState::SeekFirst,
        }
    }
    pub fn reset(&mut self) {
        self.scratch.clear();
        self.state = SyncState::SeekFirst;
    }
    pub fn is_synced(&self) -> bool {
        matches!(self.state, SyncState::SeekSecond { .. })
    }
    pub fn buffered_len(&self) -> usize {
        self.scratch.len()
    }
    /// Appends one byte. `expected_channels == 0` means no count is established yet.
    pub fn push(&mut self, byte: u8, expected_channels: usize) -> Option<FramerStep> {
        self.scratch.push(byte);
        if !self.scratch.ends_with(&MARKER) {
            return self.compact();
        }
        let marker_start = self.scratch.len() - MARKER_LEN;
        let step = match self.state {
            SyncState::SeekFirst => None,
            SyncState::SeekSecond { payload_start } => {
                // The marker cannot overlap itself, so marker_start >= payload_start.
                let payload = &self.scratch[payload_start..marker_start];
                Some(match decode_payload(payload, expected_channels) {
                    Ok(values) => FramerStep::Frame(values),
                    Err(reason) => FramerStep::Rejected(reason),
                })
            }
        };
        // Whether accepted or not, the marker just seen anchors the next candidate.
        self.scratch.drain(..marker_start);
        self.state = SyncState::SeekSecond {
            payload_start: MARKER_LEN,
        };
        step
    }
    fn compact(&mut self) -> Option<FramerStep> {
        match self.state {
            SyncState::SeekFirst => {
                // Only a marker straddling the next byte matters.
                if self.scratch.len() >= MARKER_LEN {
                    let keep_from = self.scratch.len() - (MARKER_LEN - 1);
                    self.scratch.drain(..keep_from);
                }
                None
            }
            SyncState::SeekSecond { .. } if self.scratch.len() > MAX_SCRATCH_BYTES => {
                let keep_from = self.scratch.len() - (MARKER_LEN - 1);
                self.scratch.drain(..keep_from);
                self.state = SyncState::SeekFirst;
                Some(FramerStep::Overflow)
            }
            SyncState::SeekSecond { .. } => None,
        }
    }
}
fn decode_payload(payload: &[u8], expected_channels: usize) -> Result<Vec<f64>, RejectReason> {
    if payload.is_empty() {
        return Err(RejectReason::Empty);
    }
    if payload.len() % 4 != 0 {
        return Err(RejectReason::Misaligned(payload.len()));
    }
    if payload.len() > MAX_PAYLOAD_BYTES {
        return Err(RejectReason::TooLong(payload.len()));
    }
    let channels = payload.len() / 4;
    if expected_channels > 0 && channels != expected_channels {
        return Err(RejectReason::ChannelMismatch {
            expected: expected_channels,
            actual: channels,
        });
    }
    Ok(payload
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
        .collect())
}
/// Encodes `frames` as a contiguous binary stream, markers included.
pub fn encode_frames<'a>(frames: impl IntoIterator<Item = &'a [f32]>) -> Vec<u8> {
    let mut out = MARKER.to_vec();
    for values in frames {
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&MARKER);
    }
    out
}
#[cfg(test)]
mod tests {
    use super::*;
    fn run(framer: &mut BinaryFramer, bytes: &[u8], expected: usize) -> Vec<FramerStep> {
        bytes
            .iter()
            .filter_map(|&b| framer.push(b, expected))
            .collect()
    }
    #[test]
    fn back_to_back_frames_share_markers() {
        let a = [1.0f32, 2.0];
        let b = [3.5f32, -4.25];
        let stream = encode_frames([&a[..], &b[..]]);
        let mut framer = BinaryFramer::new();
        let steps = run(&mut framer, &stream, 0);
        assert_eq!(
            steps,
            vec![
                FramerStep::Frame(vec![1.0, 2.0]),
                FramerStep::Frame(vec![3.5, -4.25]),
            ]
        );
        assert!(framer.is_synced());
        assert_eq!(framer.buffered_len(), MARKER_LEN);
    }
    #[test]
    fn leading_noise_is_skipped() {
        let mut stream = vec![0x12, 0x34, 0x00, 0x80];
        stream.extend(encode_frames([&[7.0f32][..]]));
        let mut framer = BinaryFramer::new();
        let steps = run(&mut framer, &stream, 0);
        assert_eq!(steps, vec![FramerStep::Frame(vec![7.0])]);
    }
    #[test]
    fn bad_candidates_are_rejected_and_reanchored() {
        let mut framer = BinaryFramer::new();
        let mut stream = MARKER.to_vec();
        stream.extend_from_slice(&[1, 2, 3]);
        stream.extend_from_slice(&MARKER);
        stream.extend_from_slice(&1.5f32.to_le_bytes());
        stream.extend_from_slice(&MARKER);
        let steps = run(&mut framer, &stream, 0);
        assert_eq!(
            steps,
            vec![
                FramerStep::Rejected(RejectReason::Misaligned(3)),
                FramerStep::Frame(vec![1.5]),
            ]
        );
    }
    #[test]
    fn payload_cap_and_channel_count_are_enforced() {
        let wide = vec![0.5f32; 65];
        let mut framer = BinaryFramer::new();
        let steps = run(&mut framer, &encode_frames([&wide[..]]), 0);
        assert_eq!(steps, vec![FramerStep::Rejected(RejectReason::TooLong(260))]);
        framer.reset();
        let steps = run(&mut framer, &encode_frames([&[1.0f32, 2.0][..]]), 3);
        assert_eq!(
            steps,
            vec![FramerStep::Rejected(RejectReason::ChannelMismatch {
                expected: 3,
                actual: 2
            })]
        );
    }
    #[test]
    fn overflow_drops_sync() {
        let mut framer = BinaryFramer::new();
        let mut stream = MARKER.to_vec();
        stream.extend(std::iter::repeat(0x11).take(MAX_SCRATCH_BYTES));
        let steps = run(&mut framer, &stream, 0);
        assert_eq!(steps, vec![FramerStep::Overflow]);
        assert!(!framer.is_synced());
        assert!(framer.buffered_len() < MARKER_LEN);
        let steps = run(&mut framer, &encode_frames([&[9.0f32][..]]), 0);
        assert_eq!(steps, vec![FramerStep::Frame(vec![9.0])]);
    }
}
