use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::binary::MARKER;
use crate::drivers::ScopeError;
/// Anything that hands over raw bytes in arbitrary chunks.
///
/// `read_chunk` returns `Ok(0)` when nothing is available right now; it
/// must not block for longer than the transport's own short timeout.
pub trait ByteSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ScopeError>;
}
/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Vec<u8>>,
}
impl ManualSource {
    pub fn new(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            queue: chunks.into_iter().collect(),
        }
    }
    pub fn push(&mut self, chunk: Vec<u8>) {
        self.queue.push_back(chunk);
    }
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty()
    }
}
impl ByteSource for ManualSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ScopeError> {
        let Some(mut chunk) = self.queue.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.queue.push_front(chunk);
        }
        Ok(n)
    }
}
/// Serial port adapter (USB CDC, FTDI, ...).
pub struct SerialSource {
    port: Box<dyn serialport::SerialPort>,
}
impl SerialSource {
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ScopeError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;
        info!("opened serial port {} @ {} baud", port_name, baud_rate);
        Ok(Self { port })
    }
    pub fn available_ports() -> Result<Vec<String>, ScopeError> {
        Ok(serialport::available_ports()?
            .into_iter()
            .map(|p| p.port_name)
            .collect())
    }
}
impl ByteSource for SerialSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ScopeError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}
/// Synthetic binary-protocol instrument: a few sines plus noise and the
/// occasional spike, paced by wall-clock time.
pub struct SimulatedSource {
    channels: usize,
    rate_hz: f64,
    started_at: Instant,
    emitted: u64,
    rng: StdRng,
    pending: VecDeque<u8>,
}
impl SimulatedSource {
    pub fn new(channels: usize, rate_hz: f64) -> Self {
        Self {
            channels: channels.clamp(1, 64),
            rate_hz: if rate_hz.is_finite() && rate_hz > 0.0 {
                rate_hz
            } else {
                1_000.0
            },
            started_at: Instant::now(),
            emitted: 0,
            rng: StdRng::from_entropy(),
            pending: MARKER.iter().copied().collect(),
        }
    }
    fn generate(&mut self, frames: u64) {
        for _ in 0..frames {
            let t = self.emitted as f64 / self.rate_hz;
            for ch in 0..self.channels {
                let freq = 1.0 + ch as f64 * 0.5;
                let mut v = (2.0 * std::f64::consts::PI * freq * t).sin() * 100.0;
                v += self.rng.gen_range(-5.0..5.0);
                if self.rng.gen_ratio(1, 20_000) {
                    v += 1_000.0;
                }
                self.pending.extend((v as f32).to_le_bytes());
            }
            self.pending.extend(MARKER);
            self.emitted += 1;
        }
    }
}
impl ByteSource for SimulatedSource {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, ScopeError> {
        let due = (self.started_at.elapsed().as_secs_f64() * self.rate_hz) as u64;
        if due > self.emitted {
            self.generate(due - self.emitted);
        }
        let n = self.pending.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
