// src/config.rs
use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::drivers::decoder::MAX_CHANNELS;
use crate::drivers::{BatchTiming, ScopeError, WireFormat};
pub const MIN_BUFFER_CAPACITY: usize = 1_000;
pub const MAX_BUFFER_CAPACITY: usize = 1_000_000;
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub idle_delay_ms: u64,
}
impl Default for BatchConfig {
    fn default() -> Self {
        // 16 ms is one 60 Hz display frame.
        Self {
            min_interval_ms: 16,
            max_interval_ms: 100,
            idle_delay_ms: 50,
        }
    }
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}
fn default_baud_rate() -> u32 {
    115_200
}
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulateConfig {
    pub channels: usize,
    pub rate_hz: f64,
}
impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            channels: 4,
            rate_hz: 1_000.0,
        }
    }
}
/// Everything the capture core reads from the outside world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    pub format: WireFormat,
    /// Fixed channel count; `None` learns it from the stream.
    pub channel_count: Option<usize>,
    pub buffer_capacity: usize,
    /// Read-time scale per channel, 1.0 where missing.
    pub coefficients: Vec<f64>,
    pub batch: BatchConfig,
    pub serial: Option<SerialConfig>,
    pub simulate: SimulateConfig,
}
impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            format: WireFormat::Binary,
            channel_count: None,
            buffer_capacity: 100_000,
            coefficients: Vec::new(),
            batch: BatchConfig::default(),
            serial: None,
            simulate: SimulateConfig::default(),
        }
    }
}
impl ScopeConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScopeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
    pub fn from_json(text: &str) -> Result<Self, ScopeError> {
        let config: ScopeConfig = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }
    /// Clamps out-of-range values instead of rejecting them.
    pub fn sanitized(mut self) -> Self {
        self.buffer_capacity = self
            .buffer_capacity
            .clamp(MIN_BUFFER_CAPACITY, MAX_BUFFER_CAPACITY);
        self.channel_count = self.channel_count.map(|c| c.clamp(1, MAX_CHANNELS));
        for c in &mut self.coefficients {
            if !c.is_finite() {
                *c = 1.0;
            }
        }
        self.batch.min_interval_ms = self.batch.min_interval_ms.max(1);
        self.batch.max_interval_ms = self.batch.max_interval_ms.max(self.batch.min_interval_ms);
        self
    }
    pub fn batch_timing(&self) -> BatchTiming {
        BatchTiming {
            min_interval: Duration::from_millis(self.batch.min_interval_ms),
            max_interval: Duration::from_millis(self.batch.max_interval_ms),
            idle_delay: Duration::from_millis(self.batch.idle_delay_ms),
        }
    }
}
