use serde::{Deserialize, Serialize};
/// One multi-channel observation as it leaves the decoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleFrame {
    /// Milliseconds since the decoder's clock origin.
    pub timestamp_ms: f64,
    pub values: Vec<f64>,
}
impl SampleFrame {
    pub fn new(timestamp_ms: f64, values: Vec<f64>) -> Self {
        Self {
            timestamp_ms,
            values,
        }
    }
    pub fn channel_count(&self) -> usize {
        self.values.len()
    }
    /// Largest absolute value across the first `channels` values, ignoring NaN.
    pub fn peak_magnitude(&self, channels: usize) -> f64 {
        self.values
            .iter()
            .take(channels)
            .filter(|v| !v.is_nan())
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    }
}
