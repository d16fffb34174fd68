// src/drivers/mod.rs
// Streaming core: decode -> batch -> store -> decimate
pub mod batcher;
pub mod binary;
pub mod buffer;
pub mod decimate;
pub mod decoder;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod rate;
pub mod source;
pub mod text;
// Re-export the types callers touch most
pub use batcher::{BatchTiming, FrameBatch, FrameBatcher};
pub use buffer::{ChannelStats, RollingStore};
pub use decimate::{
    display_series, range_series, selection_stats, ChannelSummary, DisplaySeries, SelectionStats,
};
pub use decoder::{DecoderCounters, FrameSink, ProtocolDecoder, WireFormat};
pub use error::ScopeError;
pub use frame::SampleFrame;
pub use pipeline::{PumpReport, ScopePipeline, SharedStore};
pub use rate::RateMeter;
pub use source::{ByteSource, ManualSource, SerialSource, SimulatedSource};
