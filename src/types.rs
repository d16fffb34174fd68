// src/types.rs
use crate::drivers::WireFormat;
// Consumer -> engine thread
#[derive(Clone, Debug, PartialEq)]
pub enum EngineCommand {
    SetFormat(WireFormat),
    /// 0 returns to learning the count from the stream.
    SetChannelCount(usize),
    Reset,
    FullReset,
    Resize(usize),
    Clear,
    Shutdown,
}
// Engine thread -> consumer
#[derive(Clone, Debug, PartialEq)]
pub enum EngineMessage {
    Status(bool),
    ChannelCount(usize),
    SampleRate(f64),
    SourceError(String),
}
