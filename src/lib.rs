//! Streaming instrument capture: decodes binary or text sample frames from a
//! raw byte stream, keeps a bounded rolling history with running channel
//! statistics, and produces decimated series for display.
pub mod config;
pub mod drivers;
pub mod engine;
pub mod recorder;
pub mod types;
pub use config::ScopeConfig;
pub use drivers::*;
pub use engine::{Engine, EngineHandle};
