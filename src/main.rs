// src/main.rs
use std::thread;
use std::time::Duration;
use anyhow::{Context, Result};
use log::{info, warn};
use framescope::drivers::{SerialSource, SimulatedSource};
use framescope::engine::{Engine, EngineHandle};
use framescope::types::EngineMessage;
use framescope::ScopeConfig;
const REPORT_EVERY: Duration = Duration::from_secs(1);
// Usage: framescope [config.json]
fn main() -> Result<()> {
    env_logger::init();
    let config = match std::env::args().nth(1) {
        Some(path) => ScopeConfig::load(&path).with_context(|| format!("loading config {path}"))?,
        None => ScopeConfig::default(),
    };
    info!(
        "format {:?}, capacity {} frames",
        config.format, config.buffer_capacity
    );
    let handle = match &config.serial {
        Some(serial) => {
            let source = SerialSource::open(&serial.port, serial.baud_rate)
                .with_context(|| format!("opening serial port {}", serial.port))?;
            Engine::spawn(&config, source)?
        }
        None => {
            info!(
                "no serial port configured; simulating {} channels @ {} Hz",
                config.simulate.channels, config.simulate.rate_hz
            );
            let source = SimulatedSource::new(config.simulate.channels, config.simulate.rate_hz);
            Engine::spawn(&config, source)?
        }
    };
    report_loop(&handle, &config)
}
fn report_loop(handle: &EngineHandle, config: &ScopeConfig) -> Result<()> {
    loop {
        thread::sleep(REPORT_EVERY);
        for msg in handle.drain_messages() {
            match msg {
                EngineMessage::SampleRate(hz) => info!("rate {:.1} frames/s", hz),
                EngineMessage::ChannelCount(n) => info!("{} channels", n),
                EngineMessage::SourceError(e) => warn!("source: {}", e),
                EngineMessage::Status(running) => {
                    if !running {
                        info!("engine exited");
                        return Ok(());
                    }
                }
            }
        }
        let points = handle
            .display_series(&config.coefficients)?
            .map_or(0, |s| s.len());
        info!("{} frames stored, {} display points", handle.len()?, points);
        for ch in 0..handle.channel_count() {
            if let Some(s) = handle.channel_stats(ch)? {
                info!(
                    "  ch{}: min {:.3} max {:.3} avg {:.3} now {:.3}",
                    ch, s.min, s.max, s.avg, s.current
                );
            }
        }
    }
}
