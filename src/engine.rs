// src/engine.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{
    channel, sync_channel, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{info, warn};
use crate::config::{ScopeConfig, MAX_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};
use crate::drivers::{
    display_series, range_series, selection_stats, ByteSource, ChannelStats, DisplaySeries,
    ScopeError, ScopePipeline, SelectionStats, SharedStore,
};
use crate::types::{EngineCommand, EngineMessage};
/// Longest the producer sleeps when the source has nothing to give.
const IDLE_TICK: Duration = Duration::from_millis(5);
/// Pause after a transport error before reading again.
const ERROR_BACKOFF: Duration = Duration::from_millis(250);
/// Undrained messages beyond this are dropped.
const MESSAGE_BACKLOG: usize = 64;
pub struct Engine;
impl Engine {
    /// Starts the producer thread: source -> decoder -> batcher -> store.
    pub fn spawn<S>(config: &ScopeConfig, source: S) -> Result<EngineHandle, ScopeError>
    where
        S: ByteSource + Send + 'static,
    {
        let config = config.clone().sanitized();
        let mut pipeline = ScopePipeline::new(
            source,
            config.format,
            config.buffer_capacity,
            config.batch_timing(),
        );
        if let Some(channels) = config.channel_count {
            pipeline.set_channel_count(channels);
        }
        let store = pipeline.store();
        let channel_count = Arc::new(AtomicUsize::new(pipeline.channel_count()?));
        let (tx, rx) = sync_channel(MESSAGE_BACKLOG);
        let (tx_cmd, rx_cmd) = channel();
        let shared_count = Arc::clone(&channel_count);
        let join = thread::Builder::new()
            .name("framescope-engine".into())
            .spawn(move || run(pipeline, rx_cmd, tx, shared_count))?;
        Ok(EngineHandle {
            tx_cmd,
            rx,
            store,
            channel_count,
            join: Some(join),
        })
    }
}
fn run<S: ByteSource>(
    mut pipeline: ScopePipeline<S>,
    rx_cmd: Receiver<EngineCommand>,
    tx: SyncSender<EngineMessage>,
    channel_count: Arc<AtomicUsize>,
) {
    info!("engine started ({:?})", pipeline.decoder().format());
    tx.try_send(EngineMessage::Status(true)).ok();
    'outer: loop {
        // 1. drain commands
        loop {
            match rx_cmd.try_recv() {
                Ok(cmd) => {
                    if !apply(&mut pipeline, cmd) {
                        break 'outer;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'outer,
            }
        }
        // 2. move data
        let now = Instant::now();
        let report = match pipeline.pump_once(now) {
            Ok(report) => report,
            Err(e) => {
                warn!("source read failed: {}", e);
                tx.try_send(EngineMessage::SourceError(e.to_string())).ok();
                thread::sleep(ERROR_BACKOFF);
                continue;
            }
        };
        if let Some(rate) = report.rate_hz {
            tx.try_send(EngineMessage::SampleRate(rate)).ok();
        }
        if let Ok(count) = pipeline.channel_count() {
            if channel_count.swap(count, Ordering::Relaxed) != count {
                tx.try_send(EngineMessage::ChannelCount(count)).ok();
            }
        }
        // 3. nothing arrived: wait for a command or the next batch deadline
        if report.bytes_read == 0 {
            let wake = pipeline
                .next_deadline()
                .map_or(now + IDLE_TICK, |d| d.min(now + IDLE_TICK));
            match rx_cmd.recv_timeout(wake.saturating_duration_since(Instant::now())) {
                Ok(cmd) => {
                    if !apply(&mut pipeline, cmd) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
    tx.try_send(EngineMessage::Status(false)).ok();
    info!("engine stopped");
}
/// Returns false when the engine should stop.
fn apply<S: ByteSource>(pipeline: &mut ScopePipeline<S>, cmd: EngineCommand) -> bool {
    let result = match cmd {
        EngineCommand::SetFormat(format) => {
            pipeline.set_format(format);
            Ok(())
        }
        EngineCommand::SetChannelCount(channels) => {
            pipeline.set_channel_count(channels);
            Ok(())
        }
        EngineCommand::Reset => {
            pipeline.reset();
            Ok(())
        }
        EngineCommand::FullReset => pipeline.full_reset(),
        EngineCommand::Resize(capacity) => {
            pipeline.resize(capacity.clamp(MIN_BUFFER_CAPACITY, MAX_BUFFER_CAPACITY))
        }
        EngineCommand::Clear => pipeline.clear(),
        EngineCommand::Shutdown => return false,
    };
    if let Err(e) = result {
        warn!("engine command failed: {}", e);
    }
    true
}
/// Consumer side of a running engine. Read calls lock the shared store
/// only for the duration of one query.
pub struct EngineHandle {
    tx_cmd: Sender<EngineCommand>,
    rx: Receiver<EngineMessage>,
    store: SharedStore,
    channel_count: Arc<AtomicUsize>,
    join: Option<JoinHandle<()>>,
}
impl EngineHandle {
    pub fn send(&self, cmd: EngineCommand) -> Result<(), ScopeError> {
        self.tx_cmd.send(cmd).map_err(|_| ScopeError::EngineStopped)
    }
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }
    pub fn channel_count(&self) -> usize {
        self.channel_count.load(Ordering::Relaxed)
    }
    /// Messages produced since the last call. At most `MESSAGE_BACKLOG` are
    /// held; newer ones are dropped until the backlog is drained.
    pub fn drain_messages(&self) -> Vec<EngineMessage> {
        self.rx.try_iter().collect()
    }
    pub fn len(&self) -> Result<usize, ScopeError> {
        Ok(self.store.lock()?.len())
    }
    pub fn is_empty(&self) -> Result<bool, ScopeError> {
        Ok(self.store.lock()?.is_empty())
    }
    pub fn capacity(&self) -> Result<usize, ScopeError> {
        Ok(self.store.lock()?.capacity())
    }
    pub fn channel_stats(&self, channel: usize) -> Result<Option<ChannelStats>, ScopeError> {
        Ok(self.store.lock()?.channel_stats(channel))
    }
    pub fn display_series(&self, coefficients: &[f64]) -> Result<Option<DisplaySeries>, ScopeError> {
        let channels = self.channel_count();
        Ok(display_series(&*self.store.lock()?, channels, coefficients))
    }
    pub fn range_series(
        &self,
        start: usize,
        end: usize,
        coefficients: &[f64],
    ) -> Result<Option<DisplaySeries>, ScopeError> {
        let channels = self.channel_count();
        Ok(range_series(&*self.store.lock()?, start, end, channels, coefficients))
    }
    pub fn selection_stats(
        &self,
        start: usize,
        end: usize,
        coefficients: &[f64],
    ) -> Result<Option<SelectionStats>, ScopeError> {
        Ok(selection_stats(&*self.store.lock()?, start, end, coefficients))
    }
    /// Stops the producer and waits for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }
    fn stop(&mut self) {
        self.tx_cmd.send(EngineCommand::Shutdown).ok();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("engine thread panicked");
            }
        }
    }
}
impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
