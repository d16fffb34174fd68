use thiserror::Error;
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
    #[error("invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),
    #[error("csv line {line}: {reason}")]
    Csv { line: usize, reason: String },
    #[error("engine thread has stopped")]
    EngineStopped,
    #[error("sample store lock poisoned by a panicked thread")]
    StorePoisoned,
}
impl<T> From<std::sync::PoisonError<T>> for ScopeError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ScopeError::StorePoisoned
    }
}
