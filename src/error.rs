use thiserror::Error;

/// Failures of the speech-capture capability. Never crosses the
/// orchestrator boundary as a panic; every variant maps to a defined
/// state transition.
#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("speech capture unavailable: {0}")]
    Unavailable(String),
    #[error("speech capture failed: {0}")]
    Failed(String),
    #[error("speech capture cancelled")]
    Cancelled,
}

/// Failures of the external diary store (Executor boundary).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("entry not found")]
    NotFound,
    #[error("store rejected the write: {0}")]
    Rejected(String),
}
