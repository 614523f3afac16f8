use thiserror::Error;

/// Errors produced by the pane protocol and engine layers.
#[derive(Debug, Error)]
pub enum PaneError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection to {endpoint} failed: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("timeout")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PaneResult<T> = Result<T, PaneError>;
