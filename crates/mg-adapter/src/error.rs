//! Adapter and backend error types.

use thiserror::Error;

/// Errors from explicit model load/switch operations.
///
/// Prediction never surfaces these: predict failures are folded into the
/// `Prediction` result itself (see `mg_protocol::PredictErrorKind`).
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The requested model could not be loaded. Any previously loaded
    /// model stays active.
    #[error("model load failed: {0}")]
    Load(String),

    /// Another load is already in flight. Loads never queue.
    #[error("another model load is already in progress")]
    Busy,
}

/// Convenience alias for adapter results.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors from the hosted inference API surface.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("model unavailable: {0}")]
    Unavailable(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Convenience alias for backend results.
pub type BackendResult<T> = Result<T, BackendError>;
