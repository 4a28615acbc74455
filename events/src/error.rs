//! Error types for registration and dispatch.

use thiserror::Error;

/// Error returned by a listener's handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by a listener's handler.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors surfaced by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A listener failed during synchronous delivery. Remaining listeners were
    /// not invoked.
    #[error("listener {listener} failed to handle {event}")]
    Handler {
        event: &'static str,
        listener: &'static str,
        #[source]
        source: HandlerError,
    },
    /// The worker pool no longer accepts batches.
    #[error("dispatch executor has shut down")]
    ExecutorClosed,
    /// A scheduled batch was dropped before it reported back.
    #[error("asynchronous batch for {event} was lost before completion")]
    BatchLost { event: &'static str },
    #[error("failed to start dispatch worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("invalid dispatcher config: {0}")]
    InvalidConfig(String),
}
