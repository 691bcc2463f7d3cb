//! Error types surfaced by the server and by route handlers.

use thiserror::Error;

use crate::lifecycle::ServerState;
use crate::net::EngineError;

/// Boxed error accepted from handler code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by registration and lifecycle calls.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Route path was empty or whitespace only.
    #[error("route path must not be empty or whitespace")]
    InvalidPath,

    /// Lifecycle call made in a state that does not allow it.
    #[error("server state error: {0}")]
    InvalidState(ServerState),

    /// The underlying engine failed to start or stop.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors raised while a handler produces its response.
///
/// The dispatcher never intercepts these; they travel back to the engine,
/// which aborts the connection.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The client went away before the response was written.
    #[error("request aborted by client")]
    Aborted,

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading the request body failed.
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),

    /// Any other handler failure.
    #[error("{0}")]
    Other(#[source] BoxError),
}

impl HandlerError {
    /// Wrap an arbitrary error (or message) as a handler failure.
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }
}
