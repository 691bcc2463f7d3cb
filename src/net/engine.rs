//! Engine contract consumed by the server.

use std::io;
use std::net::SocketAddr;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::http::Dispatcher;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to bind the listen endpoint.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// `start` called while a listener is already running.
    #[error("engine is already running on {0}")]
    AlreadyRunning(SocketAddr),

    /// `start` called after `dispose`.
    #[error("engine has been disposed")]
    Disposed,

    /// The accept loop panicked or was cancelled.
    #[error("accept loop terminated abnormally: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// HTTP engine driving connections for the server.
///
/// The engine accepts connections, parses HTTP and calls
/// [`Dispatcher::dispatch`] once per request.
pub trait Engine: Send + Sync + 'static {
    /// Bind `endpoint` and start serving requests through `dispatcher`.
    fn start(
        &self,
        endpoint: SocketAddr,
        dispatcher: Dispatcher,
    ) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Stop accepting, drain in-flight connections, release the listener.
    /// Succeeds immediately when not running.
    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Release every resource without waiting. Idempotent.
    fn dispose(&self);

    /// Address actually bound while running.
    fn local_addr(&self) -> Option<SocketAddr>;
}
