//! HTTP/1.1 engine built on hyper.
//!
//! # Responsibilities
//! - Bind the listener and run the accept loop
//! - Serve each connection with hyper's HTTP/1 state machine
//! - Hand every request to the [`Dispatcher`] with a fresh abort signal
//! - Drain connections on stop, tear everything down on dispose
//!
//! # Design Decisions
//! - One accept task per run; connections live in a `JoinSet` it owns
//! - Shutdown is broadcast through the [`ConnectionTracker`] watch channel
//! - A handler error aborts the connection instead of writing a response

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::{HttpConfig, ServerConfig};
use crate::error::HandlerError;
use crate::http::abort::AbortHandle;
use crate::http::{Dispatcher, RequestContext};
use crate::net::connection::ConnectionTracker;
use crate::net::listener::{ConnectionPermit, Listener};
use crate::net::{Engine, EngineError};

/// Back-off after a failed `accept` (e.g. out of file descriptors).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// State of one `start`..`stop` run.
struct Running {
    local_addr: SocketAddr,
    tracker: ConnectionTracker,
    accept_task: JoinHandle<JoinSet<()>>,
}

/// Hyper-backed [`Engine`].
pub struct HyperEngine {
    max_connections: usize,
    http: HttpConfig,
    drain_timeout: Duration,
    running: Mutex<Option<Running>>,
    disposed: AtomicBool,
}

impl HyperEngine {
    /// Engine with default settings.
    pub fn new() -> Self {
        Self::from_config(&ServerConfig::default())
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            max_connections: config.listener.max_connections,
            http: config.http.clone(),
            drain_timeout: config.shutdown.drain_timeout(),
            running: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> u64 {
        self.running()
            .as_ref()
            .map_or(0, |running| running.tracker.active_count())
    }

    fn running(&self) -> MutexGuard<'_, Option<Running>> {
        // The guarded value is a plain Option swap, so a poisoned lock is still consistent.
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(&self, endpoint: SocketAddr, dispatcher: Dispatcher) -> Result<(), EngineError> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(EngineError::Disposed);
        }
        if let Some(running) = self.running().as_ref() {
            return Err(EngineError::AlreadyRunning(running.local_addr));
        }

        let listener = Listener::bind(endpoint, self.max_connections).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| EngineError::Bind { address: endpoint, source })?;

        let mut slot = self.running();
        if let Some(running) = slot.as_ref() {
            // Lost a race with a concurrent start; our listener is dropped here.
            return Err(EngineError::AlreadyRunning(running.local_addr));
        }

        let tracker = ConnectionTracker::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            dispatcher,
            self.http.clone(),
            tracker.clone(),
        ));
        *slot = Some(Running {
            local_addr,
            tracker,
            accept_task,
        });
        drop(slot);

        if self.disposed.load(Ordering::SeqCst) {
            self.dispose_running();
            return Err(EngineError::Disposed);
        }

        tracing::info!(address = %local_addr, "HTTP engine started");
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        let running = { self.running().take() };
        let Some(running) = running else {
            return Ok(());
        };

        tracing::info!(
            address = %running.local_addr,
            active_connections = running.tracker.active_count(),
            "HTTP engine stopping"
        );
        running.tracker.begin_shutdown();

        let mut connections = running.accept_task.await?;
        let drained = tokio::time::timeout(self.drain_timeout, async {
            while connections.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = connections.len(),
                drain_timeout_secs = self.drain_timeout.as_secs(),
                "Drain timeout elapsed, aborting remaining connections"
            );
            connections.shutdown().await;
        }

        tracing::info!(address = %running.local_addr, "HTTP engine stopped");
        Ok(())
    }

    fn dispose_running(&self) {
        if let Some(running) = self.running().take() {
            running.tracker.begin_shutdown();
            // Aborting the accept task drops its JoinSet, which aborts every connection.
            running.accept_task.abort();
            tracing::debug!(address = %running.local_addr, "HTTP engine disposed");
        }
    }
}

impl Default for HyperEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HyperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperEngine")
            .field("max_connections", &self.max_connections)
            .field("local_addr", &self.local_addr())
            .field("disposed", &self.disposed.load(Ordering::SeqCst))
            .finish()
    }
}

impl Engine for HyperEngine {
    fn start(
        &self,
        endpoint: SocketAddr,
        dispatcher: Dispatcher,
    ) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(self.run(endpoint, dispatcher))
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(self.shutdown())
    }

    fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            self.dispose_running();
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.running().as_ref().map(|running| running.local_addr)
    }
}

impl Drop for HyperEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Accept connections until shutdown is requested, then hand back the live ones.
async fn accept_loop(
    listener: Listener,
    dispatcher: Dispatcher,
    http: HttpConfig,
    tracker: ConnectionTracker,
) -> JoinSet<()> {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;

            _ = tracker.shutdown_requested() => break,

            Some(finished) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = finished {
                    if e.is_panic() {
                        tracing::error!(error = %e, "Connection task panicked");
                    }
                }
            }

            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr, permit)) => {
                    connections.spawn(serve_connection(
                        stream,
                        peer_addr,
                        permit,
                        dispatcher.clone(),
                        http.clone(),
                        tracker.clone(),
                    ));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                }
            },
        }
    }

    tracing::debug!(
        in_flight = connections.len(),
        "Accept loop finished, listener closed"
    );
    connections
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    _permit: ConnectionPermit,
    dispatcher: Dispatcher,
    http: HttpConfig,
    tracker: ConnectionTracker,
) {
    let guard = tracker.track();
    let connection_id = guard.id();
    tracing::trace!(connection_id = %connection_id, peer_addr = %peer_addr, "Connection opened");

    let service = service_fn(move |request: Request<Incoming>| {
        let dispatcher = dispatcher.clone();
        async move { handle_request(&dispatcher, request).await }
    });

    let mut builder = http1::Builder::new();
    builder
        .keep_alive(http.keep_alive)
        .timer(TokioTimer::new())
        .header_read_timeout(http.header_read_timeout());

    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let result = tokio::select! {
        result = connection.as_mut() => result,
        _ = tracker.shutdown_requested() => {
            connection.as_mut().graceful_shutdown();
            connection.as_mut().await
        }
    };

    if let Err(e) = result {
        tracing::debug!(
            connection_id = %connection_id,
            peer_addr = %peer_addr,
            error = %e,
            "Connection ended with error"
        );
    }
}

async fn handle_request(
    dispatcher: &Dispatcher,
    request: Request<Incoming>,
) -> Result<Response<Body>, HandlerError> {
    let (abort, signal) = AbortHandle::new();
    let mut ctx = RequestContext::from_request(request.map(Body::new), signal);

    let result = dispatcher.dispatch(&mut ctx).await;
    abort.disarm();

    match result {
        Ok(()) => Ok(ctx.into_response()),
        Err(e) => {
            tracing::error!(
                method = %ctx.method(),
                path = %ctx.path(),
                error = %e,
                "Request handler failed"
            );
            Err(e)
        }
    }
}
