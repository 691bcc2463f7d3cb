//! Shared utilities for integration testing.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Method, Request};
use futures_util::future::BoxFuture;
use tokio::sync::Notify;

use simple_server::http::AbortSignal;
use simple_server::{Dispatcher, Engine, EngineError, HandlerError, RequestContext};

/// Call counters shared between a [`MockEngine`] and the test.
#[derive(Debug, Default)]
pub struct MockStats {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub disposes: AtomicUsize,
}

#[allow(dead_code)]
impl MockStats {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn disposes(&self) -> usize {
        self.disposes.load(Ordering::SeqCst)
    }
}

/// In-memory engine: no sockets, just records calls and keeps the dispatcher.
#[derive(Default)]
pub struct MockEngine {
    stats: Arc<MockStats>,
    fail_start: AtomicBool,
    start_gate: Option<Arc<Notify>>,
    dispatcher: Mutex<Option<Dispatcher>>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose `start` reports a bind failure.
    pub fn failing() -> Self {
        let engine = Self::default();
        engine.fail_start.store(true, Ordering::SeqCst);
        engine
    }

    /// Engine whose `start` waits until `gate` is notified.
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            start_gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn stats(&self) -> Arc<MockStats> {
        Arc::clone(&self.stats)
    }

    /// Run a request through the dispatcher bound at start.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
    ) -> Result<RequestContext, HandlerError> {
        let dispatcher = {
            self.dispatcher
                .lock()
                .unwrap()
                .clone()
                .expect("engine was never started")
        };

        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let mut ctx = RequestContext::from_request(request, AbortSignal::never());
        dispatcher.dispatch(&mut ctx).await?;
        Ok(ctx)
    }
}

impl Engine for MockEngine {
    fn start(
        &self,
        endpoint: SocketAddr,
        dispatcher: Dispatcher,
    ) -> BoxFuture<'_, Result<(), EngineError>> {
        self.stats.starts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(gate) = &self.start_gate {
                gate.notified().await;
            }
            if self.fail_start.load(Ordering::SeqCst) {
                return Err(EngineError::Bind {
                    address: endpoint,
                    source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
                });
            }
            *self.dispatcher.lock().unwrap() = Some(dispatcher);
            Ok(())
        })
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        self.stats.stops.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }

    fn dispose(&self) {
        self.stats.disposes.fetch_add(1, Ordering::SeqCst);
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

/// Loopback address with an OS-assigned port.
#[allow(dead_code)]
pub fn any_port() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

/// HTTP client that bypasses proxies and never reuses connections.
#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}
