//! Web server facade.
//!
//! # Responsibilities
//! - Collect route registrations into the routing table
//! - Drive the lifecycle state machine around engine start/stop
//! - Bind the routing snapshot into the dispatcher handed to the engine
//! - Release engine resources on dispose (and on drop)
//!
//! # Design Decisions
//! - `start` claims the server (Init → Starting) when called, not when polled
//! - Routes registered after start only reach the server's own table
//! - `stop` outside Started/Starting is a no-op

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;
use serde::Serialize;

use crate::config::ServerConfig;
use crate::error::{HandlerError, ServerError};
use crate::http::json::{Deferred, JsonHandler, Ready};
use crate::http::{Dispatcher, RequestContext};
use crate::lifecycle::{Lifecycle, ServerState};
use crate::net::{Engine, HyperEngine};
use crate::routing::{FnHandler, Handler, RoutingTable};

/// HTTP server: a routing table plus a lifecycle around an [`Engine`].
pub struct WebServer<E: Engine = HyperEngine> {
    routes: RoutingTable,
    lifecycle: Lifecycle,
    engine: E,
}

impl WebServer<HyperEngine> {
    /// Server on a hyper engine with default settings.
    pub fn new() -> Self {
        Self::with_engine(HyperEngine::new())
    }

    /// Server on a hyper engine configured from `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_engine(HyperEngine::from_config(config))
    }
}

impl Default for WebServer<HyperEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> WebServer<E> {
    pub fn with_engine(engine: E) -> Self {
        Self {
            routes: RoutingTable::new(),
            lifecycle: Lifecycle::new(),
            engine,
        }
    }

    /// Register `handler` for `method` and exact `path`.
    pub fn route<F>(&self, method: Method, path: &str, handler: F) -> Result<&Self, ServerError>
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<(), HandlerError>>
            + Send
            + Sync
            + 'static,
    {
        self.route_handler(method, path, FnHandler::new(handler))
    }

    /// Register any [`Handler`] implementation.
    pub fn route_handler<H: Handler>(
        &self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<&Self, ServerError> {
        let state = self.lifecycle.current();
        if state != ServerState::Init {
            tracing::warn!(
                method = %method,
                path = %path,
                state = %state,
                "Route registered after start; the running listener keeps its bound routes"
            );
        }

        self.routes.register(method, path, Arc::new(handler))?;
        Ok(self)
    }

    /// `GET` route answering with the JSON of `f`'s return value.
    pub fn map_get<F, T>(&self, path: &str, f: F) -> Result<&Self, ServerError>
    where
        F: Fn(&mut RequestContext) -> T + Send + Sync + 'static,
        T: Serialize + Send + 'static,
    {
        self.route_handler(Method::GET, path, JsonHandler::new(Ready::new(f)))
    }

    /// `POST` route answering with the JSON of `f`'s return value.
    pub fn map_post<F, T>(&self, path: &str, f: F) -> Result<&Self, ServerError>
    where
        F: Fn(&mut RequestContext) -> T + Send + Sync + 'static,
        T: Serialize + Send + 'static,
    {
        self.route_handler(Method::POST, path, JsonHandler::new(Ready::new(f)))
    }

    /// `GET` route answering with the JSON of the value `f`'s future resolves to.
    pub fn map_get_async<F, T>(&self, path: &str, f: F) -> Result<&Self, ServerError>
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>>
            + Send
            + Sync
            + 'static,
        T: Serialize + Send + 'static,
    {
        self.route_handler(Method::GET, path, JsonHandler::new(Deferred::new(f)))
    }

    /// `POST` route answering with the JSON of the value `f`'s future resolves to.
    pub fn map_post_async<F, T>(&self, path: &str, f: F) -> Result<&Self, ServerError>
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>>
            + Send
            + Sync
            + 'static,
        T: Serialize + Send + 'static,
    {
        self.route_handler(Method::POST, path, JsonHandler::new(Deferred::new(f)))
    }

    /// Start serving on `endpoint`.
    ///
    /// The server is claimed immediately, so a second call fails with
    /// [`ServerError::InvalidState`] even before the first future is polled.
    pub fn start(
        &self,
        endpoint: SocketAddr,
    ) -> impl Future<Output = Result<(), ServerError>> + Send + '_ {
        let claimed = self
            .lifecycle
            .transition(ServerState::Init, ServerState::Starting)
            .map_err(ServerError::InvalidState);

        async move {
            claimed?;

            let dispatcher = Dispatcher::new(self.routes.snapshot());
            tracing::info!(
                endpoint = %endpoint,
                routes = dispatcher.routes().len(),
                "Starting server"
            );

            if let Err(e) = self.engine.start(endpoint, dispatcher).await {
                // A concurrent stop/dispose may already have moved the state on.
                let _ = self
                    .lifecycle
                    .transition(ServerState::Starting, ServerState::Stopped);
                tracing::error!(endpoint = %endpoint, error = %e, "Server failed to start");
                return Err(e.into());
            }

            match self
                .lifecycle
                .transition(ServerState::Starting, ServerState::Started)
            {
                Ok(()) => {
                    tracing::info!(
                        address = ?self.engine.local_addr(),
                        "Server started"
                    );
                }
                Err(ServerState::Disposed) => {
                    tracing::warn!("Server disposed while starting");
                    self.engine.dispose();
                }
                Err(state) => {
                    tracing::warn!(state = %state, "Server stopped while starting");
                    self.engine.stop().await?;
                }
            }
            Ok(())
        }
    }

    /// Stop accepting connections and drain the in-flight ones.
    ///
    /// A no-op unless the server is Started or Starting.
    pub async fn stop(&self) -> Result<(), ServerError> {
        let previous = match self.lifecycle.transition_from_any(
            &[ServerState::Started, ServerState::Starting],
            ServerState::Stopping,
        ) {
            Ok(previous) => previous,
            Err(state) => {
                tracing::debug!(state = %state, "Stop ignored, server is not running");
                return Ok(());
            }
        };

        tracing::info!(previous = %previous, "Stopping server");
        let result = self.engine.stop().await;
        let _ = self
            .lifecycle
            .transition(ServerState::Stopping, ServerState::Stopped);

        match result {
            Ok(()) => {
                tracing::info!("Server stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Engine failed to stop cleanly");
                Err(e.into())
            }
        }
    }

    /// Release engine resources. Only the first call has an effect.
    pub fn dispose(&self) {
        let previous = self.lifecycle.dispose();
        if previous == ServerState::Disposed {
            return;
        }

        self.engine.dispose();
        tracing::debug!(previous = %previous, "Server disposed");
    }

    pub fn state(&self) -> ServerState {
        self.lifecycle.current()
    }

    /// Address the engine is bound to while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.engine.local_addr()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The server's own routing table (not the snapshot bound at start).
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routes
    }
}

impl<E: Engine> Drop for WebServer<E> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<E: Engine + std::fmt::Debug> std::fmt::Debug for WebServer<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebServer")
            .field("state", &self.state())
            .field("routes", &self.routes)
            .field("engine", &self.engine)
            .finish()
    }
}
