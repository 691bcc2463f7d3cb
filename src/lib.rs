//! Minimal HTTP router and server lifecycle controller.
//!
//! Routes are exact (method, path) pairs held in a copy-on-write table.
//! Starting the server freezes the current table into a dispatcher and hands
//! it to an [`Engine`] (hyper HTTP/1 by default), which calls the dispatcher
//! once per request.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use error::{HandlerError, ServerError};
pub use http::{AbortSignal, Dispatcher, RequestContext, WebServer};
pub use lifecycle::ServerState;
pub use net::{Engine, EngineError, HyperEngine};
pub use routing::{Handler, RoutingTable};
