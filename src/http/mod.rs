//! HTTP request handling subsystem.
//!
//! # Data Flow
//! ```text
//! engine (one call per request)
//!     → context.rs (RequestContext: inbound head + body, outbound response, abort signal)
//!     → dispatcher.rs (lookup in the snapshot bound at start, or empty 404)
//!     → handler (json.rs for JSON routes)
//!     → response.rs (status 200, application/json, serialized body)
//!     → engine writes the response
//! ```

pub mod abort;
pub mod context;
pub mod dispatcher;
pub mod json;
pub mod response;
pub mod server;

pub use abort::{AbortHandle, AbortSignal};
pub use context::RequestContext;
pub use dispatcher::Dispatcher;
pub use response::write_json;
pub use server::WebServer;
