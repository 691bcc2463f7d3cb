//! Network engine subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limit)
//!     → connection.rs (live-connection tracking, shutdown broadcast)
//!     → http1.rs (hyper HTTP/1 connection, one dispatch per request)
//!     → Dispatcher (routing snapshot bound at start)
//! ```
//!
//! # Design Decisions
//! - The server only sees the [`Engine`] trait; hyper stays behind it
//! - Bounded accept prevents resource exhaustion
//! - Each connection is tracked for graceful shutdown

pub mod connection;
pub mod engine;
pub mod http1;
pub mod listener;

pub use engine::{Engine, EngineError};
pub use http1::HyperEngine;
