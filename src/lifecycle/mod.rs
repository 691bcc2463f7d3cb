//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Start (state.rs):
//!     Init → Starting → bind snapshot → engine.start() → Started | Stopped
//!
//! Stop (state.rs):
//!     Started/Starting → Stopping → engine.stop() (stop accept, drain) → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → demo binary calls stop()
//! ```
//!
//! # Design Decisions
//! - Start only from Init; a server runs at most once
//! - Stop outside Started/Starting is a no-op, never an error
//! - Dispose is idempotent and also runs on drop

pub mod signals;
pub mod state;

pub use state::{Lifecycle, ServerState};
