//! Observability subsystem.
//!
//! Every subsystem emits `tracing` events with structured fields
//! (`address`, `method`, `path`, `state`); logging.rs installs the
//! subscriber that formats them.

pub mod logging;
