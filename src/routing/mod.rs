//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (before start):
//!     (method, path, handler)
//!     → path.rs (reject blank paths, fold case)
//!     → table.rs (copy sub-map, publish new RouteMap atomically)
//!
//! Start:
//!     RoutingTable::snapshot() → Arc<RouteMap> frozen into the Dispatcher
//!
//! Incoming Request (method, path)
//!     → RouteMap::lookup → handler.rs (Handler) or no match (404)
//! ```
//!
//! # Design Decisions
//! - Exact paths only, no parameters or wildcards
//! - Method compared exactly, path compared case-insensitively
//! - Snapshots are immutable; the running listener never sees later changes

pub mod handler;
pub mod path;
pub mod table;

pub use handler::{BoxedHandler, FnHandler, Handler};
pub use table::{RouteMap, RoutingTable};
