//! Copy-on-write routing table.
//!
//! # Responsibilities
//! - Map (method, path) to a handler
//! - Publish every change as a new immutable [`RouteMap`]
//! - Hand out snapshots that later registrations cannot touch
//!
//! # Design Decisions
//! - Two levels: `Method` (case-sensitive) → folded path (case-insensitive)
//! - Writers copy the affected sub-map, untouched sub-maps are shared by `Arc`
//! - Publishing goes through `ArcSwap::rcu`, so racing registrations of
//!   different routes are never lost and the same route is last-write-wins
//! - Readers never lock

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::error::ServerError;
use crate::routing::handler::BoxedHandler;
use crate::routing::path;

/// A registered route.
#[derive(Clone)]
struct RouteEntry {
    /// Path as it was registered, before case folding.
    path: Arc<str>,
    handler: BoxedHandler,
}

type PathMap = HashMap<String, RouteEntry>;

/// Immutable snapshot of every registered route.
#[derive(Clone, Default)]
pub struct RouteMap {
    methods: HashMap<Method, Arc<PathMap>>,
}

impl RouteMap {
    /// Find the handler for `method` and `path`.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&BoxedHandler> {
        self.methods
            .get(method)?
            .get(&*path::fold_case(path))
            .map(|entry| &entry.handler)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.methods.values().map(|paths| paths.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered (method, path) pairs, paths as originally registered.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.methods.iter().flat_map(|(method, paths)| {
            paths.values().map(move |entry| (method, entry.path.as_ref()))
        })
    }

    /// Copy of this map with one route added or replaced.
    fn with_route(&self, method: &Method, path: &str, handler: BoxedHandler) -> RouteMap {
        let mut paths = self
            .methods
            .get(method)
            .map(|paths| PathMap::clone(paths))
            .unwrap_or_default();
        paths.insert(
            path::fold_case(path).into_owned(),
            RouteEntry {
                path: Arc::from(path),
                handler,
            },
        );

        let mut methods = self.methods.clone();
        methods.insert(method.clone(), Arc::new(paths));
        RouteMap { methods }
    }
}

impl fmt::Debug for RouteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.routes().map(|(method, path)| format!("{method} {path}")))
            .finish()
    }
}

/// Routing table owned by the server.
pub struct RoutingTable {
    current: ArcSwap<RouteMap>,
}

impl RoutingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RouteMap::default()),
        }
    }

    /// Register `handler` for `method` and `path`, replacing any previous
    /// handler for the same key.
    pub fn register(
        &self,
        method: Method,
        path: &str,
        handler: BoxedHandler,
    ) -> Result<(), ServerError> {
        path::validate(path)?;

        self.current
            .rcu(|current| current.with_route(&method, path, Arc::clone(&handler)));

        tracing::debug!(method = %method, path = %path, "Route registered");
        Ok(())
    }

    /// Look up a handler in the current snapshot.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<BoxedHandler> {
        self.current.load().lookup(method, path).cloned()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<RouteMap> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingTable")
            .field("routes", &*self.current.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::handler::FnHandler;

    fn handler() -> BoxedHandler {
        Arc::new(FnHandler::new(|_ctx| Box::pin(async { Ok(()) })))
    }

    #[test]
    fn test_register_and_lookup() {
        let table = RoutingTable::new();
        let h = handler();
        table.register(Method::GET, "/api/value", h.clone()).unwrap();

        let found = table.lookup(&Method::GET, "/api/value").unwrap();
        assert!(Arc::ptr_eq(&found, &h));
        assert!(table.lookup(&Method::GET, "/api/other").is_none());
        assert!(table.lookup(&Method::POST, "/api/value").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let table = RoutingTable::new();
        let first = handler();
        let second = handler();
        table.register(Method::GET, "/x", first.clone()).unwrap();
        table.register(Method::GET, "/X", second.clone()).unwrap();

        let found = table.lookup(&Method::GET, "/x").unwrap();
        assert!(Arc::ptr_eq(&found, &second));
        assert!(!Arc::ptr_eq(&found, &first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_path_is_case_insensitive() {
        let table = RoutingTable::new();
        table.register(Method::GET, "/Api/Value", handler()).unwrap();

        assert!(table.lookup(&Method::GET, "/api/value").is_some());
        assert!(table.lookup(&Method::GET, "/API/VALUE").is_some());
    }

    #[test]
    fn test_method_is_case_sensitive() {
        let table = RoutingTable::new();
        table.register(Method::GET, "/x", handler()).unwrap();

        let lower = Method::from_bytes(b"get").unwrap();
        assert!(table.lookup(&lower, "/x").is_none());
        assert!(table.lookup(&Method::GET, "/x").is_some());
    }

    #[test]
    fn test_rejects_blank_paths() {
        let table = RoutingTable::new();
        assert!(matches!(
            table.register(Method::GET, "", handler()),
            Err(ServerError::InvalidPath)
        ));
        assert!(matches!(
            table.register(Method::GET, "   ", handler()),
            Err(ServerError::InvalidPath)
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_registrations() {
        let table = RoutingTable::new();
        table.register(Method::GET, "/before", handler()).unwrap();
        let snapshot = table.snapshot();

        table.register(Method::GET, "/after", handler()).unwrap();
        table.register(Method::POST, "/before", handler()).unwrap();

        assert!(snapshot.lookup(&Method::GET, "/before").is_some());
        assert!(snapshot.lookup(&Method::GET, "/after").is_none());
        assert!(snapshot.lookup(&Method::POST, "/before").is_none());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_routes_keep_registered_spelling() {
        let table = RoutingTable::new();
        table.register(Method::POST, "/Echo", handler()).unwrap();

        let snapshot = table.snapshot();
        let routes: Vec<_> = snapshot.routes().collect();
        assert_eq!(routes, vec![(&Method::POST, "/Echo")]);
    }

    #[test]
    fn test_concurrent_registrations_are_not_lost() {
        let table = Arc::new(RoutingTable::new());
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        table
                            .register(Method::GET, &format!("/t{t}/r{i}"), handler())
                            .unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(table.len(), 400);
        assert!(table.lookup(&Method::GET, "/t7/r49").is_some());
    }
}
