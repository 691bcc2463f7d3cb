//! Request dispatch against a frozen routing snapshot.

use std::sync::Arc;

use axum::http::StatusCode;

use crate::error::HandlerError;
use crate::http::RequestContext;
use crate::routing::{path, RouteMap};

/// Dispatches requests using the snapshot bound at start.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteMap>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteMap>) -> Self {
        Self { routes }
    }

    /// Routes this dispatcher was bound to.
    pub fn routes(&self) -> &RouteMap {
        &self.routes
    }

    /// Route `ctx` to its handler, or answer 404 with an empty body.
    ///
    /// Handler errors are returned as-is.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> Result<(), HandlerError> {
        let handler = {
            let path = path::decode(ctx.path());
            self.routes.lookup(ctx.method(), &path)
        };
        let Some(handler) = handler else {
            tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No route matched");
            ctx.set_status(StatusCode::NOT_FOUND);
            return Ok(());
        };

        handler.call(ctx).await
    }
}
