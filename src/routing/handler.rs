//! Route handler abstraction.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::HandlerError;
use crate::http::RequestContext;

/// Asynchronous request handler.
///
/// Borrows the request context for the duration of the returned future and
/// completes once the response has been written into it.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// Shared handler as stored in the routing table.
pub type BoxedHandler = Arc<dyn Handler>;

/// Adapter turning a closure into a [`Handler`].
pub struct FnHandler<F>(F);

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync
        + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<(), HandlerError>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), HandlerError>> {
        (self.0)(ctx)
    }
}
