//! JSON route handlers.
//!
//! `map_get`/`map_post` accept a closure returning a value, the `_async`
//! variants accept a closure returning a future. Both are normalized to
//! [`Produce`] ("produces a result, eventually") and wrapped in one
//! [`JsonHandler`], which writes through [`write_json`].

use std::marker::PhantomData;

use futures_util::future::{self, BoxFuture};
use serde::Serialize;

use crate::error::HandlerError;
use crate::http::response::write_json;
use crate::http::RequestContext;
use crate::routing::Handler;

/// Something that eventually produces a `T` for a request.
pub trait Produce<T>: Send + Sync + 'static {
    fn produce<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>>;
}

/// Producer backed by a closure that returns its value directly.
pub struct Ready<F>(F);

impl<F> Ready<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: Fn(&mut RequestContext) -> T + Send + Sync + 'static,
    {
        Self(f)
    }
}

impl<F, T> Produce<T> for Ready<F>
where
    F: Fn(&mut RequestContext) -> T + Send + Sync + 'static,
    T: Send + 'static,
{
    fn produce<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>> {
        let value = (self.0)(ctx);
        Box::pin(future::ready(Ok(value)))
    }
}

/// Producer backed by a closure that returns a future.
pub struct Deferred<F>(F);

impl<F> Deferred<F> {
    pub fn new<T>(f: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>>
            + Send
            + Sync
            + 'static,
    {
        Self(f)
    }
}

impl<F, T> Produce<T> for Deferred<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>>
        + Send
        + Sync
        + 'static,
    T: Send + 'static,
{
    fn produce<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<T, HandlerError>> {
        (self.0)(ctx)
    }
}

/// Handler that awaits a producer and writes its value as JSON.
pub struct JsonHandler<P, T> {
    producer: P,
    _value: PhantomData<fn() -> T>,
}

impl<P, T> JsonHandler<P, T>
where
    P: Produce<T>,
    T: Serialize + Send + 'static,
{
    pub fn new(producer: P) -> Self {
        Self {
            producer,
            _value: PhantomData,
        }
    }
}

impl<P, T> Handler for JsonHandler<P, T>
where
    P: Produce<T>,
    T: Serialize + Send + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            let value = self.producer.produce(ctx).await?;
            write_json(ctx, &value)
        })
    }
}
