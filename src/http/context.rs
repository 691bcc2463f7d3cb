//! Per-request context handed to handlers.
//!
//! # Responsibilities
//! - Expose the inbound method, URI, headers and body stream
//! - Collect the outbound status, headers and body bytes
//! - Carry the request's abort signal
//!
//! # Design Decisions
//! - Every facet is required at construction; a partial context cannot exist
//! - Handlers borrow the context (`&mut`) and cannot keep it past completion
//! - The body stream is handed out at most once and is never buffered here

use std::io;

use axum::body::{to_bytes, Body};
use axum::http::{request, HeaderMap, Method, Request, Response, StatusCode, Uri};
use bytes::{BufMut, Bytes, BytesMut};

use crate::error::HandlerError;
use crate::http::abort::AbortSignal;

/// Outbound half of a request context.
#[derive(Debug)]
struct Outbound {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

/// Short-lived context for one request.
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<Body>,
    outbound: Outbound,
    aborted: AbortSignal,
}

impl RequestContext {
    /// Build a context from request parts, body and abort signal.
    pub fn new(parts: request::Parts, body: Body, aborted: AbortSignal) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body: Some(body),
            outbound: Outbound {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: BytesMut::new(),
            },
            aborted,
        }
    }

    /// Build a context from a whole request.
    pub fn from_request(request: Request<Body>, aborted: AbortSignal) -> Self {
        let (parts, body) = request.into_parts();
        Self::new(parts, body, aborted)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Request path, without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Take the request body stream. `None` once it has been taken.
    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Read the whole request body, up to `limit` bytes.
    ///
    /// Returns empty bytes if the body was already taken.
    pub async fn read_body(&mut self, limit: usize) -> Result<Bytes, HandlerError> {
        match self.body.take() {
            Some(body) => to_bytes(body, limit).await.map_err(HandlerError::Body),
            None => Ok(Bytes::new()),
        }
    }

    /// Outbound status code (200 until changed).
    pub fn status(&self) -> StatusCode {
        self.outbound.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.outbound.status = status;
    }

    pub fn response_headers(&self) -> &HeaderMap {
        &self.outbound.headers
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.outbound.headers
    }

    /// Writable outbound body stream.
    ///
    /// Bytes are buffered in memory; nothing reaches the connection until the
    /// handler completes and the engine calls [`RequestContext::into_response`].
    /// A handler that fails after writing sends no response at all.
    pub fn body_writer(&mut self) -> impl io::Write + '_ {
        (&mut self.outbound.body).writer()
    }

    /// Bytes written to the outbound body so far.
    pub fn response_body(&self) -> &[u8] {
        &self.outbound.body
    }

    /// Discard anything written to the outbound body.
    pub fn clear_response_body(&mut self) {
        self.outbound.body.clear();
    }

    pub fn abort_signal(&self) -> &AbortSignal {
        &self.aborted
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_aborted()
    }

    /// Convert the outbound half into the response handed back to the engine.
    pub fn into_response(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.outbound.body.freeze()));
        *response.status_mut() = self.outbound.status;
        *response.headers_mut() = self.outbound.headers;
        response
    }
}
