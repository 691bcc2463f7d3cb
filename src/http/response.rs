//! JSON response writer.
//!
//! # Responsibilities
//! - Set status 200 and `content-type: application/json`
//! - Serialize the handler's value onto the outbound body stream
//!
//! # Design Decisions
//! - One writer for every JSON route, so sync and async handlers produce
//!   identical bytes on the wire
//! - An aborted request is abandoned, not retried
//! - Serialization errors are returned to the caller untouched

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use serde::Serialize;

use crate::error::HandlerError;
use crate::http::RequestContext;

/// Content type written by [`write_json`].
pub const APPLICATION_JSON: &str = "application/json";

/// Write `value` as the JSON response of `ctx`.
pub fn write_json<T>(ctx: &mut RequestContext, value: &T) -> Result<(), HandlerError>
where
    T: Serialize + ?Sized,
{
    if ctx.is_aborted() {
        return Err(HandlerError::Aborted);
    }

    ctx.set_status(StatusCode::OK);
    ctx.response_headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

    if let Err(e) = serde_json::to_writer(ctx.body_writer(), value) {
        ctx.clear_response_body();
        return Err(e.into());
    }

    if ctx.is_aborted() {
        ctx.clear_response_body();
        return Err(HandlerError::Aborted);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::abort::{AbortHandle, AbortSignal};
    use axum::body::Body;
    use axum::http::Request;
    use serde::ser::Error as _;
    use serde_json::json;

    fn context(signal: AbortSignal) -> RequestContext {
        let request = Request::builder().uri("/api/value").body(Body::empty()).unwrap();
        RequestContext::from_request(request, signal)
    }

    #[test]
    fn test_writes_compact_json() {
        let mut ctx = context(AbortSignal::never());
        ctx.set_status(StatusCode::NOT_FOUND);

        write_json(&mut ctx, &json!({"Hello": "World"})).unwrap();

        assert_eq!(ctx.status(), StatusCode::OK);
        assert_eq!(ctx.response_headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(ctx.response_body(), br#"{"Hello":"World"}"#);
    }

    #[test]
    fn test_writes_arrays_and_unsized_values() {
        let mut ctx = context(AbortSignal::never());
        let values: &[&str] = &["value1", "value2"];
        write_json(&mut ctx, values).unwrap();
        assert_eq!(ctx.response_body(), br#"["value1","value2"]"#);
    }

    #[test]
    fn test_aborted_request_is_abandoned() {
        let (handle, signal) = AbortHandle::new();
        let mut ctx = context(signal);
        handle.abort();

        let err = write_json(&mut ctx, &json!({"ignored": true})).unwrap_err();
        assert!(matches!(err, HandlerError::Aborted));
        assert!(ctx.response_body().is_empty());
        assert!(ctx.response_headers().get(CONTENT_TYPE).is_none());
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_serialization_failure_is_returned() {
        let mut ctx = context(AbortSignal::never());
        let err = write_json(&mut ctx, &Unserializable).unwrap_err();
        assert!(matches!(err, HandlerError::Json(_)));
        assert!(ctx.response_body().is_empty());
    }
}
