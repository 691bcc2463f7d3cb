//! Route path normalization.
//!
//! Paths are compared case-insensitively. Keys are stored folded to
//! lowercase; lookups fold the incoming path the same way and only allocate
//! when it actually contains uppercase or non-ASCII characters.
//!
//! Request paths arrive percent-encoded and are decoded before lookup, so
//! `/api/%76alue` reaches the `/api/value` route.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

use crate::error::ServerError;

/// Reject empty or whitespace-only paths.
pub fn validate(path: &str) -> Result<(), ServerError> {
    if path.trim().is_empty() {
        return Err(ServerError::InvalidPath);
    }
    Ok(())
}

/// Decode a request path for lookup. Invalid UTF-8 is replaced, not rejected.
pub fn decode(path: &str) -> Cow<'_, str> {
    percent_decode_str(path).decode_utf8_lossy()
}

/// Fold a path into its case-insensitive lookup key.
pub fn fold_case(path: &str) -> Cow<'_, str> {
    if path.bytes().all(|b| b.is_ascii() && !b.is_ascii_uppercase()) {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(path.to_lowercase())
    }
}
