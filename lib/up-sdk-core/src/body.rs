//! Body serialization utilities and the streaming response body.

use std::fmt;

use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};

use crate::{Error, Result};

/// MIME type of every request body this client sends.
pub const APPLICATION_JSON: &str = "application/json";

/// Serialize a value to JSON bytes.
///
/// `serde_json` never entity-escapes `<`, `>` or `&`, so markup embedded in
/// string fields reaches the server untouched.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use up_sdk_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Space { name: String }
///
/// let space = Space { name: "<dev & test>".to_string() };
/// let bytes = to_json(&space).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"<dev & test>"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// Uses `serde_path_to_error` so the error names the field that failed
/// (e.g. `spec.controlPlane.name`).
///
/// # Errors
///
/// Returns [`Error::JsonDeserialization`] if JSON deserialization fails.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::json_deserialization(e.path().to_string(), e.inner().to_string()))
}

/// Streaming body of a [`Response`](crate::Response).
///
/// The body can be read exactly once. Dropping it releases the underlying
/// connection resources, whether or not it was read.
pub struct Body {
    inner: UnsyncBoxBody<Bytes, Error>,
}

impl Body {
    /// A body with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: Empty::<Bytes>::new()
                .map_err(|never| match never {})
                .boxed_unsync(),
        }
    }

    /// A body holding the given bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            inner: Full::new(bytes.into())
                .map_err(|never| match never {})
                .boxed_unsync(),
        }
    }

    /// Read the whole body into memory.
    ///
    /// # Errors
    ///
    /// Returns the error of the first frame that failed to arrive.
    pub async fn collect(self) -> Result<Bytes> {
        let collected = BodyExt::collect(self.inner).await?;
        Ok(collected.to_bytes())
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<UnsyncBoxBody<Bytes, Error>> for Body {
    fn from(inner: UnsyncBoxBody<Bytes, Error>) -> Self {
        Self { inner }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(text.as_bytes()))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").finish_non_exhaustive()
    }
}
