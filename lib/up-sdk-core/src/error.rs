//! Error types for the Upbound API client.

use std::fmt;

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};

use crate::RequestId;

// ============================================================================
// Remote Error Envelope
// ============================================================================

/// Failure reported for a non-2xx response.
///
/// Either the API's own error envelope, decoded verbatim, or a fallback built
/// from the status code, its reason phrase and the raw response body.
///
/// Members of the envelope other than `status`, `title` and `detail` are kept
/// in [`extensions`](Self::extensions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub struct ResponseError {
    /// Status code reported by the API.
    ///
    /// Wider than an HTTP status so envelopes carrying any integer decode
    /// verbatim.
    pub status: i64,
    /// Human-readable summary of the status.
    #[serde(default)]
    pub title: String,
    /// Free-form diagnostic text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Any further members of the envelope.
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl ResponseError {
    /// Create an error with no extension members.
    #[must_use]
    pub fn new(status: i64, title: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail,
            extensions: serde_json::Map::new(),
        }
    }

    /// Create the fallback error for `status`, titled with its reason phrase.
    ///
    /// Unknown status codes get an empty title.
    #[must_use]
    pub fn from_status(status: http::StatusCode, detail: Option<String>) -> Self {
        Self::new(
            i64::from(status.as_u16()),
            status.canonical_reason().unwrap_or_default(),
            detail,
        )
    }

    /// Returns `true` for 4xx statuses.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Returns `true` for 5xx statuses.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Returns `true` for 404 Not Found.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Returns `true` for 409 Conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        self.status == 409
    }

    /// Returns `true` for 401 Unauthorized and 403 Forbidden.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401 || self.status == 403
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.title)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for Upbound API calls.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The remote API answered with a non-2xx status.
    #[display("{_0}")]
    #[from]
    Response(#[error(not(source))] ResponseError),

    /// The transport failed; wraps the underlying transport error.
    #[display(
        "failed to perform request with ID: {}: {source}",
        request_id.as_ref().map_or("", RequestId::as_str)
    )]
    #[from(skip)]
    Transport {
        /// Correlation identifier of the failed request, when it had one.
        request_id: Option<RequestId>,
        /// The transport error.
        source: Box<Error>,
    },

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout or elapsed context deadline.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The request context was canceled.
    #[display("request canceled")]
    #[from(skip)]
    Canceled,

    /// Invalid request configuration.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// The redirect limit was reached before a final response.
    #[display("stopped after {_0} redirects")]
    #[from(skip)]
    TooManyRedirects(#[error(not(source))] usize),

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// JSON deserialization error with path context.
    #[display("JSON deserialization error at '{path}': {message}")]
    #[from(skip)]
    JsonDeserialization {
        /// JSON path to the error (e.g., "spec.controlPlane.name").
        path: String,
        /// Error message.
        message: String,
    },

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap a transport failure with the correlation identifier of its request.
    #[must_use]
    pub fn transport(request_id: Option<RequestId>, source: Self) -> Self {
        Self::Transport {
            request_id,
            source: Box::new(source),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create a JSON deserialization error with path context.
    #[must_use]
    pub fn json_deserialization(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonDeserialization {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The error underneath any [`Error::Transport`] wrapper.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Transport { source, .. } => source.root(),
            other => other,
        }
    }

    /// Correlation identifier of a wrapped transport failure.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            Self::Transport { request_id, .. } => request_id.as_ref(),
            _ => None,
        }
    }

    /// Returns `true` if the request timed out.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Self::Timeout)
    }

    /// Returns `true` if the request context was canceled.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self.root(), Self::Canceled)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self.root(), Self::Connection(_))
    }

    /// The remote failure, if the API answered with a non-2xx status.
    #[must_use]
    pub const fn response_error(&self) -> Option<&ResponseError> {
        match self {
            Self::Response(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this is a remote error.
    #[must_use]
    pub const fn status(&self) -> Option<i64> {
        match self.response_error() {
            Some(err) => Some(err.status),
            None => None,
        }
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.response_error()
            .is_some_and(ResponseError::is_client_error)
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.response_error()
            .is_some_and(ResponseError::is_server_error)
    }

    /// Returns `true` if this is a 404 Not Found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::Response(ResponseError::new(404, "Not Found", None));
        assert_eq!(err.to_string(), "404 Not Found");

        let err = Error::Response(ResponseError::new(
            400,
            "Bad Request",
            Some("name is required".to_string()),
        ));
        assert_eq!(err.to_string(), "400 Bad Request: name is required");

        let err = Error::Timeout;
        assert_eq!(err.to_string(), "request timeout");

        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "connection error: failed to connect");

        let err = Error::json_deserialization("spec.replicas", "invalid type");
        assert_eq!(
            err.to_string(),
            "JSON deserialization error at 'spec.replicas': invalid type"
        );
    }

    #[test]
    fn transport_error_names_request_id() {
        let id = RequestId::parse("req-1").expect("valid id");
        let err = Error::transport(Some(id.clone()), Error::connection("refused"));

        assert_eq!(
            err.to_string(),
            "failed to perform request with ID: req-1: connection error: refused"
        );
        assert_eq!(err.request_id(), Some(&id));
        assert!(err.is_connection());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn transport_error_without_request_id() {
        let err = Error::transport(None, Error::Canceled);
        assert_eq!(
            err.to_string(),
            "failed to perform request with ID: : request canceled"
        );
        assert!(err.is_canceled());
        assert!(!err.is_timeout());
    }

    #[test]
    fn error_status() {
        let err = Error::Response(ResponseError::new(404, "Not Found", None));
        assert_eq!(err.status(), Some(404));
        assert!(err.is_client_error());
        assert!(err.is_not_found());
        assert!(!err.is_server_error());

        let err = Error::Response(ResponseError::new(503, "Service Unavailable", None));
        assert!(err.is_server_error());
        assert!(!err.is_not_found());

        let err = Error::Timeout;
        assert_eq!(err.status(), None);
        assert!(!err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn fallback_uses_reason_phrase() {
        let err = ResponseError::from_status(http::StatusCode::SERVICE_UNAVAILABLE, None);
        assert_eq!(err.status, 503);
        assert_eq!(err.title, "Service Unavailable");
        assert!(err.detail.is_none());

        let unknown = http::StatusCode::from_u16(599).expect("valid code");
        assert_eq!(ResponseError::from_status(unknown, None).title, "");
    }

    #[test]
    fn envelope_keeps_extra_members() {
        let err: ResponseError = serde_json::from_str(
            r#"{"status":409,"title":"Conflict","detail":"exists","instance":"/v1/spaces/dev"}"#,
        )
        .expect("envelope");

        assert!(err.is_conflict());
        assert_eq!(err.detail.as_deref(), Some("exists"));
        assert_eq!(
            err.extensions.get("instance"),
            Some(&serde_json::json!("/v1/spaces/dev"))
        );
    }

    #[test]
    fn envelope_status_outside_http_range() {
        let err: ResponseError =
            serde_json::from_str(r#"{"status":70000,"title":"Custom"}"#).expect("envelope");
        assert_eq!(err.status, 70000);
        assert_eq!(err.to_string(), "70000 Custom");
        assert!(!err.is_client_error());
        assert!(!err.is_server_error());
    }

    #[test]
    fn too_many_redirects_display() {
        let err = Error::transport(None, Error::TooManyRedirects(10));
        assert!(err.to_string().ends_with("stopped after 10 redirects"));
    }

    #[test]
    fn envelope_title_defaults_to_empty() {
        let err: ResponseError = serde_json::from_str(r#"{"status":401}"#).expect("envelope");
        assert_eq!(err.title, "");
        assert!(err.is_unauthorized());
    }
}
