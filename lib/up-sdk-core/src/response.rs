//! HTTP response handling.
//!
//! A [`Response`] owns its [`Body`] until someone reads it. Reading is
//! destructive: [`Response::bytes`] takes the body, so later reads see an
//! empty body. Dropping the response releases the body on every path.

use bytes::Bytes;
use http::StatusCode;
use http::header::{AsHeaderName, HeaderMap};

use crate::{Body, Result};

/// HTTP response with status, headers, and a single-read body.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single header value by name, when it is visible ASCII.
    #[must_use]
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Take the body out, leaving an empty one behind.
    #[must_use]
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Read the whole body. A second call returns empty bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the body stream fails.
    pub async fn bytes(&mut self) -> Result<Bytes> {
        self.take_body().collect().await
    }

    /// Read the whole body and deserialize it as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn json<T: serde::de::DeserializeOwned>(&mut self) -> Result<T> {
        let bytes = self.bytes().await?;
        crate::from_json(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn body_is_read_once() {
        let mut response = Response::new(StatusCode::OK, HeaderMap::new(), "payload");

        assert_eq!(response.bytes().await.expect("first read"), Bytes::from("payload"));
        assert!(response.bytes().await.expect("second read").is_empty());
    }

    #[tokio::test]
    async fn response_json() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Account {
            id: u64,
            name: String,
        }

        let mut response = Response::new(
            StatusCode::OK,
            HeaderMap::new(),
            r#"{"id":7,"name":"acme"}"#,
        );

        let account: Account = response.json().await.expect("deserialize");
        assert_eq!(
            account,
            Account {
                id: 7,
                name: "acme".to_string()
            }
        );
    }

    #[test]
    fn response_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        let response = Response::new(StatusCode::NO_CONTENT, headers, Body::empty());

        assert!(response.is_success());
        assert_eq!(response.header("content-type"), Some("application/json"));
        let missing = Response::new(StatusCode::NOT_FOUND, HeaderMap::new(), Body::empty());
        assert!(!missing.is_success());
    }
}
