//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, a JSON body
//! and a [`Context`].
//!
//! # Example
//!
//! ```
//! use up_sdk_core::{Context, Method, Request, header};
//!
//! let url = "https://api.upbound.io/v1/accounts".parse().unwrap();
//! let request = Request::builder(Method::GET, url)
//!     .header(header::ACCEPT, header::HeaderValue::from_static("application/json"))
//!     .context(Context::new())
//!     .build();
//!
//! assert_eq!(request.header(header::ACCEPT), Some("application/json"));
//! ```

use bytes::Bytes;
use http::Method;
use http::header::{self, AsHeaderName, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::Context;

/// An HTTP request with method, URL, headers, optional body and its context.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    context: Context,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Single header value by name, when it is visible ASCII.
    #[must_use]
    pub fn header(&self, name: impl AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Serialized request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Request-scoped context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Consume into (method, url, headers, body, context).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Option<Bytes>, Context) {
        (self.method, self.url, self.headers, self.body, self.context)
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    context: Context,
}

impl RequestBuilder {
    /// Creates a new builder with an empty context.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            context: Context::new(),
        }
    }

    /// Sets a header, replacing any previous value.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces all headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the request context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: self.body,
            context: self.context,
        }
    }

    /// Set a JSON body and the matching `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(self, value: &T) -> crate::Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static(crate::APPLICATION_JSON),
            )
            .body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RequestId;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid URL")
    }

    #[test]
    fn request_builder_basic() {
        let request = Request::builder(Method::GET, url("https://api.upbound.io/v1/accounts"))
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .build();

        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().as_str(), "https://api.upbound.io/v1/accounts");
        assert_eq!(request.header(header::ACCEPT), Some("application/json"));
        assert!(request.body().is_none());
        assert!(request.context().request_id().is_none());
    }

    #[test]
    fn request_builder_json() {
        #[derive(serde::Serialize)]
        struct Robot {
            name: String,
        }

        let request = Request::builder(Method::POST, url("https://api.upbound.io/v1/robots"))
            .json(&Robot {
                name: "ci".to_string(),
            })
            .expect("json")
            .build();

        assert_eq!(request.header(header::CONTENT_TYPE), Some("application/json"));
        assert_eq!(request.body().expect("body").as_ref(), br#"{"name":"ci"}"#);
    }

    #[test]
    fn request_keeps_context() {
        let id = RequestId::new();
        let request = Request::builder(Method::DELETE, url("https://api.upbound.io/v1/robots/1"))
            .context(Context::new().with_request_id(id.clone()))
            .build();

        let (method, _, _, body, context) = request.into_parts();
        assert_eq!(method, Method::DELETE);
        assert!(body.is_none());
        assert_eq!(context.request_id(), Some(&id));
    }
}
