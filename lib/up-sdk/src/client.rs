//! The Upbound API client.

use std::sync::Arc;

use http::header::{self, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientConfig, ClientModifier};
use crate::{Context, Error, Method, Request, RequestBuilder, RequestId, Response, Result};

/// Client for the Upbound API.
///
/// A client builds requests relative to its base URL, sends them through its
/// [`Transport`](crate::Transport) and classifies responses with its
/// [`ErrorHandler`](crate::ErrorHandler). Cloning is cheap and clones share
/// the configuration.
///
/// # Example
///
/// ```ignore
/// use up_sdk::{Client, Context, Method, with_user_agent};
///
/// #[derive(serde::Deserialize)]
/// struct Account {
///     name: String,
/// }
///
/// let client = Client::new([with_user_agent("up-cli/0.30")]);
/// let request = client.new_request(Context::new(), Method::GET, "v1", "accounts/acme")?;
/// let account: Account = client.execute_json(request).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Client {
    config: Arc<ClientConfig>,
}

impl Client {
    /// Create a client from the default configuration with `modifiers` applied in order.
    #[must_use]
    pub fn new(modifiers: impl IntoIterator<Item = ClientModifier>) -> Self {
        Self::from_config(ClientConfig::default().modified(modifiers))
    }

    /// Create a client over an existing configuration.
    #[must_use]
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// A new client over a copy of this configuration with `modifiers` applied.
    ///
    /// This client is left unchanged. Unless a modifier replaces them, both
    /// clients share the same transport and error handler.
    #[must_use]
    pub fn with(&self, modifiers: impl IntoIterator<Item = ClientModifier>) -> Self {
        Self::from_config(self.config.modified(modifiers))
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Value sent in the `User-Agent` header.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.config.user_agent
    }

    /// Build a request without a body.
    ///
    /// The URL is `prefix` and `path` joined with a slash, cleaned, and
    /// resolved against the base URL. A context without a [`RequestId`] gets
    /// a fresh one, so the ID sent and the ID in any error are the same. No
    /// network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the resolved URL is invalid and
    /// [`Error::InvalidRequest`] if the user agent is not a legal header value.
    pub fn new_request(
        &self,
        context: Context,
        method: Method,
        prefix: &str,
        path: &str,
    ) -> Result<Request> {
        let request = self
            .request_builder(context, method, prefix, path)?
            .build();
        log_request(&request);
        Ok(request)
    }

    /// Build a request with `body` serialized as JSON.
    ///
    /// Characters such as `<`, `>` and `&` are sent verbatim.
    ///
    /// # Errors
    ///
    /// Same as [`new_request`](Self::new_request), plus
    /// [`Error::JsonSerialization`] if `body` cannot be serialized.
    pub fn new_request_with_body<B: Serialize + ?Sized>(
        &self,
        context: Context,
        method: Method,
        prefix: &str,
        path: &str,
        body: &B,
    ) -> Result<Request> {
        let request = self
            .request_builder(context, method, prefix, path)?
            .json(body)?
            .build();
        log_request(&request);
        Ok(request)
    }

    fn request_builder(
        &self,
        context: Context,
        method: Method,
        prefix: &str,
        path: &str,
    ) -> Result<RequestBuilder> {
        let url = self.config.base_url.join(&join_path(prefix, path))?;
        let user_agent = HeaderValue::from_str(&self.config.user_agent).map_err(|err| {
            Error::invalid_request(format!(
                "invalid user agent {:?}: {err}",
                self.config.user_agent
            ))
        })?;

        let context = if context.request_id().is_some() {
            context
        } else {
            context.with_request_id(RequestId::new())
        };

        Ok(Request::builder(method, url)
            .header(header::USER_AGENT, user_agent)
            .context(context))
    }

    /// Send `request` and discard the response body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the request could not be sent, or the
    /// error chosen by the error handler for a failed response.
    pub async fn execute(&self, request: Request) -> Result<()> {
        self.dispatch(request).await.map(drop)
    }

    /// Send `request` and decode the JSON response body into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), plus [`Error::JsonDeserialization`]
    /// if the body does not decode into `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let mut response = self.dispatch(request).await?;
        response.json().await
    }

    /// Round trip plus classification. A returned response is a success.
    async fn dispatch(&self, request: Request) -> Result<Response> {
        let request_id = request.context().request_id().cloned();

        let mut response = match self.config.transport.round_trip(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    request_id = request_id.as_ref().map(RequestId::as_str),
                    error = %err,
                    "request failed"
                );
                return Err(Error::transport(request_id, err));
            }
        };

        if let Some(err) = self.config.error_handler.handle(&mut response).await {
            debug!(
                request_id = request_id.as_ref().map(RequestId::as_str),
                status = response.status().as_u16(),
                error = %err,
                "API returned an error"
            );
            return Err(err);
        }

        Ok(response)
    }
}

fn log_request(request: &Request) {
    debug!(
        method = %request.method(),
        url = %request.url(),
        request_id = request.context().request_id().map(RequestId::as_str),
        "built request"
    );
}

/// Slash-join the non-empty elements and clean the result; empty when both are empty.
fn join_path(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => String::new(),
        (false, true) => clean_path(prefix),
        (true, false) => clean_path(path),
        (false, false) => clean_path(&format!("{prefix}/{path}")),
    }
}

/// Lexically clean a slash-separated path.
///
/// Repeated slashes and `.` elements are dropped, `..` removes the element
/// before it, and a trailing slash is removed. `..` cannot climb above the
/// root of a rooted path. An empty result is `.`.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            segment => segments.push(segment),
        }
    }

    let joined = segments.join("/");
    if rooted {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::config::{with_base_url, with_user_agent};

    fn client(base: &str) -> Client {
        Client::new([with_base_url(base.parse().expect("base url"))])
    }

    #[test]
    fn join_path_cleans() {
        check!(join_path("", "") == "");
        check!(join_path("v1", "") == "v1");
        check!(join_path("", "/accounts/") == "/accounts");
        check!(join_path("v1", "accounts") == "v1/accounts");
        check!(join_path("/v1/", "/accounts") == "/v1/accounts");
        check!(join_path("v1", "a/./b/../c") == "v1/a/c");
        check!(join_path("v1", "../../x") == "../x");
        check!(join_path("/v1", "../../x") == "/x");
        check!(join_path("v1", "..") == ".");
        check!(join_path("v1", "accounts?limit=10") == "v1/accounts?limit=10");
        check!(join_path("", "http://[::1") == "http:/[::1");
    }

    #[test]
    fn new_request_resolves_against_base() {
        let client = client("https://api.upbound.io");
        let request = client
            .new_request(Context::new(), Method::GET, "v1", "accounts/acme")
            .expect("request");

        check!(request.method() == Method::GET);
        check!(request.url().as_str() == "https://api.upbound.io/v1/accounts/acme");
        check!(request.header(header::USER_AGENT) == Some(crate::DEFAULT_USER_AGENT));
        check!(request.header(header::CONTENT_TYPE).is_none());
        check!(request.body().is_none());
    }

    #[test]
    fn new_request_keeps_query() {
        let client = client("https://api.upbound.io");
        let request = client
            .new_request(Context::new(), Method::GET, "v1", "robots?limit=10")
            .expect("request");

        check!(request.url().path() == "/v1/robots");
        check!(request.url().query() == Some("limit=10"));
    }

    #[test]
    fn new_request_with_body_sets_json() {
        #[derive(Serialize)]
        struct Note {
            text: String,
        }

        let client = client("https://api.upbound.io");
        let request = client
            .new_request_with_body(
                Context::new(),
                Method::POST,
                "v1",
                "notes",
                &Note {
                    text: "<a&b>".to_string(),
                },
            )
            .expect("request");

        check!(request.header(header::CONTENT_TYPE) == Some("application/json"));
        let_assert!(Some(body) = request.body());
        check!(body.as_ref() == br#"{"text":"<a&b>"}"#);
    }

    #[test]
    fn new_request_keeps_context() {
        let id: RequestId = "ctx-1".parse().expect("id");
        let request = client("https://api.upbound.io")
            .new_request(
                Context::new().with_request_id(id.clone()),
                Method::DELETE,
                "v1",
                "robots/1",
            )
            .expect("request");

        check!(request.context().request_id() == Some(&id));
    }

    #[test]
    fn new_request_assigns_missing_id() {
        let client = client("https://api.upbound.io");
        let first = client
            .new_request(Context::new(), Method::GET, "v1", "ping")
            .expect("request");
        let second = client
            .new_request(Context::new(), Method::GET, "v1", "ping")
            .expect("request");

        let_assert!(Some(first) = first.context().request_id());
        let_assert!(Some(second) = second.context().request_id());
        check!(!first.as_str().is_empty());
        check!(first != second);
    }

    #[test]
    fn invalid_url_is_an_error() {
        let err = client("https://api.upbound.io")
            .new_request(Context::new(), Method::GET, "", "http://[::1")
            .expect_err("invalid url");

        let_assert!(Error::InvalidUrl(url::ParseError::InvalidIpv6Address) = err);
    }

    #[test]
    fn unserializable_body_is_an_error() {
        let body = std::collections::HashMap::from([((1, 2), "tuple keys")]);
        let err = client("https://api.upbound.io")
            .new_request_with_body(Context::new(), Method::PUT, "v1", "x", &body)
            .expect_err("serialization fails");

        let_assert!(Error::JsonSerialization(_) = err);
    }

    #[test]
    fn invalid_user_agent_is_an_error() {
        let client = Client::new([with_user_agent("bad\nagent")]);
        let err = client
            .new_request(Context::new(), Method::GET, "v1", "accounts")
            .expect_err("invalid header");

        let_assert!(Error::InvalidRequest(_) = err);
    }

    #[test]
    fn with_leaves_parent_unchanged() {
        let parent = client("https://api.upbound.io");
        let child = parent.with([
            with_base_url("https://spaces.upbound.io".parse().expect("url")),
            with_user_agent("child"),
        ]);

        check!(parent.base_url().as_str() == "https://api.upbound.io/");
        check!(parent.user_agent() == crate::DEFAULT_USER_AGENT);
        check!(child.base_url().as_str() == "https://spaces.upbound.io/");
        check!(child.user_agent() == "child");
        check!(Arc::ptr_eq(&parent.config().transport, &child.config().transport));
    }

    #[test]
    fn default_matches_new_without_modifiers() {
        let default = Client::default();
        let new = Client::new([]);
        check!(default.base_url() == new.base_url());
        check!(default.user_agent() == new.user_agent());
    }
}
