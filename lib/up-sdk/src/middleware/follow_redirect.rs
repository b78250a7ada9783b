//! Follow redirect middleware.
//!
//! 3xx responses carrying a `Location` header are followed before anything
//! above the transport sees them. Every hop keeps the request context, so the
//! same `X-Request-Id` and deadline apply to the whole chain.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::StatusCode;
use http::header::{self, HeaderMap};
use tower::{Layer, Service};
use tracing::debug;
use url::Url;

use crate::{Error, Method, REQUEST_ID_HEADER, Request, Response, Result};

/// Default maximum number of redirects to follow.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Layer that follows HTTP redirects.
///
/// # Example
///
/// ```ignore
/// use up_sdk::HyperTransport;
/// use up_sdk::middleware::FollowRedirectLayer;
///
/// let transport = HyperTransport::builder()
///     .max_redirects(0)
///     .layer(FollowRedirectLayer::with_max_redirects(3))
///     .build();
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FollowRedirectLayer {
    max_redirects: usize,
}

impl Default for FollowRedirectLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl FollowRedirectLayer {
    /// Follow up to [`DEFAULT_MAX_REDIRECTS`] redirects.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_max_redirects(DEFAULT_MAX_REDIRECTS)
    }

    /// Follow up to `max_redirects` redirects.
    #[must_use]
    pub const fn with_max_redirects(max_redirects: usize) -> Self {
        Self { max_redirects }
    }

    /// The redirect limit.
    #[must_use]
    pub const fn max_redirects(&self) -> usize {
        self.max_redirects
    }
}

impl<S> Layer<S> for FollowRedirectLayer {
    type Service = FollowRedirect<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FollowRedirect {
            inner,
            max_redirects: self.max_redirects,
        }
    }
}

/// Service that follows HTTP redirects.
#[derive(Debug, Clone)]
pub struct FollowRedirect<S> {
    inner: S,
    max_redirects: usize,
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303 | 307 | 308)
}

/// 307 and 308 replay the request as is. The others switch to GET without a
/// body, except that HEAD stays HEAD.
fn redirect_method(status: StatusCode, original: &Method) -> Method {
    match status.as_u16() {
        307 | 308 => original.clone(),
        _ if *original == Method::HEAD => Method::HEAD,
        _ => Method::GET,
    }
}

/// Credentials only travel to the host that asked for them.
fn strip_sensitive_headers(headers: &mut HeaderMap, from: &Url, to: &Url) {
    let same_origin = from.host_str() == to.host_str()
        && from.port_or_known_default() == to.port_or_known_default();
    if !same_origin {
        headers.remove(header::AUTHORIZATION);
        headers.remove(header::COOKIE);
        headers.remove(header::PROXY_AUTHORIZATION);
    }
}

/// The request for the next hop, or `None` when `response` is final.
fn next_request(request: &Request, response: &Response) -> Result<Option<Request>> {
    let status = response.status();
    if !is_redirect(status) {
        return Ok(None);
    }
    // a redirect without a location is handed back as an ordinary response
    let Some(location) = response.header(header::LOCATION) else {
        return Ok(None);
    };

    let url = request.url().join(location)?;
    let method = redirect_method(status, request.method());
    let keep_body = matches!(status.as_u16(), 307 | 308);

    let mut headers = request.headers().clone();
    strip_sensitive_headers(&mut headers, request.url(), &url);
    if !keep_body {
        headers.remove(header::CONTENT_TYPE);
        headers.remove(header::CONTENT_LENGTH);
    }

    let mut builder = Request::builder(method, url)
        .headers(headers)
        .context(request.context().clone());
    if keep_body && let Some(body) = request.body() {
        builder = builder.body(body.clone());
    }
    Ok(Some(builder.build()))
}

impl<S> Service<Request> for FollowRedirect<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let mut inner = self.inner.clone();
        let max_redirects = self.max_redirects;

        Box::pin(async move {
            let mut current = request;
            let mut redirects = 0;

            loop {
                let response = inner.call(current.clone()).await?;
                let Some(next) = next_request(&current, &response)? else {
                    return Ok(response);
                };
                if redirects >= max_redirects {
                    return Err(Error::TooManyRedirects(redirects));
                }
                // release the redirect body before the next hop
                drop(response);

                redirects += 1;
                debug!(
                    request_id = next.header(REQUEST_ID_HEADER).unwrap_or_default(),
                    from = %current.url(),
                    to = %next.url(),
                    redirects,
                    "following redirect"
                );
                current = next;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use assert2::{check, let_assert};
    use http::HeaderValue;
    use tower::ServiceExt;

    use super::*;
    use crate::{Body, BoxedService, RequestId};

    fn redirect(status: u16, location: Option<&'static str>) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(location) = location {
            headers.insert(header::LOCATION, HeaderValue::from_static(location));
        }
        let status = StatusCode::from_u16(status).expect("status");
        Response::new(status, headers, Body::from("moved"))
    }

    fn ok() -> Response {
        Response::new(StatusCode::OK, HeaderMap::new(), Body::from("done"))
    }

    /// Plays back `responses` in order and records every request.
    fn scripted(responses: Vec<Response>) -> (BoxedService, Arc<Mutex<Vec<Request>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(responses.into_iter()));
        let recorder = Arc::clone(&seen);
        let service = tower::service_fn(move |request: Request| {
            recorder.lock().expect("lock").push(request);
            let next = queue.lock().expect("lock").next();
            async move { next.ok_or_else(|| Error::connection("script exhausted")) }
        });
        (BoxedService::new(service), seen)
    }

    fn post(url: &str) -> Request {
        Request::builder(Method::POST, url.parse().expect("url"))
            .header(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"))
            .json(&serde_json::json!({"name": "ci"}))
            .expect("json")
            .context(
                crate::Context::new().with_request_id(RequestId::parse("hop").expect("id")),
            )
            .build()
    }

    #[test]
    fn default_max_redirects() {
        check!(FollowRedirectLayer::new().max_redirects() == DEFAULT_MAX_REDIRECTS);
        check!(FollowRedirectLayer::with_max_redirects(2).max_redirects() == 2);
    }

    #[test]
    fn redirect_statuses() {
        for status in [301, 302, 303, 307, 308] {
            check!(is_redirect(StatusCode::from_u16(status).expect("status")));
        }
        for status in [200, 300, 304, 404] {
            check!(!is_redirect(StatusCode::from_u16(status).expect("status")));
        }
    }

    #[test]
    fn redirect_methods() {
        check!(redirect_method(StatusCode::FOUND, &Method::POST) == Method::GET);
        check!(redirect_method(StatusCode::SEE_OTHER, &Method::HEAD) == Method::HEAD);
        check!(redirect_method(StatusCode::TEMPORARY_REDIRECT, &Method::PUT) == Method::PUT);
        check!(redirect_method(StatusCode::PERMANENT_REDIRECT, &Method::DELETE) == Method::DELETE);
    }

    #[tokio::test]
    async fn found_switches_to_get_without_body() {
        let (inner, seen) = scripted(vec![redirect(302, Some("/v1/new")), ok()]);

        let response = FollowRedirectLayer::new()
            .layer(inner)
            .oneshot(post("https://api.upbound.io/v1/old"))
            .await;

        let_assert!(Ok(response) = response);
        check!(response.status() == StatusCode::OK);

        let seen = seen.lock().expect("lock");
        let_assert!([_, second] = seen.as_slice());
        check!(second.method() == Method::GET);
        check!(second.url().as_str() == "https://api.upbound.io/v1/new");
        check!(second.body().is_none());
        check!(second.header(header::CONTENT_TYPE).is_none());
        check!(second.header(header::AUTHORIZATION) == Some("Bearer t"));
        check!(second.context().request_id().map(RequestId::as_str) == Some("hop"));
    }

    #[tokio::test]
    async fn temporary_redirect_replays_body() {
        let (inner, seen) = scripted(vec![
            redirect(307, Some("https://eu.upbound.io/v1/x")),
            ok(),
        ]);

        FollowRedirectLayer::new()
            .layer(inner)
            .oneshot(post("https://api.upbound.io/v1/x"))
            .await
            .expect("response");

        let seen = seen.lock().expect("lock");
        let_assert!([first, second] = seen.as_slice());
        check!(second.method() == Method::POST);
        check!(second.body() == first.body());
        check!(second.header(header::CONTENT_TYPE) == Some("application/json"));
        // another host does not get the credentials
        check!(second.header(header::AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn missing_location_is_returned() {
        let (inner, seen) = scripted(vec![redirect(302, None)]);

        let response = FollowRedirectLayer::new()
            .layer(inner)
            .oneshot(post("https://api.upbound.io/v1/x"))
            .await
            .expect("response");

        check!(response.status() == StatusCode::FOUND);
        check!(seen.lock().expect("lock").len() == 1);
    }

    #[tokio::test]
    async fn stops_at_the_limit() {
        let (inner, seen) = scripted(vec![
            redirect(301, Some("/a")),
            redirect(301, Some("/b")),
            redirect(301, Some("/c")),
        ]);

        let err = FollowRedirectLayer::with_max_redirects(2)
            .layer(inner)
            .oneshot(post("https://api.upbound.io/start"))
            .await
            .expect_err("limit");

        let_assert!(Error::TooManyRedirects(2) = err);
        check!(seen.lock().expect("lock").len() == 3);
    }

    #[tokio::test]
    async fn invalid_location_is_an_error() {
        let (inner, _) = scripted(vec![redirect(302, Some("http://[::1"))]);

        let err = FollowRedirectLayer::new()
            .layer(inner)
            .oneshot(post("https://api.upbound.io/v1/x"))
            .await
            .expect_err("bad location");

        let_assert!(Error::InvalidUrl(_) = err);
    }
}
