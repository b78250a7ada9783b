//! Request/response logging middleware.
//!
//! Each request runs inside an `upbound_request` span carrying the method,
//! URL and `X-Request-Id`. Completion events repeat the request ID so they
//! can be correlated with API-side logs without the span. Rejections (4xx)
//! are warnings, server failures (5xx) are errors.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use http::StatusCode;
use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, error, info, span, warn};

use crate::{Error, REQUEST_ID_HEADER, Request, Response, Result};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```ignore
/// use up_sdk::HyperTransport;
/// use up_sdk::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Also log request and response headers.
    Debug,
    /// Summary only.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// The configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

/// How a completed exchange is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Redirect,
    Rejected,
    ServerError,
}

impl Outcome {
    fn of(status: StatusCode) -> Self {
        if status.is_server_error() {
            Self::ServerError
        } else if status.is_client_error() {
            Self::Rejected
        } else if status.is_redirection() {
            Self::Redirect
        } else {
            Self::Success
        }
    }
}

/// `"2xx"`, `"4xx"` and so on.
fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() / 100 {
        1 => "1xx",
        2 => "2xx",
        3 => "3xx",
        4 => "4xx",
        _ => "5xx",
    }
}

/// The ID on the wire, falling back to the one held by the context.
fn request_id_of(request: &Request) -> String {
    request
        .header(REQUEST_ID_HEADER)
        .map(str::to_string)
        .or_else(|| {
            request
                .context()
                .request_id()
                .map(|id| id.as_str().to_string())
        })
        .unwrap_or_default()
}

fn log_response(response: &Response, request_id: &str, elapsed_ms: u64, level: LogLevel) {
    let status = response.status();
    let class = status_class(status);
    let code = status.as_u16();

    if level == LogLevel::Debug {
        debug!(request_id, headers = ?response.headers(), "response headers");
    }
    match Outcome::of(status) {
        Outcome::Success => {
            info!(request_id, status = code, class, elapsed_ms, "request completed");
        }
        Outcome::Redirect => {
            info!(request_id, status = code, class, elapsed_ms, "redirect not followed");
        }
        Outcome::Rejected => {
            warn!(request_id, status = code, class, elapsed_ms, "request rejected");
        }
        Outcome::ServerError => {
            error!(request_id, status = code, class, elapsed_ms, "server error");
        }
    }
}

fn log_failure(err: &Error, request_id: &str, elapsed_ms: u64) {
    warn!(
        request_id,
        error = %err,
        timeout = err.is_timeout(),
        canceled = err.is_canceled(),
        connection = err.is_connection(),
        elapsed_ms,
        "request failed"
    );
}

impl<S> Service<Request> for Logging<S>
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
        let method = request.method().clone();
        let url = request.url().to_string();
        let request_id = request_id_of(&request);
        let level = self.level;

        let span = span!(Level::INFO, "upbound_request", %method, %url, request_id = %request_id);

        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();

                match level {
                    LogLevel::Debug => {
                        let body_len = request.body().map_or(0, |body| body.len());
                        debug!(headers = ?request.headers(), body_len, "sending request");
                    }
                    LogLevel::Info => {
                        info!("sending request");
                    }
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) => log_response(response, &request_id, elapsed_ms, level),
                    Err(err) => log_failure(err, &request_id, elapsed_ms),
                }

                result
            }
            .instrument(span),
        )
    }
}
