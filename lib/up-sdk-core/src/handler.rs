//! Classification of completed responses into success or a typed error.

use std::future::Future;
use std::pin::Pin;

use crate::{Error, Response, ResponseError};

/// Future returned by [`ErrorHandler::handle`].
pub type HandleFuture<'a> = Pin<Box<dyn Future<Output = Option<Error>> + Send + 'a>>;

/// Decides whether a completed response is a failure.
///
/// Implement this trait to customize how error responses are handled. The
/// handler may read the response body; when it returns `None` the body it
/// left behind is what the client decodes.
///
/// # Example
///
/// ```ignore
/// use up_sdk_core::{Error, ErrorHandler, HandleFuture, Response};
///
/// struct StrictHandler;
///
/// impl ErrorHandler for StrictHandler {
///     fn handle<'a>(&'a self, response: &'a mut Response) -> HandleFuture<'a> {
///         Box::pin(async move {
///             (response.status() != 200)
///                 .then(|| Error::invalid_request(format!("unexpected {}", response.status())))
///         })
///     }
/// }
/// ```
pub trait ErrorHandler: Send + Sync + 'static {
    /// Return `None` for success, or the error describing the failure.
    fn handle<'a>(&'a self, response: &'a mut Response) -> HandleFuture<'a>;
}

/// Handles error responses from the Upbound API.
///
/// 2xx responses succeed. Any other status reads the body once and returns,
/// in order of preference:
/// 1. the API's own error envelope when it parses and has a non-zero status;
/// 2. a [`ResponseError`] with the status, its reason phrase and the raw
///    body as detail;
/// 3. the same without detail when the body is empty or unreadable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorHandler;

impl ErrorHandler for DefaultErrorHandler {
    fn handle<'a>(&'a self, response: &'a mut Response) -> HandleFuture<'a> {
        Box::pin(async move {
            let status = response.status();
            if status.is_success() {
                return None;
            }

            let detail = match response.bytes().await {
                Ok(body) => {
                    if let Ok(envelope) = serde_json::from_slice::<ResponseError>(&body)
                        && envelope.status != 0
                    {
                        return Some(Error::Response(envelope));
                    }
                    (!body.is_empty()).then(|| String::from_utf8_lossy(&body).into_owned())
                }
                Err(_) => None,
            };

            Some(Error::Response(ResponseError::from_status(status, detail)))
        })
    }
}
