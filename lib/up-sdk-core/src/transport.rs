//! The transport capability: send one request, return one response.
//!
//! Transports are the replaceable bottom of the stack. Connection pooling,
//! TLS, retries and rate limiting, if any, live behind this trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Future returned by [`Transport::round_trip`].
pub type TransportFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Sends a [`Request`] and returns the [`Response`] with its body unread.
///
/// A transport reports only network-level failures. Any response the server
/// sends back, whatever its status, is `Ok`.
///
/// Implementations should honor the request [`Context`](crate::Context):
/// abort with [`Error::Canceled`](crate::Error::Canceled) when it is canceled
/// and with [`Error::Timeout`](crate::Error::Timeout) once its deadline passes.
pub trait Transport: Send + Sync + 'static {
    /// Execute an HTTP request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be completed:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts and elapsed deadlines
    /// - Cancellation
    fn round_trip(&self, request: Request) -> TransportFuture;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn round_trip(&self, request: Request) -> TransportFuture {
        (**self).round_trip(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn round_trip(&self, request: Request) -> TransportFuture {
        (**self).round_trip(request)
    }
}
