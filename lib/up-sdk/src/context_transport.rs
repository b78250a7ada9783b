//! Transport decorator that propagates the request correlation identifier.

use http::header::{HeaderName, HeaderValue};

use crate::{
    Error, HyperTransport, REQUEST_ID_HEADER, Request, RequestId, Transport, TransportFuture,
};

/// Sets the `X-Request-Id` header on every request, then delegates.
///
/// The value is the [`RequestId`] from the request context, or a freshly
/// generated one when the context carries none. An existing header value is
/// replaced. The caller's context is never modified.
///
/// [`with_transport`](crate::with_transport) applies it to any transport.
///
/// # Example
///
/// ```ignore
/// use up_sdk::{ClientConfig, ContextTransport, HyperTransport};
///
/// let transport = ContextTransport::wrap(HyperTransport::builder().with_logging().build());
/// let config = ClientConfig {
///     transport: std::sync::Arc::new(transport),
///     ..ClientConfig::default()
/// };
/// let client = up_sdk::Client::from_config(config);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextTransport<T = HyperTransport> {
    inner: T,
}

impl ContextTransport {
    /// Decorate a default [`HyperTransport`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> ContextTransport<T> {
    /// Decorate `inner`.
    #[must_use]
    pub const fn wrap(inner: T) -> Self {
        Self { inner }
    }

    /// The decorated transport.
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    /// Consume into the decorated transport.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Transport> Transport for ContextTransport<T> {
    fn round_trip(&self, mut request: Request) -> TransportFuture {
        let id = RequestId::from_context(request.context())
            .cloned()
            .unwrap_or_default();

        let value = match HeaderValue::from_str(id.as_str()) {
            Ok(value) => value,
            Err(err) => {
                let err = Error::invalid_request(format!("request id {id}: {err}"));
                return Box::pin(async move { Err(err) });
            }
        };

        request
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
        self.inner.round_trip(request)
    }
}
