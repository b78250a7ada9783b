//! HTTP transport implementation using hyper-util.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::Layer;
use tower::util::BoxCloneService;
use tower_service::Service;

use crate::middleware::{FollowRedirectLayer, LoggingLayer};
use crate::{
    Body, Error, Request, Response, Result, Transport, TransportFuture,
    config::{TransportConfig, TransportConfigBuilder},
};

// ============================================================================
// Type-Erased Service for Middleware Composition
// ============================================================================

/// Type-erased service for middleware composition.
///
/// This type allows storing and composing arbitrary Tower layers without
/// exposing complex generic types to users.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Future type for Tower Service implementation.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;

/// Thread-safe wrapper for `BoxedService`.
///
/// `BoxCloneService` is not `Sync`, which [`Transport`] requires.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        // Lock, clone the service, and release the lock immediately
        let mut service = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        Box::pin(async move { service.call(request).await })
    }
}

// ============================================================================
// Connector
// ============================================================================

/// HTTPS connector with rustls and the Mozilla root certificates.
///
/// Plain `http://` URLs are accepted too.
fn https_connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let root_store: rustls::RootCertStore =
        webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();

    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(config.connect_timeout));

    let builder = HttpsConnectorBuilder::new()
        .with_tls_config(tls_config)
        .https_or_http()
        .enable_http1();

    if config.http2 {
        builder.enable_http2().wrap_connector(http)
    } else {
        builder.wrap_connector(http)
    }
}

// ============================================================================
// Raw Transport (internal, used for direct hyper access)
// ============================================================================

/// Raw transport using hyper-util, before any middleware.
#[derive(Clone)]
struct RawHyperTransport {
    inner: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    config: TransportConfig,
}

impl RawHyperTransport {
    fn new(config: TransportConfig) -> Self {
        let connector = https_connector(&config);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_idle_per_host)
            .build(connector);

        Self { inner, config }
    }

    /// The configured timeout, shortened to what is left of the context deadline.
    fn effective_timeout(&self, remaining: Option<Duration>) -> Duration {
        remaining.map_or(self.config.timeout, |remaining| {
            remaining.min(self.config.timeout)
        })
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let (method, url, headers, body, context) = request.into_parts();
        if context.is_canceled() {
            return Err(Error::Canceled);
        }

        let mut hyper_request = http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .body(body.map_or_else(Full::default, Full::new))
            .map_err(|e| Error::invalid_request(e.to_string()))?;
        *hyper_request.headers_mut() = headers;

        let timeout = self.effective_timeout(context.remaining());
        let response = tokio::select! {
            biased;
            () = context.canceled() => return Err(Error::Canceled),
            result = tokio::time::timeout(timeout, self.inner.request(hyper_request)) => result
                .map_err(|_| Error::Timeout)?
                .map_err(Self::map_hyper_error)?,
        };

        let (parts, body) = response.into_parts();
        let body = body
            .map_err(|e| Error::connection(e.to_string()))
            .boxed_unsync();

        Ok(Response::new(parts.status, parts.headers, Body::from(body)))
    }

    #[allow(clippy::needless_pass_by_value)]
    fn map_hyper_error(err: hyper_util::client::legacy::Error) -> Error {
        let msg = error_chain(&err);

        if msg.contains("ssl") || msg.contains("tls") || msg.contains("certificate") {
            return Error::tls(msg);
        }

        Error::connection(msg)
    }
}

/// Messages of `err` and all of its sources, outermost first.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut messages = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages.join(": ")
}

impl Service<Request> for RawHyperTransport {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let transport = self.clone();
        Box::pin(async move { transport.execute(request).await })
    }
}

// ============================================================================
// Public Transport
// ============================================================================

/// HTTP transport using hyper-util with connection pooling, TLS, and middleware support.
///
/// The request [`Context`](crate::Context) is honored: a canceled context
/// fails with [`Error::Canceled`], and the request timeout never outlives the
/// context deadline. The response body is streamed, not buffered.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use up_sdk::HyperTransport;
///
/// let transport = HyperTransport::builder()
///     .timeout(Duration::from_secs(30))
///     .with_logging()
///     .build();
/// ```
#[derive(Clone)]
pub struct HyperTransport {
    service: SyncService,
    config: TransportConfig,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    /// Create a new transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create a new transport with custom configuration (no extra middleware).
    #[must_use]
    pub fn with_config(config: TransportConfig) -> Self {
        Self::with_service(base_service(&config), config)
    }

    fn with_service(service: BoxedService, config: TransportConfig) -> Self {
        Self {
            service: SyncService::new(service),
            config,
        }
    }

    /// Create a new transport builder.
    #[must_use]
    pub fn builder() -> HyperTransportBuilder {
        HyperTransportBuilder::default()
    }

    /// Get the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for HyperTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HyperTransport {
    fn round_trip(&self, request: Request) -> TransportFuture {
        self.service.call(request)
    }
}

/// The hyper client with redirect following, below every other layer.
fn base_service(config: &TransportConfig) -> BoxedService {
    let raw = BoxCloneService::new(RawHyperTransport::new(config.clone()));
    if config.max_redirects == 0 {
        return raw;
    }
    BoxCloneService::new(FollowRedirectLayer::with_max_redirects(config.max_redirects).layer(raw))
}

/// Builder for [`HyperTransport`].
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
#[derive(Default)]
pub struct HyperTransportBuilder {
    config: TransportConfigBuilder,
    layers: Vec<Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>>,
    use_defaults: bool,
}

impl std::fmt::Debug for HyperTransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransportBuilder")
            .field("config", &self.config)
            .field("layers_count", &self.layers.len())
            .field("use_defaults", &self.use_defaults)
            .finish()
    }
}

impl HyperTransportBuilder {
    // ========================================================================
    // Core Configuration
    // ========================================================================

    /// Set the request timeout (applied at the connection level, not middleware).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.timeout(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.connect_timeout(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config = self.config.pool_idle_per_host(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.pool_idle_timeout(timeout);
        self
    }

    /// Set whether HTTP/2 is offered.
    #[must_use]
    pub fn http2(mut self, enabled: bool) -> Self {
        self.config = self.config.http2(enabled);
        self
    }

    /// Set how many redirects to follow; `0` hands 3xx responses back.
    #[must_use]
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config = self.config.max_redirects(max);
        self
    }

    // ========================================================================
    // Middleware
    // ========================================================================

    /// Add a Tower layer to the transport.
    ///
    /// Layers are applied in order: first added = innermost, last added =
    /// outermost (processes requests first).
    #[must_use]
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers.push(Arc::new(move |service| {
            BoxCloneService::new(layer.layer(service))
        }));
        self
    }

    /// Alias for [`layer`](Self::layer).
    #[must_use]
    pub fn with<L>(self, layer: L) -> Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layer(layer)
    }

    /// Add request/response logging.
    #[must_use]
    pub fn with_logging(self) -> Self {
        self.layer(LoggingLayer::new())
    }

    /// Add debug-level logging (includes headers).
    #[must_use]
    pub fn with_debug_logging(self) -> Self {
        self.layer(LoggingLayer::debug())
    }

    // ========================================================================
    // Defaults Control
    // ========================================================================

    /// Enable the default middleware, currently request logging.
    ///
    /// Defaults are applied before any layers added via `.layer()`.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.use_defaults = true;
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build the transport with all configured middleware.
    #[must_use]
    pub fn build(self) -> HyperTransport {
        let config = self.config.build();
        let mut service = base_service(&config);

        if self.use_defaults {
            service = BoxCloneService::new(LoggingLayer::new().layer(service));
        }

        for layer_fn in self.layers {
            service = layer_fn(service);
        }

        HyperTransport::with_service(service, config)
    }
}
