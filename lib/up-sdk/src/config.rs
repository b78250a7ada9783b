//! Client and transport configuration.
//!
//! [`ClientConfig`] is what a [`Client`](crate::Client) runs on: base URL,
//! user agent, transport and error handler. It is changed only through
//! [`ClientModifier`] functions applied to a copy, so a configuration already
//! shared by a client never changes underneath it.
//!
//! [`TransportConfig`] tunes the default [`HyperTransport`](crate::HyperTransport).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::middleware::DEFAULT_MAX_REDIRECTS;
use crate::{ContextTransport, DefaultErrorHandler, ErrorHandler, Transport};

/// Base URL of the Upbound API.
pub const DEFAULT_BASE_URL: &str = "https://api.upbound.io";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "up-sdk-rust";

/// Request timeout of the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Client Configuration
// ============================================================================

/// A function that modifies a [`ClientConfig`].
pub type ClientModifier = Box<dyn FnOnce(&mut ClientConfig) + Send>;

/// Configuration of a [`Client`](crate::Client).
///
/// Cloning is shallow: the clone shares the transport and error handler.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every request path is resolved against.
    pub base_url: Url,
    /// Decides which responses are failures.
    pub error_handler: Arc<dyn ErrorHandler>,
    /// Sends requests.
    pub transport: Arc<dyn Transport>,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
}

impl ClientConfig {
    /// Apply `modifiers` in order to a copy of this configuration.
    #[must_use]
    pub fn modified(&self, modifiers: impl IntoIterator<Item = ClientModifier>) -> Self {
        let mut config = self.clone();
        for modify in modifiers {
            modify(&mut config);
        }
        config
    }
}

impl Default for ClientConfig {
    /// The Upbound API defaults.
    ///
    /// The transport is a [`ContextTransport`] over a
    /// [`HyperTransport`](crate::HyperTransport) with a
    /// [`DEFAULT_TIMEOUT`] request timeout.
    ///
    /// # Panics
    ///
    /// Does not panic: [`DEFAULT_BASE_URL`] is a valid URL.
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            error_handler: Arc::new(DefaultErrorHandler),
            transport: Arc::new(ContextTransport::new()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::expect_used)]
fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")
}

/// Override the base URL.
#[must_use]
pub fn with_base_url(base_url: Url) -> ClientModifier {
    Box::new(move |config| config.base_url = base_url)
}

/// Override the `User-Agent` header value.
#[must_use]
pub fn with_user_agent(user_agent: impl Into<String>) -> ClientModifier {
    let user_agent = user_agent.into();
    Box::new(move |config| config.user_agent = user_agent)
}

/// Override the transport.
///
/// The transport is wrapped in a [`ContextTransport`], so requests keep their
/// `X-Request-Id` header. Set [`ClientConfig::transport`] directly and use
/// [`Client::from_config`](crate::Client::from_config) to send requests
/// exactly as built.
#[must_use]
pub fn with_transport<T: Transport>(transport: T) -> ClientModifier {
    let transport: Arc<dyn Transport> = Arc::new(ContextTransport::wrap(transport));
    Box::new(move |config| config.transport = transport)
}

/// Override the error handler.
#[must_use]
pub fn with_error_handler(error_handler: impl ErrorHandler) -> ClientModifier {
    let error_handler: Arc<dyn ErrorHandler> = Arc::new(error_handler);
    Box::new(move |config| config.error_handler = error_handler)
}

// ============================================================================
// Transport Configuration
// ============================================================================

/// Configuration for the hyper transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout, capped further by any context deadline.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
    /// Whether to offer HTTP/2 during TLS negotiation.
    pub http2: bool,
    /// Redirects followed before giving up; `0` disables following.
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            http2: true,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    http2: Option<bool>,
    max_redirects: Option<usize>,
}

impl TransportConfigBuilder {
    /// Set the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set whether HTTP/2 is offered.
    #[must_use]
    pub const fn http2(mut self, enabled: bool) -> Self {
        self.http2 = Some(enabled);
        self
    }

    /// Set how many redirects to follow.
    #[must_use]
    pub const fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = Some(max);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            http2: self.http2.unwrap_or(defaults.http2),
            max_redirects: self.max_redirects.unwrap_or(defaults.max_redirects),
        }
    }
}
