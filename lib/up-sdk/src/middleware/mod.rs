//! Tower middleware layers for [`HyperTransport`](crate::HyperTransport).
//!
//! Layers wrap the type-erased [`BoxedService`](crate::BoxedService) and are
//! added with [`HyperTransportBuilder::layer`](crate::HyperTransportBuilder::layer).
//!
//! # Available Layers
//!
//! - [`FollowRedirectLayer`] - Follows 3xx responses, on by default
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//!
//! # Example
//!
//! ```ignore
//! use up_sdk::HyperTransport;
//! use up_sdk::middleware::LoggingLayer;
//!
//! let transport = HyperTransport::builder()
//!     .layer(LoggingLayer::debug())
//!     .build();
//! ```

mod follow_redirect;
mod logging;

pub use follow_redirect::{DEFAULT_MAX_REDIRECTS, FollowRedirect, FollowRedirectLayer};
pub use logging::{LogLevel, Logging, LoggingLayer};
