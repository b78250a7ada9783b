//! HTTP client for the Upbound API.
//!
//! A [`Client`] builds JSON requests relative to a base URL, sends them
//! through a [`Transport`] and turns failed responses into a typed [`Error`]
//! through an [`ErrorHandler`].
//!
//! The default transport is a [`ContextTransport`], which stamps each request
//! with an `X-Request-Id` header, over a [`HyperTransport`] built on hyper-util
//! and rustls.
//!
//! # Example
//!
//! ```ignore
//! use up_sdk::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct Account {
//!     name: String,
//! }
//!
//! let client = Client::new([with_user_agent("up-cli/0.30")]);
//! let context = Context::new().with_request_id(RequestId::new());
//! let request = client.new_request(context, Method::GET, "v1", "accounts/acme")?;
//!
//! match client.execute_json::<Account>(request).await {
//!     Ok(account) => println!("{}", account.name),
//!     Err(err) if err.is_not_found() => println!("no such account"),
//!     Err(err) => return Err(err),
//! }
//! ```

mod client;
mod config;
mod context_transport;
pub mod middleware;
pub mod prelude;
mod transport;

pub use client::Client;
pub use config::{
    ClientConfig, ClientModifier, DEFAULT_BASE_URL, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT,
    TransportConfig, TransportConfigBuilder, with_base_url, with_error_handler, with_transport,
    with_user_agent,
};
pub use context_transport::ContextTransport;
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use up_sdk_core::{
    APPLICATION_JSON, Body, CancelHandle, Context, DefaultErrorHandler, Error, ErrorHandler,
    HandleFuture, REQUEST_ID_HEADER, Request, RequestBuilder, RequestId, Response, ResponseError,
    Result, Transport, TransportFuture, from_json, to_json,
};

// Re-export http types for methods, status codes and headers
pub use up_sdk_core::{Method, StatusCode, header};

pub use url;
