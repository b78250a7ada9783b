//! Core types and traits for the Upbound API HTTP client.
//!
//! This crate provides the transport-agnostic pieces of the client:
//! - [`Request`] and [`RequestBuilder`] - outgoing requests with their [`Context`]
//! - [`Response`] and [`Body`] - responses with a single-read streaming body
//! - [`Context`], [`RequestId`] and [`CancelHandle`] - request-scoped values
//! - [`Transport`] - the replaceable network capability
//! - [`ErrorHandler`] and [`DefaultErrorHandler`] - response classification
//! - [`Error`], [`ResponseError`] and [`Result`] - error handling
//! - [`Method`], [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod body;
mod context;
mod error;
mod handler;
pub mod prelude;
mod request;
mod response;
mod transport;

pub use body::{APPLICATION_JSON, Body, from_json, to_json};
pub use context::{CancelHandle, Context, REQUEST_ID_HEADER, RequestId};
pub use error::{Error, ResponseError, Result};
pub use handler::{DefaultErrorHandler, ErrorHandler, HandleFuture};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use transport::{Transport, TransportFuture};

// Re-export http crate types for methods, status codes and headers
pub use http::{Method, StatusCode, header};
