//! Prelude module for convenient imports.
//!
//! ```ignore
//! use up_sdk_core::prelude::*;
//! ```

pub use crate::{
    Body, Context, DefaultErrorHandler, Error, ErrorHandler, Method, Request, RequestBuilder,
    RequestId, Response, ResponseError, Result, StatusCode, Transport,
};
