//! Prelude module for convenient imports.
//!
//! ```ignore
//! use up_sdk::prelude::*;
//! ```

pub use crate::{
    Client, ClientModifier, Context, ContextTransport, Error, HyperTransport, Method, RequestId,
    ResponseError, Result, StatusCode, with_base_url, with_error_handler, with_transport,
    with_user_agent,
};

// Re-export serde for response and body types
pub use serde::{Deserialize, Serialize};
