//! Request-scoped context: correlation identifier, deadline and cancellation.
//!
//! Every [`Request`](crate::Request) owns a [`Context`]. Transports read it to
//! propagate the [`RequestId`] and to honor deadlines and cancellation; the
//! client itself never inspects the deadline or the cancellation signal.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use up_sdk_core::{Context, RequestId};
//!
//! let id: RequestId = "b3c1a2f0-trace".parse().expect("valid id");
//! let (ctx, cancel) = Context::new()
//!     .with_request_id(id.clone())
//!     .with_timeout(Duration::from_secs(5))
//!     .with_cancel();
//!
//! assert_eq!(RequestId::from_context(&ctx), Some(&id));
//! assert!(!ctx.is_canceled());
//! cancel.cancel();
//! assert!(ctx.is_canceled());
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use http::HeaderValue;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{Error, Result};

/// Header carrying the correlation identifier of each outgoing request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Opaque correlation identifier sent with a request.
///
/// Always non-empty and always a legal HTTP header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh identifier (a random UUID).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Validate and wrap an existing identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if `id` is empty or cannot be sent
    /// as a header value.
    pub fn parse(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::invalid_request("request id must not be empty"));
        }
        if let Err(err) = HeaderValue::from_str(&id) {
            return Err(Error::invalid_request(format!(
                "request id {id:?} is not a valid header value: {err}"
            )));
        }
        Ok(Self(id))
    }

    /// The identifier carried by `context`, if any.
    #[must_use]
    pub fn from_context(context: &Context) -> Option<&Self> {
        context.request_id.as_ref()
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RequestId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RequestId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl AsRef<str> for RequestId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Values scoped to a single logical API call.
///
/// Cheap to clone. A default context has no identifier, no deadline and can
/// never be canceled.
#[derive(Debug, Clone, Default)]
pub struct Context {
    request_id: Option<RequestId>,
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Context {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a correlation identifier.
    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Set an absolute deadline, keeping an earlier one if already present.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |current| current.min(deadline)));
        self
    }

    /// Set a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Make the context cancelable, returning the handle that cancels it.
    ///
    /// Clones of the returned context share the same signal.
    #[must_use]
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    /// The correlation identifier, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `Some(Duration::ZERO)` once it passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Whether the cancel handle has fired.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the context is canceled; never resolves otherwise.
    pub async fn canceled(&self) {
        if let Some(rx) = &self.cancel {
            let mut rx = rx.clone();
            let fired = rx.wait_for(|canceled| *canceled).await.is_ok();
            if fired {
                return;
            }
        }
        std::future::pending::<()>().await;
    }
}

/// Cancels the [`Context`] it was created with.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    /// Cancel every request carrying the associated context.
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}
