//! Connector that remembers its last failure.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::DialError;
use crate::net::{BoxedConn, Connector, DialContext};

/// Wraps a [`Connector`] and records the most recent connect error.
///
/// Success does not clear a recorded error.
#[derive(Debug)]
pub struct ErrTrackingConnector<C> {
    inner: C,
    last_err: Mutex<Option<DialError>>,
}

impl<C> ErrTrackingConnector<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last_err: Mutex::new(None),
        }
    }

    /// The last connect error observed, if any.
    pub fn err(&self) -> Option<DialError> {
        self.last_err.lock().clone()
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Connector> Connector for ErrTrackingConnector<C> {
    async fn dial(&self, ctx: &DialContext, addr: &str) -> Result<BoxedConn, DialError> {
        let result = self.inner.dial(ctx, addr).await;
        if let Err(e) = &result {
            *self.last_err.lock() = Some(e.clone());
        }
        result
    }
}
