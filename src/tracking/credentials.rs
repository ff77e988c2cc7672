//! Transport credentials that remember their last handshake failure.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::credentials::{AuthInfo, ProtocolInfo, TransportCredentials};
use crate::error::DialError;
use crate::net::{BoxedConn, DialContext};

/// Wraps [`TransportCredentials`] and records the most recent handshake error.
///
/// Handshake results and protocol info pass through unmodified.
#[derive(Debug)]
pub struct ErrTrackingCredentials {
    inner: Arc<dyn TransportCredentials>,
    last_err: Mutex<Option<DialError>>,
}

impl ErrTrackingCredentials {
    pub fn new(inner: Arc<dyn TransportCredentials>) -> Self {
        Self {
            inner,
            last_err: Mutex::new(None),
        }
    }

    /// The last handshake error observed, if any.
    pub fn err(&self) -> Option<DialError> {
        self.last_err.lock().clone()
    }
}

#[async_trait]
impl TransportCredentials for ErrTrackingCredentials {
    async fn client_handshake(
        &self,
        ctx: &DialContext,
        authority: &str,
        raw: BoxedConn,
    ) -> Result<(BoxedConn, AuthInfo), DialError> {
        let result = self.inner.client_handshake(ctx, authority, raw).await;
        if let Err(e) = &result {
            *self.last_err.lock() = Some(e.clone());
        }
        result
    }

    fn info(&self) -> ProtocolInfo {
        self.inner.info()
    }
}
