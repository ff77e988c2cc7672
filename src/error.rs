//! Dial error taxonomy.
//!
//! Every layer (raw connect, handshake, dial primitive, orchestrator,
//! registry) reports failures as [`DialError`]. The type is `Clone` because a
//! tracking decorator keeps a copy of each failure it observes while the
//! original still flows back to the dial primitive.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Boxed error type used for handshake failure sources.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can occur while establishing a connection.
#[derive(Debug, Clone, Error)]
pub enum DialError {
    /// The raw network connection could not be established
    /// (refused, unreachable, DNS failure, connect timeout).
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Transport security negotiation failed after the connection was open.
    #[error("transport handshake with {addr} failed: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// The dial deadline elapsed before a connection was established.
    #[error("context deadline exceeded dialing {target} (timeout {timeout:?})")]
    DeadlineExceeded { target: String, timeout: Duration },

    /// A dial option was missing or malformed.
    #[error("invalid dial option: {0}")]
    InvalidOption(String),

    /// The target could not be resolved into any address.
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// `update` was called before any dial settings were configured.
    #[error("dial settings not configured")]
    NotConfigured,
}

impl DialError {
    /// Build a connect error from an IO error.
    pub fn connect(addr: impl Into<String>, source: std::io::Error) -> Self {
        Self::Connect {
            addr: addr.into(),
            source: Arc::new(source),
        }
    }

    /// Build a handshake error from any error type.
    pub fn handshake(addr: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Handshake {
            addr: addr.into(),
            source: Arc::from(source.into()),
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    pub fn is_handshake(&self) -> bool {
        matches!(self, Self::Handshake { .. })
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Handshake { .. } => "handshake",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
            Self::InvalidOption(_) => "invalid_option",
            Self::InvalidTarget(_) => "invalid_target",
            Self::NotConfigured => "not_configured",
        }
    }

    /// IO error kind of a connect failure, if this is one.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Connect { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
