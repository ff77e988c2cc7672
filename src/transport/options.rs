//! Dial options and their validation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::{InsecureCredentials, TransportCredentials};
use crate::error::DialError;
use crate::net::{Connector, NetDialer};
use crate::resilience::BackoffConfig;

/// A single dial configuration knob. Later options override earlier ones.
#[derive(Clone)]
pub enum DialOption {
    /// Secure connections with these credentials.
    TransportCredentials(Arc<dyn TransportCredentials>),
    /// Use plaintext connections.
    Insecure,
    /// Use this connector for raw connects.
    ContextDialer(Arc<dyn Connector>),
    /// Delay policy between dial rounds.
    Backoff {
        base_delay: Duration,
        max_delay: Duration,
    },
    /// Upper bound for a single round.
    ConnectTimeout(Duration),
    /// Authority presented during the handshake instead of the target address.
    Authority(String),
    /// Stop at the first failed attempt and return its error.
    ReturnFirstError,
}

impl fmt::Debug for DialOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialOption::TransportCredentials(creds) => {
                f.debug_tuple("TransportCredentials").field(&creds.info()).finish()
            }
            DialOption::Insecure => f.write_str("Insecure"),
            DialOption::ContextDialer(dialer) => f.debug_tuple("ContextDialer").field(dialer).finish(),
            DialOption::Backoff {
                base_delay,
                max_delay,
            } => f
                .debug_struct("Backoff")
                .field("base_delay", base_delay)
                .field("max_delay", max_delay)
                .finish(),
            DialOption::ConnectTimeout(timeout) => f.debug_tuple("ConnectTimeout").field(timeout).finish(),
            DialOption::Authority(authority) => f.debug_tuple("Authority").field(authority).finish(),
            DialOption::ReturnFirstError => f.write_str("ReturnFirstError"),
        }
    }
}

/// Options after validation.
#[derive(Debug, Clone)]
pub struct DialOptions {
    pub(crate) credentials: Arc<dyn TransportCredentials>,
    pub(crate) dialer: Arc<dyn Connector>,
    backoff: BackoffConfig,
    connect_timeout: Option<Duration>,
    authority: Option<String>,
    return_first_error: bool,
}

impl DialOptions {
    /// Validate and fold a sequence of options.
    ///
    /// Exactly one source of transport security must be present.
    pub fn parse(options: &[DialOption]) -> Result<Self, DialError> {
        let mut credentials: Option<Arc<dyn TransportCredentials>> = None;
        let mut dialer: Option<Arc<dyn Connector>> = None;
        let mut backoff = BackoffConfig::default();
        let mut connect_timeout = None;
        let mut authority = None;
        let mut return_first_error = false;

        for option in options {
            match option {
                DialOption::TransportCredentials(creds) => credentials = Some(Arc::clone(creds)),
                DialOption::Insecure => credentials = Some(Arc::new(InsecureCredentials)),
                DialOption::ContextDialer(d) => dialer = Some(Arc::clone(d)),
                DialOption::Backoff {
                    base_delay,
                    max_delay,
                } => {
                    if base_delay.is_zero() {
                        return Err(DialError::InvalidOption("backoff base delay must be positive".into()));
                    }
                    if base_delay > max_delay {
                        return Err(DialError::InvalidOption(format!(
                            "backoff base delay {base_delay:?} exceeds max delay {max_delay:?}"
                        )));
                    }
                    backoff = BackoffConfig {
                        base_delay: *base_delay,
                        max_delay: *max_delay,
                    };
                }
                DialOption::ConnectTimeout(timeout) => {
                    if timeout.is_zero() {
                        return Err(DialError::InvalidOption("connect timeout must be positive".into()));
                    }
                    connect_timeout = Some(*timeout);
                }
                DialOption::Authority(value) => {
                    if value.trim().is_empty() {
                        return Err(DialError::InvalidOption("authority must not be empty".into()));
                    }
                    authority = Some(value.clone());
                }
                DialOption::ReturnFirstError => return_first_error = true,
            }
        }

        let credentials = credentials.ok_or_else(|| {
            DialError::InvalidOption(
                "no transport security set (use TransportCredentials or Insecure)".into(),
            )
        })?;

        Ok(Self {
            credentials,
            dialer: dialer.unwrap_or_else(|| Arc::new(NetDialer::default())),
            backoff,
            connect_timeout,
            authority,
            return_first_error,
        })
    }

    pub fn backoff(&self) -> BackoffConfig {
        self.backoff
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn returns_first_error(&self) -> bool {
        self.return_first_error
    }
}
