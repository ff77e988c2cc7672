//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::credentials::{CredentialsError, TlsCredentials, TransportCredentials};
use crate::registry::DialSettings;
use crate::transport::DialOption;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Endpoint to connect to (e.g., "localhost:50051").
    pub target: String,

    /// Network kind: "tcp" or "unix".
    pub network: String,

    /// Dial behaviour.
    pub dial: DialConfig,

    /// TLS settings. Plaintext when absent.
    pub tls: Option<TlsConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            network: "tcp".to_string(),
            dial: DialConfig::default(),
            tls: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl TargetConfig {
    /// Build the registry settings, loading any TLS material from disk.
    pub fn dial_settings(&self) -> Result<DialSettings, CredentialsError> {
        let credentials = match &self.tls {
            Some(tls) => Some(Arc::new(tls.credentials()?) as Arc<dyn TransportCredentials>),
            None => None,
        };

        Ok(DialSettings {
            timeout: self.dial.timeout(),
            credentials,
            fail_fast: self.dial.fail_fast,
            options: self.dial.options(),
        })
    }
}

/// Dial configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DialConfig {
    /// Overall deadline for establishing a connection, in milliseconds.
    pub timeout_ms: u64,

    /// Return the first failure instead of retrying until the deadline.
    pub fail_fast: bool,

    /// Upper bound for a single dial round, in milliseconds.
    pub connect_timeout_ms: Option<u64>,

    /// Authority presented during the handshake instead of the target.
    pub authority: Option<String>,

    /// Delay between dial rounds.
    pub backoff: BackoffSettings,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            fail_fast: false,
            connect_timeout_ms: None,
            authority: None,
            backoff: BackoffSettings::default(),
        }
    }
}

impl DialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Dial options derived from this configuration.
    pub fn options(&self) -> Vec<DialOption> {
        let mut options = vec![DialOption::Backoff {
            base_delay: Duration::from_millis(self.backoff.base_delay_ms),
            max_delay: Duration::from_millis(self.backoff.max_delay_ms),
        }];
        if let Some(ms) = self.connect_timeout_ms {
            options.push(DialOption::ConnectTimeout(Duration::from_millis(ms)));
        }
        if let Some(authority) = &self.authority {
            options.push(DialOption::Authority(authority.clone()));
        }
        options
    }
}

/// Backoff between dial rounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

/// TLS configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// PEM file with the certificates to trust.
    pub ca_cert_path: Option<String>,

    /// PEM client certificate chain for mutual TLS.
    pub client_cert_path: Option<String>,

    /// PEM private key matching `client_cert_path`.
    pub client_key_path: Option<String>,

    /// Name to verify the server certificate against.
    pub server_name: Option<String>,

    /// ALPN protocols to offer (default: ["h2"]).
    pub alpn: Option<Vec<String>>,

    /// Accept any server certificate.
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    pub fn credentials(&self) -> Result<TlsCredentials, CredentialsError> {
        let mut builder = TlsCredentials::builder().insecure_skip_verify(self.insecure_skip_verify);
        if let Some(path) = &self.ca_cert_path {
            builder = builder.ca_cert_path(path);
        }
        if let (Some(cert), Some(key)) = (&self.client_cert_path, &self.client_key_path) {
            builder = builder.client_identity(cert, key);
        }
        if let Some(name) = &self.server_name {
            builder = builder.server_name(name.clone());
        }
        if let Some(alpn) = &self.alpn {
            builder = builder.alpn(alpn.iter().cloned());
        }
        builder.build()
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
