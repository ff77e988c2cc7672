//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, backoff ordering)
//! - Check TLS settings are complete
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TargetConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::TargetConfig;
use crate::net::Network;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &TargetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.target.trim().is_empty() {
        errors.push(ValidationError::new("target", "must not be empty"));
    }

    if config.network.parse::<Network>().is_err() {
        errors.push(ValidationError::new(
            "network",
            format!("unknown network {:?} (expected tcp or unix)", config.network),
        ));
    }

    let dial = &config.dial;
    if dial.timeout_ms == 0 {
        errors.push(ValidationError::new("dial.timeout_ms", "must be greater than 0"));
    }
    if dial.connect_timeout_ms == Some(0) {
        errors.push(ValidationError::new("dial.connect_timeout_ms", "must be greater than 0"));
    }
    if matches!(&dial.authority, Some(a) if a.trim().is_empty()) {
        errors.push(ValidationError::new("dial.authority", "must not be empty"));
    }
    if dial.backoff.base_delay_ms == 0 {
        errors.push(ValidationError::new("dial.backoff.base_delay_ms", "must be greater than 0"));
    }
    if dial.backoff.base_delay_ms > dial.backoff.max_delay_ms {
        errors.push(ValidationError::new(
            "dial.backoff.max_delay_ms",
            "must not be less than base_delay_ms",
        ));
    }

    if let Some(tls) = &config.tls {
        if tls.client_cert_path.is_some() != tls.client_key_path.is_some() {
            errors.push(ValidationError::new(
                "tls.client_key_path",
                "client_cert_path and client_key_path must be set together",
            ));
        }
        if tls.ca_cert_path.is_none() && !tls.insecure_skip_verify {
            errors.push(ValidationError::new(
                "tls.ca_cert_path",
                "required unless insecure_skip_verify is set",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    fn valid() -> TargetConfig {
        TargetConfig {
            target: "localhost:50051".into(),
            ..TargetConfig::default()
        }
    }

    #[test]
    fn default_with_target_is_valid() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = TargetConfig::default();
        config.network = "udp".into();
        config.dial.timeout_ms = 0;
        config.dial.backoff.base_delay_ms = 5_000;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["target", "network", "dial.timeout_ms", "dial.backoff.max_delay_ms"]
        );
    }

    #[test]
    fn tls_needs_trust_and_complete_identity() {
        let mut config = valid();
        config.tls = Some(TlsConfig {
            client_cert_path: Some("client.pem".into()),
            ..TlsConfig::default()
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().starts_with("tls.client_key_path"));
        assert_eq!(errors[1].field, "tls.ca_cert_path");
    }
}
