//! Transport security capabilities.
//!
//! # Responsibilities
//! - Define the [`TransportCredentials`] handshake seam
//! - Describe negotiated security ([`AuthInfo`]) and the protocol offered ([`ProtocolInfo`])
//! - Provide the plaintext fallback used when no credentials are configured

use async_trait::async_trait;
use std::fmt;

use crate::error::DialError;
use crate::net::{BoxedConn, DialContext};

pub mod tls;

pub use tls::{CredentialsError, TlsCredentials, TlsCredentialsBuilder};

/// Security level reached by a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityLevel {
    NoSecurity,
    PrivacyAndIntegrity,
}

/// Details of a completed client handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    /// `"insecure"` or `"tls"`.
    pub auth_type: &'static str,
    pub security_level: SecurityLevel,
    /// Negotiated protocol version, e.g. `"TLSv1_3"`.
    pub protocol_version: Option<String>,
    /// Negotiated ALPN protocol.
    pub alpn_protocol: Option<Vec<u8>>,
    /// Number of certificates the peer presented.
    pub peer_certificates: usize,
}

impl AuthInfo {
    pub fn insecure() -> Self {
        Self {
            auth_type: "insecure",
            security_level: SecurityLevel::NoSecurity,
            protocol_version: None,
            alpn_protocol: None,
            peer_certificates: 0,
        }
    }
}

/// Static description of what a credentials implementation offers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolInfo {
    pub security_protocol: &'static str,
    pub security_version: Option<&'static str>,
    pub server_name: Option<String>,
}

/// Transport security handshake capability.
#[async_trait]
pub trait TransportCredentials: Send + Sync + fmt::Debug {
    /// Secure `raw` for `authority`, returning the wrapped stream and what
    /// was negotiated.
    async fn client_handshake(
        &self,
        ctx: &DialContext,
        authority: &str,
        raw: BoxedConn,
    ) -> Result<(BoxedConn, AuthInfo), DialError>;

    fn info(&self) -> ProtocolInfo;
}

/// Plaintext credentials: the handshake is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsecureCredentials;

#[async_trait]
impl TransportCredentials for InsecureCredentials {
    async fn client_handshake(
        &self,
        _ctx: &DialContext,
        _authority: &str,
        raw: BoxedConn,
    ) -> Result<(BoxedConn, AuthInfo), DialError> {
        Ok((raw, AuthInfo::insecure()))
    }

    fn info(&self) -> ProtocolInfo {
        ProtocolInfo {
            security_protocol: "insecure",
            security_version: None,
            server_name: None,
        }
    }
}

/// Host part of an authority (`host:port`, `[v6]:port`, or bare host).
pub(crate) fn authority_host(authority: &str) -> &str {
    if let Some(rest) = authority.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    match authority.rsplit_once(':') {
        // A second colon means a bare IPv6 literal, not a port separator.
        Some((host, _port)) if !host.contains(':') => host,
        _ => authority,
    }
}
