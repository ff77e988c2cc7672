//! TLS credentials and certificate loading.

use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::time;
use tokio_rustls::TlsConnector;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{aws_lc_rs, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::credentials::{authority_host, AuthInfo, ProtocolInfo, SecurityLevel, TransportCredentials};
use crate::error::DialError;
use crate::net::{BoxedConn, DialContext};

/// Errors raised while assembling TLS credentials.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no certificates found in {0:?}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0:?}")]
    NoPrivateKey(PathBuf),

    #[error("no trust anchors: set a CA certificate or skip verification")]
    NoTrustAnchors,

    #[error("TLS configuration error: {0}")]
    Tls(#[from] rustls::Error),
}

/// Client-side TLS credentials backed by rustls.
#[derive(Debug, Clone)]
pub struct TlsCredentials {
    config: Arc<ClientConfig>,
    server_name: Option<String>,
}

impl TlsCredentials {
    /// Wrap an existing rustls client configuration.
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            server_name: None,
        }
    }

    pub fn builder() -> TlsCredentialsBuilder {
        TlsCredentialsBuilder::default()
    }

    /// Credentials trusting only the certificates in a PEM file.
    pub fn from_pem_file(ca_cert_path: impl AsRef<Path>) -> Result<Self, CredentialsError> {
        Self::builder().ca_cert_path(ca_cert_path).build()
    }

    /// Verify the server against `name` instead of the dialed authority.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn client_config(&self) -> &Arc<ClientConfig> {
        &self.config
    }
}

#[async_trait]
impl TransportCredentials for TlsCredentials {
    async fn client_handshake(
        &self,
        ctx: &DialContext,
        authority: &str,
        raw: BoxedConn,
    ) -> Result<(BoxedConn, AuthInfo), DialError> {
        let host = self
            .server_name
            .as_deref()
            .unwrap_or_else(|| authority_host(authority));
        let server_name =
            ServerName::try_from(host.to_string()).map_err(|e| DialError::handshake(authority, e))?;

        let connector = TlsConnector::from(Arc::clone(&self.config));
        let stream = match time::timeout_at(ctx.deadline(), connector.connect(server_name, raw)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(DialError::handshake(authority, e)),
            Err(_) => {
                return Err(DialError::handshake(
                    authority,
                    io::Error::new(io::ErrorKind::TimedOut, "TLS handshake timed out"),
                ))
            }
        };

        let (_, session) = stream.get_ref();
        let auth = AuthInfo {
            auth_type: "tls",
            security_level: SecurityLevel::PrivacyAndIntegrity,
            protocol_version: session.protocol_version().map(|v| format!("{v:?}")),
            alpn_protocol: session.alpn_protocol().map(|p| p.to_vec()),
            peer_certificates: session.peer_certificates().map_or(0, |certs| certs.len()),
        };

        tracing::trace!(
            authority = %authority,
            version = ?auth.protocol_version,
            "TLS handshake complete"
        );

        Ok((Box::new(stream), auth))
    }

    fn info(&self) -> ProtocolInfo {
        ProtocolInfo {
            security_protocol: "tls",
            // Negotiated per connection; see `AuthInfo::protocol_version`.
            security_version: None,
            server_name: self.server_name.clone(),
        }
    }
}

/// Builder assembling [`TlsCredentials`] from files on disk.
#[derive(Debug, Clone, Default)]
pub struct TlsCredentialsBuilder {
    ca_cert_path: Option<PathBuf>,
    client_identity: Option<(PathBuf, PathBuf)>,
    server_name: Option<String>,
    alpn: Option<Vec<String>>,
    insecure_skip_verify: bool,
}

impl TlsCredentialsBuilder {
    /// PEM file holding the certificates to trust.
    pub fn ca_cert_path(mut self, path: impl AsRef<Path>) -> Self {
        self.ca_cert_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// PEM certificate chain and private key presented to the server.
    pub fn client_identity(mut self, cert_path: impl AsRef<Path>, key_path: impl AsRef<Path>) -> Self {
        self.client_identity = Some((
            cert_path.as_ref().to_path_buf(),
            key_path.as_ref().to_path_buf(),
        ));
        self
    }

    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// ALPN protocols to offer. Defaults to `h2`.
    pub fn alpn<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alpn = Some(protocols.into_iter().map(Into::into).collect());
        self
    }

    /// Accept any server certificate. Signatures are still checked.
    pub fn insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    pub fn build(self) -> Result<TlsCredentials, CredentialsError> {
        let provider = Arc::new(aws_lc_rs::default_provider());
        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let builder = if self.insecure_skip_verify {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(SkipServerVerification { provider }))
        } else {
            let path = self.ca_cert_path.as_ref().ok_or(CredentialsError::NoTrustAnchors)?;
            let mut roots = RootCertStore::empty();
            for cert in load_certs(path)? {
                roots.add(cert)?;
            }
            builder.with_root_certificates(roots)
        };

        let mut config = match &self.client_identity {
            Some((cert_path, key_path)) => {
                let chain = load_certs(cert_path)?;
                let key = load_private_key(key_path)?;
                builder.with_client_auth_cert(chain, key)?
            }
            None => builder.with_no_client_auth(),
        };

        config.alpn_protocols = self
            .alpn
            .unwrap_or_else(|| vec!["h2".to_string()])
            .into_iter()
            .map(String::into_bytes)
            .collect();

        let mut creds = TlsCredentials::new(Arc::new(config));
        creds.server_name = self.server_name;
        Ok(creds)
    }
}

/// Load every certificate from a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, CredentialsError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(CredentialsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

/// Load the first private key from a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, CredentialsError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| CredentialsError::NoPrivateKey(path.to_path_buf()))
}

fn open(path: &Path) -> Result<BufReader<File>, CredentialsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Debug)]
struct SkipServerVerification {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider.signature_verification_algorithms.supported_schemes()
    }
}
