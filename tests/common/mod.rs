//! Shared utilities for integration testing.

#![allow(dead_code)]

use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::ServerConfig;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// Start a plaintext backend that accepts and holds connections open.
pub async fn start_tcp_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = tokio::io::copy(&mut socket, &mut tokio::io::sink()).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing listens on; connects to it are refused.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// A TLS backend presenting a self-signed certificate for "localhost".
pub struct TlsBackend {
    pub addr: SocketAddr,
    /// The backend's certificate, usable as a trust anchor.
    pub cert_pem: tempfile::NamedTempFile,
}

pub async fn start_tls_backend() -> TlsBackend {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_pem = write_temp(&certified.cert.pem());

    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der()));
    let chain: Vec<CertificateDer<'static>> = vec![certified.cert.der().clone()];

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(chain, key)
        .unwrap();
    config.alpn_protocols = vec![b"h2".to_vec()];
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        // Failed handshakes are expected in negative tests.
                        if let Ok(mut tls) = acceptor.accept(socket).await {
                            let _ = tokio::io::copy(&mut tls, &mut tokio::io::sink()).await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    TlsBackend { addr, cert_pem }
}

/// A PEM certificate unrelated to any backend.
pub fn untrusted_ca() -> tempfile::NamedTempFile {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    write_temp(&certified.cert.pem())
}

pub fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}
