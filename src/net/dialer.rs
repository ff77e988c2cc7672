//! Raw network connect capability.
//!
//! # Responsibilities
//! - Define the [`Connector`] seam the dial primitive uses for low-level connects
//! - Open TCP and Unix stream connections bounded by the dial context
//! - Map IO failures to [`DialError::Connect`]

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::str::FromStr;
use tokio::net::TcpStream;
use tokio::time;

use crate::error::DialError;
use crate::net::connection::BoxedConn;
use crate::net::context::DialContext;

/// Opens a raw connection to an address, honoring the context deadline.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    async fn dial(&self, ctx: &DialContext, addr: &str) -> Result<BoxedConn, DialError>;
}

/// Network kind requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Tcp,
    Unix,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Unix => "unix",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = DialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" | "tcp4" | "tcp6" => Ok(Network::Tcp),
            "unix" => Ok(Network::Unix),
            other => Err(DialError::InvalidOption(format!("unknown network {other:?}"))),
        }
    }
}

/// The real network dialer.
#[derive(Debug, Clone, Default)]
pub struct NetDialer {
    network: Network,
}

impl NetDialer {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    async fn open(&self, addr: &str) -> io::Result<BoxedConn> {
        match self.network {
            Network::Tcp => {
                let stream = TcpStream::connect(addr).await?;
                stream.set_nodelay(true)?;
                Ok(Box::new(stream))
            }
            Network::Unix => open_unix(addr).await,
        }
    }
}

#[cfg(unix)]
async fn open_unix(path: &str) -> io::Result<BoxedConn> {
    let stream = tokio::net::UnixStream::connect(path).await?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn open_unix(_path: &str) -> io::Result<BoxedConn> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are not supported on this platform",
    ))
}

#[async_trait]
impl Connector for NetDialer {
    async fn dial(&self, ctx: &DialContext, addr: &str) -> Result<BoxedConn, DialError> {
        match time::timeout_at(ctx.deadline(), self.open(addr)).await {
            Ok(Ok(conn)) => {
                tracing::trace!(network = %self.network, addr = %addr, "Raw connection established");
                Ok(conn)
            }
            Ok(Err(e)) => Err(DialError::connect(addr, e)),
            Err(_) => Err(DialError::connect(
                addr,
                io::Error::new(io::ErrorKind::TimedOut, "i/o timeout"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[test]
    fn network_parses_known_kinds() {
        assert_eq!("tcp".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("tcp6".parse::<Network>().unwrap(), Network::Tcp);
        assert_eq!("unix".parse::<Network>().unwrap(), Network::Unix);
        assert!("udp".parse::<Network>().is_err());
    }

    #[tokio::test]
    async fn dial_tcp_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let ctx = DialContext::with_timeout(Duration::from_secs(2));
        let result = NetDialer::new(Network::Tcp).dial(&ctx, &addr).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn refused_connect_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let ctx = DialContext::with_timeout(Duration::from_secs(2));
        let err = NetDialer::new(Network::Tcp)
            .dial(&ctx, &addr)
            .await
            .err()
            .expect("dial should fail");
        assert!(err.is_connect());
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionRefused));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn dial_unix_socket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpc.sock");
        let _listener = tokio::net::UnixListener::bind(&path).unwrap();

        let ctx = DialContext::with_timeout(Duration::from_secs(2));
        let result = NetDialer::new(Network::Unix)
            .dial(&ctx, path.to_str().unwrap())
            .await;
        assert!(result.is_ok());
    }
}
