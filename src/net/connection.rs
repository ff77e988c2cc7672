//! Client connection handles.
//!
//! # Responsibilities
//! - Abstract over the byte streams produced by the dialers (TCP, Unix, TLS)
//! - Generate unique connection IDs for tracing
//! - Own an established channel once dialing has succeeded

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, MutexGuard};

use crate::credentials::AuthInfo;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A bidirectional byte stream produced by a dialer or a handshake.
pub trait RawConn: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T> RawConn for T where T: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

/// Type-erased stream passed between dial capabilities.
pub type BoxedConn = Box<dyn RawConn>;

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// An established RPC channel.
///
/// Owns the (possibly TLS-wrapped) stream. RPC code takes the stream lock
/// for the duration of an exchange. The socket is closed when the last
/// handle is dropped or [`ClientConn::close`] is called.
pub struct ClientConn {
    id: ConnectionId,
    addr: String,
    authority: String,
    auth_info: AuthInfo,
    established_at: Instant,
    stream: Mutex<BoxedConn>,
}

impl ClientConn {
    pub fn new(addr: String, authority: String, stream: BoxedConn, auth_info: AuthInfo) -> Self {
        Self {
            id: ConnectionId::new(),
            addr,
            authority,
            auth_info,
            established_at: Instant::now(),
            stream: Mutex::new(stream),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The resolved address this connection was dialed on.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// The authority presented during the handshake.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Security details negotiated by the transport credentials.
    pub fn auth_info(&self) -> &AuthInfo {
        &self.auth_info
    }

    pub fn established_at(&self) -> Instant {
        self.established_at
    }

    /// Lock the underlying stream for an exchange.
    pub async fn stream(&self) -> MutexGuard<'_, BoxedConn> {
        self.stream.lock().await
    }

    /// Shut down the write half of the stream.
    pub async fn close(&self) -> std::io::Result<()> {
        let mut stream = self.stream.lock().await;
        stream.shutdown().await
    }
}

impl fmt::Debug for ClientConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConn")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .field("authority", &self.authority)
            .field("auth_info", &self.auth_info)
            .finish_non_exhaustive()
    }
}

impl Drop for ClientConn {
    fn drop(&mut self) {
        tracing::trace!(connection_id = %self.id, addr = %self.addr, "Connection released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
        assert!(id1.to_string().starts_with("conn-"));
    }

    #[tokio::test]
    async fn client_conn_exposes_stream() {
        let (client, mut server) = duplex(64);
        let conn = ClientConn::new(
            "127.0.0.1:9".into(),
            "127.0.0.1:9".into(),
            Box::new(client),
            AuthInfo::insecure(),
        );

        conn.stream().await.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");

        conn.close().await.unwrap();
        let mut rest = Vec::new();
        server.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
        assert_eq!(conn.auth_info().auth_type, "insecure");
    }
}
