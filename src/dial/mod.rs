//! Dial orchestration.
//!
//! # Responsibilities
//! - Choose between fail-fast and retry-until-deadline dialing
//! - Wire the error-tracking decorators into the retry path
//! - Pick the most useful error when the retry path fails
//!
//! # Error precedence (retry path)
//! ```text
//! last handshake error   (network worked, security did not: most specific)
//!   → last connect error (refused, unreachable, DNS)
//!   → primitive's own error (usually DeadlineExceeded)
//! ```

use std::sync::Arc;
use tracing::Instrument;

use crate::credentials::TransportCredentials;
use crate::error::DialError;
use crate::net::{ClientConn, Connector, DialContext, NetDialer, Network};
use crate::observability::metrics;
use crate::tracking::{ErrTrackingConnector, ErrTrackingCredentials};
use crate::transport::{self, DialOption};

/// Connect to `addr` over `network`.
///
/// With `fail_fast` the first failure is returned as is. Otherwise dialing is
/// retried until `ctx` expires, and a failure reports the last handshake or
/// connect error observed rather than a bare deadline error.
pub async fn dial(
    ctx: &DialContext,
    network: Network,
    addr: &str,
    credentials: Option<Arc<dyn TransportCredentials>>,
    fail_fast: bool,
    options: &[DialOption],
) -> Result<ClientConn, DialError> {
    let dialer = NetDialer::new(network);
    let span = tracing::debug_span!("dial", endpoint = %addr, network = %dialer.network(), fail_fast);
    dial_with_connector(ctx, dialer, addr, credentials, fail_fast, options)
        .instrument(span)
        .await
}

/// [`dial`] with an explicit low-level connector.
pub(crate) async fn dial_with_connector<C>(
    ctx: &DialContext,
    connector: C,
    addr: &str,
    credentials: Option<Arc<dyn TransportCredentials>>,
    fail_fast: bool,
    options: &[DialOption],
) -> Result<ClientConn, DialError>
where
    C: Connector + 'static,
{
    let result = if fail_fast {
        transport::blocking_dial(ctx, Arc::new(connector), addr, credentials, options).await
    } else {
        dial_tracking_errors(ctx, connector, addr, credentials, options).await
    };

    metrics::record_dial_result(
        fail_fast,
        match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        },
    );
    result
}

async fn dial_tracking_errors<C>(
    ctx: &DialContext,
    connector: C,
    addr: &str,
    credentials: Option<Arc<dyn TransportCredentials>>,
    options: &[DialOption],
) -> Result<ClientConn, DialError>
where
    C: Connector + 'static,
{
    let dialer = Arc::new(ErrTrackingConnector::new(connector));
    let tracked_creds = credentials.map(|creds| Arc::new(ErrTrackingCredentials::new(creds)));

    let mut options = options.to_vec();
    options.push(match &tracked_creds {
        Some(creds) => DialOption::TransportCredentials(creds.clone()),
        None => DialOption::Insecure,
    });
    options.push(DialOption::ContextDialer(dialer.clone()));

    match transport::dial_context(ctx, addr, &options).await {
        Ok(conn) => Ok(conn),
        Err(err) => Err(best_error(tracked_creds.as_deref(), &dialer, err)),
    }
}

fn best_error<C>(
    creds: Option<&ErrTrackingCredentials>,
    dialer: &ErrTrackingConnector<C>,
    fallback: DialError,
) -> DialError {
    if let Some(err) = creds.and_then(ErrTrackingCredentials::err) {
        tracing::debug!(source = "handshake", error = %err, "Reporting tracked dial failure");
        return err;
    }
    if let Some(err) = dialer.err() {
        tracing::debug!(source = "connect", error = %err, "Reporting tracked dial failure");
        return err;
    }
    tracing::debug!(source = "primitive", error = %fallback, "No tracked failure, reporting dial error");
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AuthInfo, ProtocolInfo};
    use crate::net::BoxedConn;
    use async_trait::async_trait;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    struct Refusing;

    #[async_trait]
    impl Connector for Refusing {
        async fn dial(&self, _ctx: &DialContext, addr: &str) -> Result<BoxedConn, DialError> {
            Err(DialError::connect(
                addr,
                io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            ))
        }
    }

    #[derive(Debug)]
    struct Accepting;

    #[async_trait]
    impl Connector for Accepting {
        async fn dial(&self, _ctx: &DialContext, _addr: &str) -> Result<BoxedConn, DialError> {
            let (client, _server) = tokio::io::duplex(64);
            Ok(Box::new(client))
        }
    }

    /// Refuses every other call.
    #[derive(Debug, Default)]
    struct Alternating(AtomicUsize);

    #[async_trait]
    impl Connector for Alternating {
        async fn dial(&self, ctx: &DialContext, addr: &str) -> Result<BoxedConn, DialError> {
            if self.0.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                Refusing.dial(ctx, addr).await
            } else {
                Accepting.dial(ctx, addr).await
            }
        }
    }

    #[derive(Debug)]
    struct Hanging;

    #[async_trait]
    impl Connector for Hanging {
        async fn dial(&self, _ctx: &DialContext, _addr: &str) -> Result<BoxedConn, DialError> {
            std::future::pending().await
        }
    }

    #[derive(Debug)]
    struct BadCertificate;

    #[async_trait]
    impl TransportCredentials for BadCertificate {
        async fn client_handshake(
            &self,
            _ctx: &DialContext,
            authority: &str,
            _raw: BoxedConn,
        ) -> Result<(BoxedConn, AuthInfo), DialError> {
            Err(DialError::handshake(authority, "x509: certificate is not valid for this name"))
        }

        fn info(&self) -> ProtocolInfo {
            ProtocolInfo {
                security_protocol: "tls",
                security_version: Some("1.3"),
                server_name: None,
            }
        }
    }

    fn ctx() -> DialContext {
        DialContext::with_timeout(Duration::from_millis(300))
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_returns_primitive_error_verbatim() {
        let err = dial_with_connector(&ctx(), Refusing, "svc:1", None, true, &[])
            .await
            .err()
            .expect("dial should fail");

        assert!(err.is_connect());
        assert_eq!(err.to_string(), "failed to connect to svc:1: connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn fail_fast_returns_handshake_error() {
        let creds: Arc<dyn TransportCredentials> = Arc::new(BadCertificate);
        let err = dial_with_connector(&ctx(), Accepting, "svc:1", Some(creds), true, &[])
            .await
            .err()
            .expect("dial should fail");
        assert!(err.is_handshake());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_reports_connect_error_instead_of_deadline() {
        let err = dial_with_connector(&ctx(), Refusing, "svc:1", None, false, &[])
            .await
            .err()
            .expect("dial should fail");

        assert!(err.is_connect(), "got {err:?}");
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionRefused));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_with_credentials_reports_connect_error_when_never_handshaking() {
        let creds: Arc<dyn TransportCredentials> = Arc::new(BadCertificate);
        let err = dial_with_connector(&ctx(), Refusing, "svc:1", Some(creds), false, &[])
            .await
            .err()
            .expect("dial should fail");

        assert!(err.is_connect(), "got {err:?}");
        assert_eq!(err.io_kind(), Some(io::ErrorKind::ConnectionRefused));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_reports_handshake_error() {
        let creds: Arc<dyn TransportCredentials> = Arc::new(BadCertificate);
        let err = dial_with_connector(&ctx(), Accepting, "svc:1", Some(creds), false, &[])
            .await
            .err()
            .expect("dial should fail");

        assert!(err.is_handshake(), "got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn handshake_error_wins_over_connect_error() {
        let creds: Arc<dyn TransportCredentials> = Arc::new(BadCertificate);
        let err = dial_with_connector(
            &ctx(),
            Alternating::default(),
            "svc:1",
            Some(creds),
            false,
            &[],
        )
        .await
        .err()
        .expect("dial should fail");

        assert!(err.is_handshake(), "got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn option_error_is_returned_when_nothing_was_tracked() {
        let err = dial_with_connector(
            &ctx(),
            Refusing,
            "svc:1",
            None,
            false,
            &[DialOption::Authority(String::new())],
        )
        .await
        .err()
        .expect("dial should fail");

        assert!(matches!(err, DialError::InvalidOption(_)), "got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_error_is_last_resort() {
        let err = dial_with_connector(&ctx(), Hanging, "svc:1", None, false, &[])
            .await
            .err()
            .expect("dial should fail");

        assert!(err.is_deadline_exceeded(), "got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn success_without_credentials_is_insecure() {
        let conn = dial_with_connector(&ctx(), Alternating::default(), "svc:1", None, false, &[])
            .await
            .ok()
            .expect("second round should connect");

        assert_eq!(conn.auth_info(), &AuthInfo::insecure());
        assert_eq!(conn.addr(), "svc:1");
    }

    #[tokio::test]
    async fn dial_uses_real_network() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let conn = dial(
            &DialContext::with_timeout(Duration::from_secs(2)),
            Network::Tcp,
            &addr,
            None,
            false,
            &[],
        )
        .await
        .ok()
        .expect("listener accepts");
        assert_eq!(conn.addr(), addr);
    }
}
