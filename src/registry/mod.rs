//! Current-target registry.
//!
//! # Responsibilities
//! - Hold the dial settings applied to every reconnect
//! - Hold the current endpoint and its live connection as one unit
//! - Hand the live connection to RPC code without threading it through calls
//!
//! # State Transitions
//! ```text
//! Unconfigured --configure--> Configured (no connection)
//! Configured --update ok--> Connected(endpoint)
//! Connected(a) --update(b) ok--> Connected(b)
//! Connected(a) --update(b) err--> Connected(a)
//! ```
//!
//! # Design Decisions
//! - An owned object, not a global: tests and embedders create their own
//! - Readers never block (`ArcSwapOption`); updates are serialised
//! - A replaced connection is released, not force-closed: RPCs still holding
//!   it finish, and the socket closes when the last handle drops

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::credentials::TransportCredentials;
use crate::dial::dial;
use crate::error::DialError;
use crate::net::{ClientConn, DialContext, Network};
use crate::transport::DialOption;

/// Settings applied to every `update`.
#[derive(Debug, Clone)]
pub struct DialSettings {
    pub timeout: Duration,
    pub credentials: Option<Arc<dyn TransportCredentials>>,
    pub fail_fast: bool,
    pub options: Vec<DialOption>,
}

#[derive(Debug)]
struct Established {
    endpoint: String,
    conn: Arc<ClientConn>,
}

/// Holder of the endpoint the client currently talks to.
#[derive(Debug)]
pub struct Target {
    network: Network,
    settings: ArcSwapOption<DialSettings>,
    current: ArcSwapOption<Established>,
    update_lock: Mutex<()>,
}

impl Target {
    /// An unconfigured registry dialing over TCP.
    pub fn new() -> Self {
        Self::with_network(Network::Tcp)
    }

    pub fn with_network(network: Network) -> Self {
        Self {
            network,
            settings: ArcSwapOption::empty(),
            current: ArcSwapOption::empty(),
            update_lock: Mutex::new(()),
        }
    }

    /// Replace the dial settings. Does not dial.
    pub fn configure(
        &self,
        timeout: Duration,
        credentials: Option<Arc<dyn TransportCredentials>>,
        fail_fast: bool,
        options: Vec<DialOption>,
    ) {
        self.configure_settings(DialSettings {
            timeout,
            credentials,
            fail_fast,
            options,
        });
    }

    pub fn configure_settings(&self, settings: DialSettings) {
        tracing::debug!(
            timeout = ?settings.timeout,
            fail_fast = settings.fail_fast,
            secure = settings.credentials.is_some(),
            options = settings.options.len(),
            "Dial settings configured"
        );
        self.settings.store(Some(Arc::new(settings)));
    }

    pub fn is_configured(&self) -> bool {
        self.settings.load().is_some()
    }

    /// Snapshot of the current dial settings.
    pub fn settings(&self) -> Option<Arc<DialSettings>> {
        self.settings.load_full()
    }

    /// Dial `endpoint` and, on success, make it the current target.
    ///
    /// On failure the previous endpoint and connection stay in place and the
    /// dial error is returned unchanged.
    pub async fn update(&self, endpoint: &str) -> Result<(), DialError> {
        let _guard = self.update_lock.lock().await;
        let settings = self.settings.load_full().ok_or(DialError::NotConfigured)?;

        let ctx = DialContext::with_timeout(settings.timeout);
        let conn = dial(
            &ctx,
            self.network,
            endpoint,
            settings.credentials.clone(),
            settings.fail_fast,
            &settings.options,
        )
        .await?;

        tracing::info!(
            endpoint = %endpoint,
            connection_id = %conn.id(),
            auth = conn.auth_info().auth_type,
            "Target updated"
        );

        let previous = self.current.swap(Some(Arc::new(Established {
            endpoint: endpoint.to_string(),
            conn: Arc::new(conn),
        })));
        if let Some(previous) = previous {
            tracing::debug!(
                endpoint = %previous.endpoint,
                connection_id = %previous.conn.id(),
                age = ?previous.conn.established_at().elapsed(),
                "Released superseded connection"
            );
        }
        Ok(())
    }

    /// The live connection, if any `update` has succeeded.
    pub fn current(&self) -> Option<Arc<ClientConn>> {
        self.current.load_full().map(|est| Arc::clone(&est.conn))
    }

    /// The endpoint of the live connection.
    pub fn endpoint(&self) -> Option<String> {
        self.current.load_full().map(|est| est.endpoint.clone())
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn listening_addr() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    async fn closed_addr() -> String {
        let (listener, addr) = listening_addr().await;
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn starts_unconfigured() {
        let target = Target::new();
        assert!(!target.is_configured());
        assert!(target.current().is_none());
        assert!(target.endpoint().is_none());

        let err = target.update("127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, DialError::NotConfigured));
    }

    #[tokio::test]
    async fn configure_does_not_dial() {
        let target = Target::new();
        target.configure(Duration::from_secs(1), None, false, Vec::new());

        assert!(target.is_configured());
        assert!(target.current().is_none());
        assert_eq!(target.settings().unwrap().timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn successful_update_sets_endpoint_and_connection() {
        let (_listener, addr) = listening_addr().await;
        let target = Target::new();
        target.configure(Duration::from_secs(2), None, false, Vec::new());

        target.update(&addr).await.unwrap();

        assert_eq!(target.endpoint().as_deref(), Some(addr.as_str()));
        let first = target.current().expect("connected");
        let second = target.current().expect("connected");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.addr(), addr);
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_target() {
        let (_listener, good) = listening_addr().await;
        let bad = closed_addr().await;
        let target = Target::new();
        target.configure(Duration::from_millis(300), None, false, Vec::new());

        target.update(&good).await.unwrap();
        let before = target.current().unwrap();

        let err = target.update(&bad).await.unwrap_err();
        assert!(err.is_connect(), "got {err:?}");

        assert_eq!(target.endpoint().as_deref(), Some(good.as_str()));
        assert!(Arc::ptr_eq(&before, &target.current().unwrap()));
    }

    #[tokio::test]
    async fn update_replaces_connection() {
        let (_a, first) = listening_addr().await;
        let (_b, second) = listening_addr().await;
        let target = Target::new();
        target.configure(Duration::from_secs(2), None, true, Vec::new());

        target.update(&first).await.unwrap();
        let old = target.current().unwrap();
        target.update(&second).await.unwrap();

        assert_eq!(target.endpoint().as_deref(), Some(second.as_str()));
        assert!(!Arc::ptr_eq(&old, &target.current().unwrap()));
        // Holders of the old handle keep it until they drop it.
        assert_eq!(old.addr(), first);
    }

    #[tokio::test]
    async fn stored_options_are_applied() {
        let (_listener, addr) = listening_addr().await;
        let target = Target::new();
        target.configure(
            Duration::from_secs(1),
            None,
            false,
            vec![DialOption::Authority(String::new())],
        );

        let err = target.update(&addr).await.unwrap_err();
        assert!(matches!(err, DialError::InvalidOption(_)));
        assert!(target.current().is_none());
    }
}
