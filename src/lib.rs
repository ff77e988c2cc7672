//! RPC target connection library.
//!
//! Establishes a connection to the endpoint a client talks to, reporting the
//! underlying cause when a dial fails, and keeps track of the current target
//! so RPC code can pick up the live connection.

pub mod config;
pub mod credentials;
pub mod dial;
pub mod error;
pub mod net;
pub mod observability;
pub mod registry;
pub mod resilience;
pub mod tracking;
pub mod transport;

pub use config::schema::TargetConfig;
pub use credentials::{AuthInfo, InsecureCredentials, TlsCredentials, TransportCredentials};
pub use dial::dial;
pub use error::DialError;
pub use net::{ClientConn, Connector, DialContext, NetDialer, Network};
pub use registry::{DialSettings, Target};
pub use transport::DialOption;
