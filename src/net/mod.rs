//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Dial request
//!     → context.rs (deadline shared by every capability)
//!     → dialer.rs (raw TCP / Unix connect)
//!     → credentials (optional TLS handshake)
//!     → connection.rs (established channel handed to the registry)
//! ```
//!
//! # Design Decisions
//! - Streams are type-erased so TLS and plaintext channels look the same
//! - Every connect is bounded by the context deadline
//! - Connect failures keep the IO error kind for diagnostics

pub mod connection;
pub mod context;
pub mod dialer;

pub use connection::{BoxedConn, ClientConn, ConnectionId, RawConn};
pub use context::DialContext;
pub use dialer::{Connector, NetDialer, Network};
