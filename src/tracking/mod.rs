//! Error-tracking decorators.
//!
//! The retry-until-deadline dial primitive discards the failures of its
//! individual attempts. These wrappers sit between the primitive and the real
//! capabilities and keep the most recent failure of each kind so the
//! orchestrator can report it afterwards.
//!
//! Each instance belongs to exactly one dial; slots are never shared across
//! dials and are read once after the dial concludes.

pub mod connector;
pub mod credentials;

pub use connector::ErrTrackingConnector;
pub use credentials::ErrTrackingCredentials;
