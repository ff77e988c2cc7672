//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Dial round fails:
//!     → backoff.rs (exponential delay with jitter before the next round)
//!     → next round, until the dial context deadline
//! ```
//!
//! # Design Decisions
//! - Retry policy belongs to the dial primitive, not to callers
//! - Jittered backoff prevents thundering herd when many clients restart together
//! - The deadline is the only stop condition

pub mod backoff;

pub use backoff::{calculate_backoff, BackoffConfig};
