//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dial primitive, orchestrator, registry produce:
//!     → tracing events and spans (logging.rs installs the subscriber)
//!     → metrics.rs (attempt and result counters)
//! ```
//!
//! # Design Decisions
//! - Errors are returned to callers, never logged as handled
//! - Metrics are cheap counter increments through the `metrics` facade

pub mod logging;
pub mod metrics;
