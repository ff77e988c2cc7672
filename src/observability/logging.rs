//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for binaries
//! - Honor `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Library code only emits `tracing` events; installing a subscriber is the
//!   application's choice
//! - Dial internals log at debug/trace so a default `info` level stays quiet

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global fmt subscriber.
///
/// `default_level` is used when `RUST_LOG` is unset or invalid, e.g. `"info"`
/// or `"rpc_target=debug"`. Calling this twice is harmless; the second call
/// leaves the first subscriber in place.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_logging("info");
        init_logging("debug");
        tracing::info!("logging initialised twice without panicking");
    }
}
