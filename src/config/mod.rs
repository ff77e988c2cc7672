//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TargetConfig (validated, immutable)
//!     → dial_settings() → registry.configure
//!
//! On change:
//!     watcher.rs detects change
//!     → loader.rs parses new config
//!     → new TargetConfig sent to the application
//!     → application applies its overrides
//!     → validation.rs validates
//!     → registry reconfigured and re-dialed
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{BackoffSettings, DialConfig, ObservabilityConfig, TargetConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
