//! Shared types for the ionwf workflow service and CLI: domain model,
//! systemd service state, and the operator-editable run configuration.

pub mod config;
pub mod types;

pub use config::{ConfigError, ServerConfig, CONFIG_KEYS};
pub use types::*;
