//! Command implementations

pub mod config;
pub mod install;
pub mod provision;
pub mod status;
pub mod uninstall;
pub mod version;
