//! YAML configuration store on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ionwf_common::ServerConfig;

/// Persists [`ServerConfig`] as a YAML file.
///
/// The location defaults to `/etc/ionwf/config.yaml` and can be overridden
/// with the `IONWF_CONFIG` environment variable.
pub struct YamlConfigStore;

impl YamlConfigStore {
    /// Load the configuration, falling back to defaults when the file does
    /// not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<ServerConfig> {
        load_from(&self.path())
    }

    /// Write the configuration, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, config: &ServerConfig) -> Result<()> {
        save_to(&self.path(), config)
    }

    /// Path of the config file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        std::env::var("IONWF_CONFIG")
            .map_or_else(|_| PathBuf::from("/etc/ionwf/config.yaml"), PathBuf::from)
    }
}

fn load_from(path: &Path) -> Result<ServerConfig> {
    if !path.exists() {
        return Ok(ServerConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

fn save_to(path: &Path, config: &ServerConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let content = serde_yaml::to_string(config).context("cannot serialize config")?;
    std::fs::write(path, content).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}
