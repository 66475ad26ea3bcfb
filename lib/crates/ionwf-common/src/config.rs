//! Run configuration for the workflow service.
//!
//! The only operator-editable state: which host and port the service binds
//! to. Persisted as YAML by the CLI and baked into the systemd unit at
//! install time.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings accepted by `ionwf config set`.
pub const CONFIG_KEYS: &[&str] = &["server.host", "server.port"];

/// Errors from configuration key/value validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown setting: {key}\n\nValid settings: server.host, server.port")]
    UnknownKey { key: String },

    #[error("Invalid value for {key}: {value}\n\nExpected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },
}

/// Host and port the service binds to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// `host:port` as passed to the service via `IONWF_LISTEN_ADDR`.
    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Read one setting by key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] for keys outside [`CONFIG_KEYS`].
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        match key {
            "server.host" => Ok(self.host.to_string()),
            "server.port" => Ok(self.port.to_string()),
            _ => Err(ConfigError::UnknownKey {
                key: key.to_string(),
            }),
        }
    }

    /// Validate and apply one setting.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownKey`] for unrecognised keys and
    /// [`ConfigError::InvalidValue`] when the value does not parse
    /// (the port must be a non-zero u16, the host an IP address).
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "server.host" => {
                self.host = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "an IPv4 or IPv6 address",
                })?;
                Ok(())
            }
            "server.port" => {
                let port: u16 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                    expected: "a port number between 1 and 65535",
                })?;
                if port == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        expected: "a port number between 1 and 65535",
                    });
                }
                self.port = port;
                Ok(())
            }
            _ => Err(ConfigError::UnknownKey {
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_all_interfaces_on_8000() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8000");
    }

    #[test]
    fn set_port_updates_listen_addr() {
        let mut config = ServerConfig::default();
        config.set("server.port", "9000").unwrap();
        assert_eq!(config.listen_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn set_host_accepts_loopback() {
        let mut config = ServerConfig::default();
        config.set("server.host", "127.0.0.1").unwrap();
        assert_eq!(config.get("server.host").unwrap(), "127.0.0.1");
    }

    #[test]
    fn set_host_accepts_ipv6() {
        let mut config = ServerConfig::default();
        config.set("server.host", "::1").unwrap();
        assert_eq!(config.get("server.host").unwrap(), "::1");
    }

    #[test]
    fn set_port_zero_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config.set("server.port", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn set_port_out_of_range_is_rejected() {
        let mut config = ServerConfig::default();
        assert!(config.set("server.port", "70000").is_err());
        assert!(config.set("server.port", "nine").is_err());
        assert_eq!(config.port, 8000);
    }

    #[test]
    fn set_host_rejects_non_address() {
        let mut config = ServerConfig::default();
        let err = config.set("server.host", "localhost").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for server.host"), "got: {msg}");
    }

    #[test]
    fn unknown_key_lists_valid_settings() {
        let mut config = ServerConfig::default();
        let err = config.set("server.tls", "on").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Unknown setting: server.tls"), "got: {msg}");
        for key in CONFIG_KEYS {
            assert!(msg.contains(key), "message should list {key}");
        }
    }

    #[test]
    fn get_unknown_key_is_an_error() {
        let config = ServerConfig::default();
        assert!(config.get("server.tls").is_err());
    }

    #[test]
    fn yaml_round_trip_preserves_settings() {
        let mut config = ServerConfig::default();
        config.set("server.host", "10.0.0.5").unwrap();
        config.set("server.port", "8342").unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: ServerConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn yaml_missing_fields_fall_back_to_defaults() {
        let config: ServerConfig = serde_yaml::from_str("port: 9100\n").unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.host.to_string(), "0.0.0.0");
    }
}
