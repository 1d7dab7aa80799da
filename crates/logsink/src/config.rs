// Copyright 2025-Present the logsink authors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use crate::error::CollectorError;

/// Default port the collector listens on.
pub const DEFAULT_PORT: u16 = 18044;

/// Configuration for the collector endpoint and its backing store.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Host to bind the UDP endpoint to (e.g. "0.0.0.0").
    pub host: String,
    /// Port to listen on. Port 0 binds an ephemeral port.
    pub port: u16,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from("logs.db"),
        }
    }
}

impl CollectorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CollectorError> {
        if self.host.trim().is_empty() {
            return Err(CollectorError::InvalidConfig(
                "bind host cannot be empty".to_string(),
            ));
        }

        if self.db_path.as_os_str().is_empty() {
            return Err(CollectorError::InvalidConfig(
                "database path cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The socket address string the collector binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = CollectorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:18044");
    }

    #[test]
    fn test_validate_empty_host() {
        let config = CollectorConfig {
            host: "   ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_db_path() {
        let config = CollectorConfig {
            db_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ephemeral_port_is_allowed() {
        let config = CollectorConfig {
            port: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
