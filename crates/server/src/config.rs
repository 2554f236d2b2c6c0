// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server configuration module
//!
//! This module provides the configuration structures for the HTTP server: listen
//! address, TLS switch and certificate paths, request timeout, environment and
//! logging settings, loaded hierarchically with the `config` crate.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Result, ensure};
use config::{
    Config, ConfigBuilder, ConfigError, Environment as ConfigEnv, File, builder::DefaultState,
};
use serde::{Deserialize, Deserializer, de};

use crate::error::{ServerError, ServerResult};

const DEFAULT_ADDRESS: &str = ":8080";
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// A validated timeout duration in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSeconds(Duration);

impl TimeoutSeconds {
    /// Create a new `TimeoutSeconds`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> Result<Self> {
        ensure!(seconds != 0, "timeout must be greater than 0");
        ensure!(
            seconds <= MAX_TIMEOUT_SECONDS,
            "timeout cannot exceed {MAX_TIMEOUT_SECONDS}"
        );
        Ok(Self(Duration::from_secs(seconds)))
    }

    /// Create a safe default timeout (30 seconds)
    pub const fn default_value() -> Self {
        Self(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS))
    }

    /// Create a safe testing timeout (5 seconds)
    pub const fn testing() -> Self {
        Self(Duration::from_secs(5))
    }

    /// Get the timeout value
    pub fn value(&self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for TimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Default for TimeoutSeconds {
    fn default() -> Self {
        Self::default_value()
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production environment
    Production,
    /// Development environment
    Development,
    /// Testing environment
    Testing,
}

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, multi-field lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// TLS switch and certificate locations
///
/// Certificates are only read when the server starts, never at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS instead of plain HTTP
    pub enabled: bool,
    /// PEM certificate chain
    pub cert_file: PathBuf,
    /// PEM private key
    pub key_file: PathBuf,
}

/// Server configuration for different environments
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address, `host:port` or `:port` for all interfaces
    pub address: String,
    /// TLS settings
    #[serde(default)]
    pub tls: TlsConfig,
    /// Per-request timeout in seconds (validated range: 1-300)
    pub request_timeout_seconds: TimeoutSeconds,
    /// Environment type
    pub environment: Environment,
    /// Logging settings
    pub log: LogConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            tls: TlsConfig::default(),
            request_timeout_seconds: TimeoutSeconds::default(),
            environment: Environment::Development,
            log: LogConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create configuration from environment variables and optional configuration files
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if configuration is invalid or cannot be loaded.
    pub fn from_env() -> ServerResult<Self> {
        let config = Self::load().map_err(|e| ServerError::Config {
            message: format!("failed to load configuration: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. Configuration file (config.json)
    /// 3. Environment-specific files (config.{env}.json)
    /// 4. Environment variables with `SERVER_` prefix, `__` separating nested keys
    ///    (`SERVER_ADDRESS`, `SERVER_TLS__ENABLED`, `SERVER_LOG__LEVEL`)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase();

        let mut config_builder = Self::defaults(&env_var)?
            .add_source(File::with_name("config.json").required(false))
            .add_source(File::with_name(&format!("config.{env_var}.json")).required(false))
            .add_source(
                ConfigEnv::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if std::env::var("ENVIRONMENT").is_ok() {
            config_builder = config_builder.set_override("environment", env_var)?;
        }

        config_builder.build()?.try_deserialize()
    }

    /// Load configuration from a single file on top of the default values
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the file cannot be read or holds invalid values.
    pub fn from_file(path: &Path) -> ServerResult<Self> {
        let config: Self = Self::defaults("development")
            .and_then(|builder| builder.add_source(File::from(path)).build())
            .and_then(Config::try_deserialize)
            .map_err(|e| ServerError::Config {
                message: format!("failed to load {}: {e}", path.display()),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let log_format = if environment == "production" {
            "json"
        } else {
            "pretty"
        };

        Config::builder()
            .set_default("address", DEFAULT_ADDRESS)?
            .set_default("tls.enabled", false)?
            .set_default("tls.cert_file", "")?
            .set_default("tls.key_file", "")?
            .set_default("request_timeout_seconds", DEFAULT_REQUEST_TIMEOUT_SECONDS)?
            .set_default("environment", environment)?
            .set_default("log.level", "info")?
            .set_default("log.format", log_format)
    }

    /// Create configuration optimized for testing
    pub fn for_testing() -> Self {
        Self {
            address: "127.0.0.1:0".to_string(), // let OS choose available port
            tls: TlsConfig::default(),
            request_timeout_seconds: TimeoutSeconds::testing(),
            environment: Environment::Testing,
            log: LogConfig::default(),
        }
    }

    /// Check the settings that serde cannot check on its own
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` for an unparsable address or TLS enabled without
    /// certificate and key paths.
    pub fn validate(&self) -> ServerResult<()> {
        self.socket_addr()?;

        if self.tls.enabled
            && (self.tls.cert_file.as_os_str().is_empty() || self.tls.key_file.as_os_str().is_empty())
        {
            return Err(ServerError::Config {
                message: "TLS is enabled but cert_file or key_file is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Get socket address for binding
    ///
    /// Accepts `ip:port`, `localhost:port` and `:port` (all interfaces). Host names are
    /// not resolved.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Config` if the address cannot be parsed.
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let address = self.address.trim();
        let candidate = if let Some(port) = address.strip_prefix(':') {
            format!("0.0.0.0:{port}")
        } else if let Some(port) = address.strip_prefix("localhost:") {
            format!("127.0.0.1:{port}")
        } else {
            address.to_string()
        };

        candidate.parse().map_err(|e| ServerError::Config {
            message: format!("invalid address '{}': {e}", self.address),
        })
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Development => write!(f, "development"),
            Environment::Testing => write!(f, "testing"),
        }
    }
}
