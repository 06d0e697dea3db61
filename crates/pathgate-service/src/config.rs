// pathgate-service/src/config.rs
// ============================================================================
// Module: PathGate Service Configuration
// Description: TOML configuration for the PathGate server binary.
// Purpose: Load and validate service settings fail-closed.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! The server reads `pathgate.toml` (overridable through the
//! `PATHGATE_CONFIG` environment variable). A missing file yields defaults; a
//! present file must parse and validate completely or startup fails. Every
//! limit errs on the closed side: bind addresses must parse, the policy
//! directory must be named, and message sizes are capped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "pathgate.toml";

/// Environment variable overriding the configuration file path.
pub const CONFIG_ENV_VAR: &str = "PATHGATE_CONFIG";

/// Maximum accepted configuration file size in bytes.
const MAX_CONFIG_BYTES: u64 = 64 * 1024;

/// Default gRPC bind address.
const DEFAULT_BIND: &str = "127.0.0.1:9339";

/// Default policy directory.
const DEFAULT_POLICY_DIR: &str = "/var/lib/pathgate";

/// Default cap on decoded request message size in bytes.
const DEFAULT_MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

/// Default tracing filter directive.
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Error produced while loading or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("config read failed: {0}")]
    Read(String),
    /// The configuration file exceeds the size cap.
    #[error("config file exceeds {MAX_CONFIG_BYTES} bytes")]
    TooLarge,
    /// The configuration file is not valid TOML for this schema.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// A setting failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Service settings for the PathGate server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// gRPC bind address, host and port.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding the durable policy copies.
    #[serde(default = "default_policy_dir")]
    pub policy_dir: PathBuf,
    /// Cap on decoded request message size in bytes.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// Tracing filter directive, for example `info` or `pathgate=debug`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// Default bind address value.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default policy directory value.
fn default_policy_dir() -> PathBuf {
    PathBuf::from(DEFAULT_POLICY_DIR)
}

/// Default message size cap value.
fn default_max_message_bytes() -> usize {
    DEFAULT_MAX_MESSAGE_BYTES
}

/// Default log filter value.
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            policy_dir: default_policy_dir(),
            max_message_bytes: default_max_message_bytes(),
            log_filter: default_log_filter(),
        }
    }
}

impl ServiceConfig {
    /// Loads the configuration from the default path or the `PATHGATE_CONFIG`
    /// override. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read,
    /// parsed, or validated.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Loads the configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file exists but cannot be read,
    /// parsed, or validated.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(err) => return Err(ConfigError::Read(err.to_string())),
        };
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::TooLarge);
        }
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read(err.to_string()))?;
        let config: Self = toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every setting fail-closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first failing setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.policy_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("policy_dir must not be empty".to_string()));
        }
        if self.max_message_bytes == 0 {
            return Err(ConfigError::Invalid("max_message_bytes must be positive".to_string()));
        }
        if self.log_filter.is_empty() {
            return Err(ConfigError::Invalid("log_filter must not be empty".to_string()));
        }
        Ok(())
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bind address {:?} does not parse", self.bind)))
    }
}
