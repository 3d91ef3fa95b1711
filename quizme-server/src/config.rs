//! Server configuration
//!
//! Defaults, then the TOML file named by `QUIZME_CONFIG` (if set), then
//! environment overrides.

use quizme_core::CorsPolicy;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Config file is not valid TOML
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable holds an unusable value
    #[error("Invalid value for {name}: {message}")]
    Env {
        /// Variable name
        name: &'static str,
        /// What was wrong
        message: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_address: SocketAddr,

    /// JSON quiz catalog; the server starts empty when unset
    pub data_file: Option<PathBuf>,

    /// How restricted quizzes answer CORS
    pub cors_policy: CorsPolicy,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_file: None,
            cors_policy: CorsPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `QUIZME_CONFIG` and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let base = match std::env::var_os("QUIZME_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        base.with_env(|name| std::env::var(name).ok())
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply environment overrides looked up through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("BIND_ADDRESS") {
            self.bind_address = addr.parse().map_err(|e| ConfigError::Env {
                name: "BIND_ADDRESS",
                message: format!("{}", e),
            })?;
        }

        if let Some(path) = lookup("QUIZME_DATA") {
            self.data_file = Some(PathBuf::from(path));
        }

        if let Some(policy) = lookup("QUIZME_CORS_POLICY") {
            self.cors_policy = policy.parse().map_err(|e| ConfigError::Env {
                name: "QUIZME_CORS_POLICY",
                message: format!("{}", e),
            })?;
        }

        if let Some(format) = lookup("LOG_FORMAT") {
            self.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                other => {
                    return Err(ConfigError::Env {
                        name: "LOG_FORMAT",
                        message: format!("unknown format '{}'", other),
                    })
                }
            };
        }

        Ok(self)
    }
}
