/*!
 * Configuration Errors
 */

use miette::Diagnostic;
use thiserror::Error;

use crate::core::errors::PoolError;

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Cannot read {path}: {message}")]
    #[diagnostic(code(config::io))]
    Io { path: String, message: String },

    #[error("Malformed configuration: {0}")]
    #[diagnostic(code(config::parse), help("The configuration file must be valid TOML."))]
    Parse(String),

    #[error("No branches configured")]
    #[diagnostic(
        code(config::empty_branches),
        help("List at least one branch, e.g. branches = [\"/mnt/disk1\"].")
    )]
    EmptyBranches,

    #[error("Invalid branch '{spec}': {reason}")]
    #[diagnostic(code(config::branch), help("Branches are written <path>[=RW|RO|NC[,<min-free-space>]]."))]
    InvalidBranch { spec: String, reason: String },

    #[error("Unknown policy '{name}' for {key}")]
    #[diagnostic(code(config::policy))]
    UnknownPolicy { key: String, name: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    #[diagnostic(code(config::value))]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(super) fn value(key: &str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<ConfigError> for PoolError {
    fn from(err: ConfigError) -> Self {
        PoolError::InvalidConfig(err.to_string())
    }
}
