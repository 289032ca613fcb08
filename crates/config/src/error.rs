//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file at {path}: {source}")]
    FileRead {
        /// Path that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write configuration file
    #[error("Failed to write config file at {path}: {source}")]
    FileWrite {
        /// Path that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML configuration
    #[error("Failed to serialize TOML config: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Invalid minimum validator stake
    #[error("Invalid minimum stake: min_validator_stake cannot be zero")]
    InvalidMinStake,

    /// Invalid minimum delegation amount
    #[error("Invalid minimum delegation: min_delegation_amount cannot be zero")]
    InvalidMinDelegation,

    /// Invalid heartbeat interval
    #[error("Invalid heartbeat interval: must be at least 1 block, got {0}")]
    InvalidHeartbeatInterval(u64),

    /// Uptime window shorter than the heartbeat interval
    #[error("Invalid uptime window: {window} blocks is shorter than the heartbeat interval {interval}")]
    InvalidUptimeWindow {
        /// Configured uptime window in blocks
        window: u64,
        /// Configured heartbeat interval in blocks
        interval: u64,
    },

    /// Tier uptime thresholds are not strictly increasing
    #[error("Invalid tier thresholds: {0} must be strictly increasing bronze < silver < gold < platinum")]
    NonMonotonicThresholds(&'static str),

    /// Tier threshold exceeds 100.0%
    #[error("Invalid tier threshold: {name} is {value} but uptime tops out at 1000 (tenths of a percent)")]
    ThresholdOutOfRange {
        /// Threshold name
        name: &'static str,
        /// Configured value
        value: u32,
    },

    /// Invalid pool fee bound
    #[error("Invalid pool fee bounds: min {min} / max {max} must satisfy min <= max <= 10000")]
    InvalidPoolFeeBounds {
        /// Configured minimum fee in basis points
        min: u16,
        /// Configured maximum fee in basis points
        max: u16,
    },

    /// A block-count duration is zero
    #[error("Invalid duration: {0} must be at least 1 block")]
    ZeroDuration(&'static str),

    /// Invalid validator name limit
    #[error("Invalid name limit: max_validator_name cannot be zero")]
    InvalidNameLimit,

    /// Invalid validator key in node config
    #[error("Invalid validator key: {0}")]
    InvalidValidatorKey(String),
}
