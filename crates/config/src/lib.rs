//! # VeriStake Config
//!
//! Consensus parameters and node configuration for the VeriStake validator
//! core.
//!
//! Two configuration layers live here:
//!
//! - [`ConsensusParams`] - the immutable per-network parameter binding
//!   injected into the registry, trust engine, and delegation ledger at
//!   construction: stake floors, the heartbeat interval and uptime window,
//!   the four trust-tier thresholds and reward multipliers, and the
//!   maturity/unbonding/jail durations.
//! - [`NodeConfig`] - the operator-facing TOML file: data directory,
//!   advertised address, optional validator key, and an optional parameter
//!   override block.
//!
//! ## Example
//!
//! ```rust
//! use veristake_config::ConsensusParams;
//!
//! let params = ConsensusParams::mainnet();
//! params.validate().unwrap();
//! assert!(params.platinum_uptime_threshold > params.gold_uptime_threshold);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod error;
pub mod node;
pub mod params;

pub use error::ConfigError;
pub use node::NodeConfig;
pub use params::ConsensusParams;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
