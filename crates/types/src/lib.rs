//! # VeriStake Types
//!
//! Core type definitions for the VeriStake validator core.
//!
//! This crate provides the fundamental types shared by every component:
//! - [`KeyId`] - 20-byte hash-of-public-key identifiers for validators and delegators
//! - [`OutPoint`] - references to the UTXOs locking stake
//! - [`Hash`] - 32-byte hash values
//! - [`Amount`] - satoshi-like integer token amounts
//!
//! ## Example
//!
//! ```rust
//! use veristake_types::{KeyId, OutPoint, COIN};
//!
//! // Parse an identifier from hex
//! let id: KeyId = "0x742d35cc6634c0532925a3b844bc9e7595f0beb1".parse().unwrap();
//! assert!(!id.is_zero());
//!
//! // A null outpoint marks a stake UTXO still under construction
//! assert!(OutPoint::null().is_null());
//!
//! // 100,000 coins in base units
//! let stake = 100_000 * COIN;
//! assert_eq!(stake, 10_000_000_000_000);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod id;
pub mod outpoint;

pub use id::KeyId;
pub use outpoint::OutPoint;

/// A 32-byte hash value.
pub type Hash = [u8; 32];

/// All-zero hash constant.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Token amount in base units.
pub type Amount = u64;

/// Base units per whole coin.
pub const COIN: Amount = 100_000_000;

/// Result type alias for type-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when working with VeriStake types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid hex string
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Invalid length for a fixed-size type
    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Invalid outpoint format
    #[error("invalid outpoint format: {0}")]
    InvalidOutPoint(String),
}
