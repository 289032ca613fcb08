//! # VeriStake Crypto
//!
//! Cryptographic primitives for the VeriStake validator core.
//!
//! This crate provides:
//! - **Keccak256 hashing** - the single hash function used for message
//!   signing hashes, delegation ids, and key-id derivation
//! - **ECDSA signatures** - secp256k1 signing and verification for
//!   heartbeats, registrations, updates, and delegation requests
//!
//! ## Example
//!
//! ```rust
//! use veristake_crypto::{keccak256, PrivateKey};
//!
//! let key = PrivateKey::random();
//! let pubkey = key.public_key();
//!
//! // Validators are addressed by the hash of their public key
//! let validator_id = pubkey.key_id();
//!
//! let hash = keccak256(b"signed payload");
//! let signature = key.sign_prehash(&hash).unwrap();
//! assert!(pubkey.verify_prehash(&hash, &signature));
//! assert!(!validator_id.is_zero());
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod ecdsa;
pub mod hash;

pub use ecdsa::{PrivateKey, PublicKey, Signature};
pub use hash::{keccak256, keccak256_concat, Hasher};

/// Common type alias for a 32-byte hash.
pub type Hash = veristake_types::Hash;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Invalid private key bytes
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid public key bytes
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid signature bytes
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid input length
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        actual: usize,
    },

    /// Hex decoding error
    #[error("hex decoding error: {0}")]
    HexError(String),
}

impl From<hex::FromHexError> for CryptoError {
    fn from(e: hex::FromHexError) -> Self {
        CryptoError::HexError(e.to_string())
    }
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
