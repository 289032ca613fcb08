//! # VeriStake Wire
//!
//! Binary wire formats and signed message types for the validator core.
//!
//! All scalars are little-endian; byte strings are `u16`-length-prefixed.
//! Every message hashes its fields in wire order (signature excluded) with
//! Keccak256 to obtain the hash that is signed and, for heartbeats, the
//! replay-deduplication id.
//!
//! ## Message types
//!
//! - [`Heartbeat`] - periodic signed liveness announcement
//! - [`ValidatorRegistration`] - announce a new stake-backed validator
//! - [`ValidatorUpdate`] - signed mutation of an existing validator
//! - [`DelegationRequest`] / [`UndelegationRequest`] / [`RewardClaimRequest`]
//!   - delegator-signed stake movements
//!
//! ## Example
//!
//! ```rust
//! use veristake_crypto::PrivateKey;
//! use veristake_wire::{Heartbeat, WireDecode, WireEncode};
//!
//! let key = PrivateKey::random();
//! let mut hb = Heartbeat::new(key.key_id(), 100, [7u8; 32], 1_700_000_000);
//! hb.sign(&key).unwrap();
//!
//! let bytes = hb.to_bytes();
//! let decoded = Heartbeat::from_bytes(&bytes).unwrap();
//! assert!(decoded.verify(&key.public_key()));
//! ```

#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod delegation;
pub mod error;
pub mod heartbeat;
pub mod io;
pub mod validator;

pub use delegation::{DelegationRequest, RewardClaimRequest, UndelegationRequest};
pub use error::WireError;
pub use heartbeat::Heartbeat;
pub use io::{WireDecode, WireEncode};
pub use validator::{UpdateKind, ValidatorRegistration, ValidatorUpdate};
