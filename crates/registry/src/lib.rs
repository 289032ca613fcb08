//! # VeriStake Registry
//!
//! The authoritative table of stake-backed validators.
//!
//! The [`ValidatorRegistry`] owns one entry per validator: self-stake, pool
//! fee, lifecycle status, display name, the UTXO locking the stake, and the
//! running totals of delegated stake. It serves registrations, signed
//! updates, jailing, lifecycle transitions on each block, and the
//! deterministic reward-split arithmetic used when a validator mints a
//! block.
//!
//! ## Validator lifecycle
//!
//! ```text
//! Pending ──maturity──▶ Active ──deactivate──▶ Unbonding ──period──▶ Inactive
//!                          │ ▲                                           │
//!                   jail   │ │ reactivate (height ≥ jail_release)        │
//!                          ▼ │                                           │
//!                        Jailed ◀──────── reactivate ────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use veristake_config::ConsensusParams;
//! use veristake_crypto::PrivateKey;
//! use veristake_registry::{ValidatorEntry, ValidatorRegistry, ValidatorStatus};
//!
//! let params = Arc::new(ConsensusParams::regtest());
//! let registry = ValidatorRegistry::new(Arc::clone(&params));
//!
//! let key = PrivateKey::random();
//! let entry = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 500, 0);
//! registry.register(entry).unwrap();
//!
//! let stored = registry.get(&key.key_id()).unwrap();
//! assert_eq!(stored.status, ValidatorStatus::Pending);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod entry;
pub mod error;
pub mod registry;

pub use entry::{RewardSplit, ValidatorEntry, ValidatorStatus};
pub use error::RegistryError;
pub use registry::{RegistrySnapshot, ValidatorRegistry};

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
