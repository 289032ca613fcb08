//! # VeriStake Delegation
//!
//! The ledger of individual stake delegations.
//!
//! Each delegation is one UTXO-backed entry keyed by
//! `keccak256(delegator ‖ validator ‖ height)`, indexed three ways: by
//! delegator, by validator, and by the outpoint locking the stake. The
//! [`DelegationLedger`] manages the Pending → Active → Unbonding →
//! Withdrawn lifecycle, accumulates pending rewards as validators mint
//! blocks, and serves reward claims.
//!
//! The registry's `total_delegated` follows the **Active** delegations of
//! each validator: the ledger reports activation and consumption deltas to
//! the registry when entries mature or start unbonding, never while they
//! are pending.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use veristake_config::ConsensusParams;
//! use veristake_crypto::PrivateKey;
//! use veristake_delegation::DelegationLedger;
//! use veristake_registry::{ValidatorEntry, ValidatorRegistry};
//! use veristake_wire::DelegationRequest;
//!
//! let params = Arc::new(ConsensusParams::regtest());
//! let registry = ValidatorRegistry::new(Arc::clone(&params));
//! let ledger = DelegationLedger::new(Arc::clone(&params));
//!
//! let validator = PrivateKey::random();
//! registry
//!     .register(ValidatorEntry::new(
//!         validator.public_key(),
//!         params.min_validator_stake,
//!         500,
//!         0,
//!     ))
//!     .unwrap();
//!
//! let delegator = PrivateKey::random();
//! let mut request = DelegationRequest::new(
//!     &delegator,
//!     validator.key_id(),
//!     params.min_delegation_amount,
//!     0,
//! );
//! request.sign(&delegator).unwrap();
//! ledger.process_delegation(&request, None, &registry).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod entry;
pub mod error;
pub mod ledger;

pub use entry::{DelegationEntry, DelegationId, DelegationStatus};
pub use error::DelegationError;
pub use ledger::{DelegationLedger, LedgerSnapshot};

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, DelegationError>;
