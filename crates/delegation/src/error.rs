//! Delegation ledger error types.

use thiserror::Error;
use veristake_types::{KeyId, OutPoint};

/// Errors returned by delegation ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DelegationError {
    /// Signature did not verify.
    #[error("invalid signature on delegation request")]
    InvalidSignature,

    /// Delegation below the network minimum.
    #[error("delegation {amount} below minimum {minimum}")]
    AmountTooLow {
        /// Offered amount
        amount: u64,
        /// Required minimum
        minimum: u64,
    },

    /// The named validator is not registered.
    #[error("unknown validator {0}")]
    UnknownValidator(KeyId),

    /// The validator is not accepting delegations in its current status.
    #[error("validator is {status}, not accepting delegations")]
    ValidatorNotAccepting {
        /// Current status name
        status: &'static str,
    },

    /// A delegation with the same (delegator, validator, height) exists.
    #[error("duplicate delegation id")]
    DuplicateDelegation,

    /// The outpoint already backs another delegation.
    #[error("outpoint {0} already backs a delegation")]
    OutpointInUse(OutPoint),

    /// The delegator has no matching Active delegations.
    #[error("no matching delegations for {0}")]
    NoMatchingDelegations(KeyId),

    /// No delegation with this id.
    #[error("unknown delegation id")]
    UnknownDelegation,

    /// Snapshot bytes failed to decode.
    #[error("snapshot decode failed: {0}")]
    SnapshotDecode(String),
}
