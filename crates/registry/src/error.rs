//! Registry error types.

use thiserror::Error;
use veristake_types::{KeyId, OutPoint};

/// Errors returned by validator registry operations.
///
/// These are local rejections: the caller drops or refuses the triggering
/// message, but block processing never aborts because of one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The validator id is already registered.
    #[error("validator {0} already registered")]
    AlreadyRegistered(KeyId),

    /// Self-stake below the network minimum.
    #[error("stake {stake} below minimum {minimum}")]
    StakeTooLow {
        /// Offered stake
        stake: u64,
        /// Required minimum
        minimum: u64,
    },

    /// Pool fee outside the allowed basis-point range.
    #[error("pool fee {0} bps out of range")]
    FeeOutOfRange(i64),

    /// Validator name exceeds the byte limit.
    #[error("validator name {len} bytes exceeds limit {limit}")]
    NameTooLong {
        /// Offered name length
        len: usize,
        /// Allowed maximum
        limit: usize,
    },

    /// No validator with this id.
    #[error("unknown validator {0}")]
    UnknownValidator(KeyId),

    /// Signature did not verify against the registered public key.
    #[error("invalid signature on validator update")]
    InvalidSignature,

    /// The stake outpoint is already indexed for another validator.
    #[error("outpoint {0} already locked by another validator")]
    OutpointInUse(OutPoint),

    /// The update is not allowed in the validator's current status.
    #[error("update not permitted while validator is {status}")]
    StatusForbidsUpdate {
        /// Current status name
        status: &'static str,
    },

    /// Unjail/reactivate attempted before the jail term ended.
    #[error("jailed until height {release_height}, current height {current_height}")]
    JailNotExpired {
        /// Height at which the jail term ends
        release_height: u64,
        /// Height observed at the attempt
        current_height: u64,
    },

    /// Unjail attempted on a validator that is not jailed.
    #[error("validator {0} is not jailed")]
    NotJailed(KeyId),

    /// Stake delta is zero, negative, or would overflow.
    #[error("invalid stake delta {0}")]
    InvalidStakeDelta(i64),

    /// Removing more delegated stake than is recorded.
    #[error("delegation removal of {amount} exceeds recorded total {total}")]
    DelegationUnderflow {
        /// Amount requested for removal
        amount: u64,
        /// Recorded delegated total
        total: u64,
    },

    /// Snapshot bytes failed to decode.
    #[error("snapshot decode failed: {0}")]
    SnapshotDecode(String),
}
