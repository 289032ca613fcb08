//! Delegation entries.

use serde::{Deserialize, Serialize};
use veristake_crypto::{Hasher, PublicKey};
use veristake_types::{Amount, Hash, KeyId, OutPoint};

/// Unique id of a delegation: `keccak256(delegator ‖ validator ‖ height)`.
pub type DelegationId = Hash;

/// Compute the id for a (delegator, validator, height) triple.
pub fn delegation_id(delegator_id: &KeyId, validator_id: &KeyId, height: u64) -> DelegationId {
    let mut hasher = Hasher::new();
    hasher.update(delegator_id.as_bytes());
    hasher.update(validator_id.as_bytes());
    hasher.update(&height.to_le_bytes());
    hasher.finalize()
}

/// Lifecycle status of a delegation.
///
/// Transitions are strictly forward:
/// Pending → Active → Unbonding → Withdrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegationStatus {
    /// Created, waiting out the maturity period.
    Pending,
    /// Counting toward the validator's stake and earning rewards.
    Active,
    /// Withdrawal requested, waiting out the unbonding period.
    Unbonding,
    /// Fully withdrawn; kept for history.
    Withdrawn,
}

impl DelegationStatus {
    /// Lowercase status name, as exposed over RPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            DelegationStatus::Pending => "pending",
            DelegationStatus::Active => "active",
            DelegationStatus::Unbonding => "unbonding",
            DelegationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One delegation of stake from a delegator to a validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationEntry {
    /// The delegating key id.
    pub delegator_id: KeyId,
    /// The delegator's public key, captured at creation so later
    /// undelegation and claim requests can be verified against it.
    pub delegator_pubkey: PublicKey,
    /// Validator the stake is delegated to.
    pub validator_id: KeyId,
    /// Delegated amount in base units.
    pub amount: Amount,
    /// Height the delegation was created.
    pub delegation_height: u64,
    /// Height rewards were last claimed.
    pub last_reward_height: u64,
    /// Current lifecycle status.
    pub status: DelegationStatus,
    /// UTXO locking the delegated stake; `None` while under construction.
    pub delegation_outpoint: Option<OutPoint>,
    /// Height unbonding started; 0 before that.
    pub unbonding_start_height: u64,
    /// Accumulated unclaimed rewards.
    pub pending_rewards: Amount,
}

impl DelegationEntry {
    /// This entry's ledger id.
    pub fn id(&self) -> DelegationId {
        delegation_id(&self.delegator_id, &self.validator_id, self.delegation_height)
    }

    /// Whether the delegation currently earns rewards.
    pub fn is_active(&self) -> bool {
        self.status == DelegationStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_depends_on_all_inputs() {
        let a = KeyId::new([1u8; 20]);
        let b = KeyId::new([2u8; 20]);

        let base = delegation_id(&a, &b, 10);
        assert_eq!(base, delegation_id(&a, &b, 10));
        assert_ne!(base, delegation_id(&b, &a, 10));
        assert_ne!(base, delegation_id(&a, &b, 11));
    }
}
