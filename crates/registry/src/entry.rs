//! Validator entries and reward-split arithmetic.

use serde::{Deserialize, Serialize};
use veristake_crypto::PublicKey;
use veristake_types::{Amount, KeyId, OutPoint};
use veristake_wire::ValidatorRegistration;

/// Lifecycle status of a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    /// Registered, waiting out the maturity period.
    Pending,
    /// Eligible for staking and rewards.
    Active,
    /// Voluntarily retired; unbonding complete.
    Inactive,
    /// Punitively frozen until explicitly reactivated.
    Jailed,
    /// Voluntarily deactivated, waiting out the unbonding period.
    Unbonding,
}

impl ValidatorStatus {
    /// Lowercase status name, as exposed over RPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidatorStatus::Pending => "pending",
            ValidatorStatus::Active => "active",
            ValidatorStatus::Inactive => "inactive",
            ValidatorStatus::Jailed => "jailed",
            ValidatorStatus::Unbonding => "unbonding",
        }
    }
}

impl std::fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of splitting one block reward between a validator and its
/// delegators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardSplit {
    /// Amount owed to the validator: its stake share plus the pool fee.
    pub validator: Amount,
    /// Amount owed collectively to the delegators.
    pub delegators: Amount,
}

/// A validator's record in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    /// Identifier, the hash of `pubkey`.
    pub validator_id: KeyId,
    /// Public key updates from this validator are verified against.
    pub pubkey: PublicKey,
    /// Self-stake in base units.
    pub self_stake: Amount,
    /// Pool fee in basis points (100 = 1%) skimmed from delegator rewards.
    pub pool_fee_bps: u16,
    /// Height the registration was accepted.
    pub registration_height: u64,
    /// Height the validator last entered (or left) active duty.
    pub last_active_height: u64,
    /// Height a jail term ends; 0 when not jailed.
    pub jail_release_height: u64,
    /// Current lifecycle status.
    pub status: ValidatorStatus,
    /// Operator-chosen display name, possibly empty.
    pub name: String,
    /// UTXO locking `self_stake`; `None` while under construction.
    pub stake_outpoint: Option<OutPoint>,
    /// Sum of Active delegations to this validator.
    pub total_delegated: Amount,
    /// Number of Active delegations to this validator.
    pub delegator_count: u32,
}

impl ValidatorEntry {
    /// Create a fresh entry in the Pending state.
    pub fn new(pubkey: PublicKey, self_stake: Amount, pool_fee_bps: u16, height: u64) -> Self {
        Self {
            validator_id: pubkey.key_id(),
            pubkey,
            self_stake,
            pool_fee_bps,
            registration_height: height,
            last_active_height: 0,
            jail_release_height: 0,
            status: ValidatorStatus::Pending,
            name: String::new(),
            stake_outpoint: None,
            total_delegated: 0,
            delegator_count: 0,
        }
    }

    /// Build an entry from a verified registration message.
    pub fn from_registration(reg: &ValidatorRegistration) -> Self {
        Self::new(
            reg.pubkey,
            reg.stake_amount,
            reg.pool_fee_bps,
            reg.registration_height,
        )
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the stake-locking outpoint.
    pub fn with_outpoint(mut self, outpoint: OutPoint) -> Self {
        self.stake_outpoint = Some(outpoint);
        self
    }

    /// Self-stake plus delegated stake.
    pub fn total_stake(&self) -> Amount {
        self.self_stake.saturating_add(self.total_delegated)
    }

    /// Whether the self-stake satisfies the network minimum.
    pub fn meets_minimum_stake(&self, min_validator_stake: Amount) -> bool {
        self.self_stake >= min_validator_stake
    }

    /// Split a block reward between this validator and its delegators.
    ///
    /// Floor division at every step; identical on every node or the chain
    /// forks:
    ///
    /// 1. no delegations: the validator keeps the whole reward
    /// 2. `validator_stake_share = ⌊R · self_stake / total_stake⌋`
    /// 3. `delegators_share_pre = R − validator_stake_share`
    /// 4. `pool_fee = ⌊delegators_share_pre · pool_fee_bps / 10_000⌋`
    /// 5. validator: stake share + pool fee; delegators: the rest
    ///
    /// Intermediate products run in u128 so stakes near 2^62 cannot
    /// overflow.
    pub fn split_block_reward(&self, block_reward: Amount) -> RewardSplit {
        if self.total_delegated == 0 {
            return RewardSplit {
                validator: block_reward,
                delegators: 0,
            };
        }

        let total = self.total_stake() as u128;
        let validator_stake_share =
            ((block_reward as u128 * self.self_stake as u128) / total) as u64;
        let delegators_share_pre = block_reward - validator_stake_share;
        let pool_fee =
            ((delegators_share_pre as u128 * self.pool_fee_bps as u128) / 10_000) as u64;

        RewardSplit {
            validator: validator_stake_share + pool_fee,
            delegators: delegators_share_pre - pool_fee,
        }
    }

    /// The validator's own share of a block reward.
    pub fn validator_reward(&self, block_reward: Amount) -> Amount {
        self.split_block_reward(block_reward).validator
    }

    /// The delegators' collective share of a block reward.
    pub fn delegators_reward(&self, block_reward: Amount) -> Amount {
        self.split_block_reward(block_reward).delegators
    }
}
