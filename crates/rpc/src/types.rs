//! JSON response types.

use serde::{Deserialize, Serialize};
use veristake_config::ConsensusParams;
use veristake_delegation::DelegationEntry;
use veristake_registry::ValidatorEntry;
use veristake_trust::{TrustTier, UptimeRecord};

/// One validator row in `listvalidators` / `getvalidator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcValidatorInfo {
    /// Validator id, hex with `0x` prefix.
    pub id: String,
    /// Self-stake in base units.
    pub stake: u64,
    /// Delegated stake in base units.
    pub delegated: u64,
    /// Total stake (self + delegated).
    pub total: u64,
    /// Pool fee in basis points.
    pub fee: u16,
    /// Display name, possibly empty.
    pub name: String,
    /// Lifecycle status (`pending`, `active`, ...).
    pub status: String,
    /// Number of active delegations.
    pub delegator_count: u32,
    /// Trust tier (`NONE` ... `PLATINUM`).
    pub trust_tier: String,
    /// Uptime in tenths of a percent (955 = 95.5%).
    pub uptime_percent_x10: u32,
    /// Last known address, if the validator has checked in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl RpcValidatorInfo {
    /// Join a registry entry with its trust record.
    pub fn build(
        entry: &ValidatorEntry,
        uptime: Option<&UptimeRecord>,
        params: &ConsensusParams,
    ) -> Self {
        let (trust_tier, uptime_x10, address) = match uptime {
            Some(record) => (
                record.tier(params),
                record.uptime_x10(),
                record.last_known_address.map(|a| a.to_string()),
            ),
            None => (TrustTier::None, 0, None),
        };
        Self {
            id: entry.validator_id.to_string(),
            stake: entry.self_stake,
            delegated: entry.total_delegated,
            total: entry.total_stake(),
            fee: entry.pool_fee_bps,
            name: entry.name.clone(),
            status: entry.status.as_str().to_string(),
            delegator_count: entry.delegator_count,
            trust_tier: trust_tier.as_str().to_string(),
            uptime_percent_x10: uptime_x10,
            address,
        }
    }
}

/// Per-tier validator counts in `getvalidatorstats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierCounts {
    /// Validators currently ranked Bronze.
    pub bronze: usize,
    /// Validators currently ranked Silver.
    pub silver: usize,
    /// Validators currently ranked Gold.
    pub gold: usize,
    /// Validators currently ranked Platinum.
    pub platinum: usize,
    /// Active validators below Bronze.
    pub none: usize,
}

/// Aggregate statistics in `getvalidatorstats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcValidatorStats {
    /// Registered validators, any status.
    pub total_validators: usize,
    /// Validators in the Active status.
    pub active_validators: usize,
    /// Sum of self-stake across all validators.
    pub total_stake: u64,
    /// Sum of delegated stake across all validators.
    pub total_delegated: u64,
    /// Tier distribution over active validators.
    pub tiers: TierCounts,
}

/// One delegation row in `listdelegations` / `getmydelegations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcDelegationInfo {
    /// Delegation id, hex.
    pub id: String,
    /// Delegator id, hex with `0x` prefix.
    pub delegator: String,
    /// Validator id, hex with `0x` prefix.
    pub validator: String,
    /// Delegated amount in base units.
    pub amount: u64,
    /// Lifecycle status (`pending`, `active`, ...).
    pub status: String,
    /// Height the delegation was created.
    pub height: u64,
    /// Unclaimed rewards in base units.
    pub pending_rewards: u64,
}

impl From<&DelegationEntry> for RpcDelegationInfo {
    fn from(entry: &DelegationEntry) -> Self {
        Self {
            id: hex::encode(entry.id()),
            delegator: entry.delegator_id.to_string(),
            validator: entry.validator_id.to_string(),
            amount: entry.amount,
            status: entry.status.as_str().to_string(),
            height: entry.delegation_height,
            pending_rewards: entry.pending_rewards,
        }
    }
}

/// Response of `getpendingrewards`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcPendingRewards {
    /// Delegator id, hex with `0x` prefix.
    pub delegator: String,
    /// Total unclaimed rewards in base units.
    pub total: u64,
}

/// Response of `gettrusttierinfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTrustTierInfo {
    /// Tier uptime thresholds in tenths of a percent, bronze..platinum.
    pub thresholds: [u32; 4],
    /// Tier reward multipliers in percent, bronze..platinum.
    pub multipliers: [u32; 4],
    /// Minimum validator self-stake in base units.
    pub min_stake: u64,
    /// Minimum delegation amount in base units.
    pub min_delegation: u64,
    /// Heartbeat interval in blocks.
    pub heartbeat_interval: u64,
    /// Uptime measurement window in blocks.
    pub uptime_window: u64,
}

impl From<&ConsensusParams> for RpcTrustTierInfo {
    fn from(params: &ConsensusParams) -> Self {
        Self {
            thresholds: [
                params.bronze_uptime_threshold,
                params.silver_uptime_threshold,
                params.gold_uptime_threshold,
                params.platinum_uptime_threshold,
            ],
            multipliers: [
                params.bronze_reward_multiplier,
                params.silver_reward_multiplier,
                params.gold_reward_multiplier,
                params.platinum_reward_multiplier,
            ],
            min_stake: params.min_validator_stake,
            min_delegation: params.min_delegation_amount,
            heartbeat_interval: params.heartbeat_interval,
            uptime_window: params.uptime_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_info_from_params() {
        let info = RpcTrustTierInfo::from(&ConsensusParams::mainnet());
        assert_eq!(info.thresholds, [950, 970, 990, 999]);
        assert_eq!(info.multipliers, [100, 120, 150, 200]);

        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("minStake").is_some());
        assert!(json.get("heartbeatInterval").is_some());
    }
}
