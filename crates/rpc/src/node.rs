//! Node-side read-only RPC queries.

use std::sync::Arc;

use tracing::debug;
use veristake_config::ConsensusParams;
use veristake_delegation::DelegationLedger;
use veristake_registry::{ValidatorRegistry, ValidatorStatus};
use veristake_trust::{TrustScoreEngine, TrustTier};
use veristake_types::KeyId;

use crate::error::RpcError;
use crate::types::{
    RpcDelegationInfo, RpcPendingRewards, RpcTrustTierInfo, RpcValidatorInfo, RpcValidatorStats,
    TierCounts,
};
use crate::Result;

/// Parse a `0x`-prefixed hex key id parameter.
fn parse_key_id(param: &str) -> Result<KeyId> {
    KeyId::from_hex(param).map_err(|_| RpcError::InvalidParams(format!("bad key id '{param}'")))
}

/// Read-only query surface over the validator core.
pub struct NodeRpc {
    params: Arc<ConsensusParams>,
    registry: Arc<ValidatorRegistry>,
    trust: Arc<TrustScoreEngine>,
    delegation: Arc<DelegationLedger>,
}

impl NodeRpc {
    /// Wire the query surface against the core components.
    pub fn new(
        params: Arc<ConsensusParams>,
        registry: Arc<ValidatorRegistry>,
        trust: Arc<TrustScoreEngine>,
        delegation: Arc<DelegationLedger>,
    ) -> Self {
        Self {
            params,
            registry,
            trust,
            delegation,
        }
    }

    fn info_for(&self, entry: &veristake_registry::ValidatorEntry) -> RpcValidatorInfo {
        let uptime = self.trust.get(&entry.validator_id);
        RpcValidatorInfo::build(entry, uptime.as_ref(), &self.params)
    }

    /// `listvalidators(max_fee?, active_only?)`
    pub fn list_validators(
        &self,
        max_fee: Option<u16>,
        active_only: bool,
    ) -> Vec<RpcValidatorInfo> {
        let entries = match max_fee {
            Some(fee) => self.registry.validators_by_max_fee(fee),
            None if active_only => self.registry.validators_by_stake(),
            None => self.registry.all_validators(),
        };
        debug!(count = entries.len(), "listvalidators");
        entries.iter().map(|e| self.info_for(e)).collect()
    }

    /// `getvalidator(id)`
    pub fn get_validator(&self, id: &str) -> Result<RpcValidatorInfo> {
        let key_id = parse_key_id(id)?;
        let entry = self
            .registry
            .get(&key_id)
            .ok_or_else(|| RpcError::NotFound(format!("validator {key_id}")))?;
        Ok(self.info_for(&entry))
    }

    /// `getvalidatorstats()`
    pub fn get_validator_stats(&self) -> RpcValidatorStats {
        let entries = self.registry.all_validators();
        let mut stats = RpcValidatorStats {
            total_validators: entries.len(),
            active_validators: 0,
            total_stake: 0,
            total_delegated: 0,
            tiers: TierCounts::default(),
        };

        for entry in &entries {
            stats.total_stake = stats.total_stake.saturating_add(entry.self_stake);
            stats.total_delegated = stats.total_delegated.saturating_add(entry.total_delegated);
            if entry.status != ValidatorStatus::Active {
                continue;
            }
            stats.active_validators += 1;
            match self.trust.tier(&entry.validator_id) {
                TrustTier::Bronze => stats.tiers.bronze += 1,
                TrustTier::Silver => stats.tiers.silver += 1,
                TrustTier::Gold => stats.tiers.gold += 1,
                TrustTier::Platinum => stats.tiers.platinum += 1,
                TrustTier::None => stats.tiers.none += 1,
            }
        }
        stats
    }

    /// `listdelegations(id, "delegator" | "validator")`
    pub fn list_delegations(&self, id: &str, role: &str) -> Result<Vec<RpcDelegationInfo>> {
        let key_id = parse_key_id(id)?;
        let entries = match role {
            "delegator" => self.delegation.delegations_for_delegator(&key_id),
            "validator" => self.delegation.delegations_for_validator(&key_id),
            other => {
                return Err(RpcError::InvalidParams(format!(
                    "role must be 'delegator' or 'validator', got '{other}'"
                )));
            }
        };
        Ok(entries.iter().map(RpcDelegationInfo::from).collect())
    }

    /// `getpendingrewards(id)`
    pub fn get_pending_rewards(&self, id: &str) -> Result<RpcPendingRewards> {
        let key_id = parse_key_id(id)?;
        Ok(RpcPendingRewards {
            delegator: key_id.to_string(),
            total: self.delegation.pending_rewards_for_delegator(&key_id),
        })
    }

    /// `gettrusttierinfo()`
    pub fn get_trust_tier_info(&self) -> RpcTrustTierInfo {
        RpcTrustTierInfo::from(self.params.as_ref())
    }
}
