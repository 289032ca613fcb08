//! The delegation ledger component.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use veristake_config::ConsensusParams;
use veristake_registry::{ValidatorRegistry, ValidatorStatus};
use veristake_types::{Amount, KeyId, OutPoint};
use veristake_wire::{DelegationRequest, RewardClaimRequest, UndelegationRequest};

use crate::entry::{delegation_id, DelegationEntry, DelegationId, DelegationStatus};
use crate::error::DelegationError;
use crate::Result;

/// Serializable snapshot of the ledger for persistence.
///
/// Entries only; all three indexes are rebuilt on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// All delegation entries.
    pub entries: Vec<DelegationEntry>,
    /// Height the ledger had processed up to.
    pub current_height: u64,
}

#[derive(Default)]
struct Inner {
    delegations: HashMap<DelegationId, DelegationEntry>,
    // Id lists keep insertion order; undelegation consumes oldest first
    by_delegator: HashMap<KeyId, Vec<DelegationId>>,
    by_validator: HashMap<KeyId, Vec<DelegationId>>,
    by_outpoint: HashMap<OutPoint, DelegationId>,
    current_height: u64,
}

impl Inner {
    fn index(&mut self, id: DelegationId, entry: &DelegationEntry) {
        self.by_delegator
            .entry(entry.delegator_id)
            .or_default()
            .push(id);
        self.by_validator
            .entry(entry.validator_id)
            .or_default()
            .push(id);
        if let Some(outpoint) = entry.delegation_outpoint {
            self.by_outpoint.insert(outpoint, id);
        }
    }
}

/// The ledger of individual delegations, triple-indexed.
///
/// One internal lock. Operations that need the registry take it as an
/// argument and only touch it while the ledger lock is released, keeping
/// the component lock order acyclic.
pub struct DelegationLedger {
    params: Arc<ConsensusParams>,
    inner: RwLock<Inner>,
}

impl DelegationLedger {
    /// Create an empty ledger bound to the given network parameters.
    pub fn new(params: Arc<ConsensusParams>) -> Self {
        Self {
            params,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// The bound consensus parameters.
    pub fn params(&self) -> &ConsensusParams {
        &self.params
    }

    /// Accept a signed delegation request backed by `outpoint`.
    ///
    /// The validator must exist in the registry and be Pending or Active.
    /// The new entry starts Pending; the validator's delegated total is
    /// not touched until the entry matures.
    pub fn process_delegation(
        &self,
        request: &DelegationRequest,
        outpoint: Option<OutPoint>,
        registry: &ValidatorRegistry,
    ) -> Result<DelegationId> {
        if !request.verify() {
            warn!(delegator = %request.delegator_id, "Rejected delegation with bad signature");
            return Err(DelegationError::InvalidSignature);
        }
        if request.amount < self.params.min_delegation_amount {
            return Err(DelegationError::AmountTooLow {
                amount: request.amount,
                minimum: self.params.min_delegation_amount,
            });
        }

        // Registry consulted before the ledger lock is taken
        let validator = registry
            .get(&request.validator_id)
            .ok_or(DelegationError::UnknownValidator(request.validator_id))?;
        match validator.status {
            ValidatorStatus::Pending | ValidatorStatus::Active => {}
            other => {
                return Err(DelegationError::ValidatorNotAccepting {
                    status: other.as_str(),
                });
            }
        }

        let id = delegation_id(&request.delegator_id, &request.validator_id, request.height);
        let entry = DelegationEntry {
            delegator_id: request.delegator_id,
            delegator_pubkey: request.delegator_pubkey,
            validator_id: request.validator_id,
            amount: request.amount,
            delegation_height: request.height,
            last_reward_height: request.height,
            status: DelegationStatus::Pending,
            delegation_outpoint: outpoint,
            unbonding_start_height: 0,
            pending_rewards: 0,
        };

        let mut inner = self.inner.write();
        if inner.delegations.contains_key(&id) {
            return Err(DelegationError::DuplicateDelegation);
        }
        if let Some(outpoint) = outpoint {
            if inner.by_outpoint.contains_key(&outpoint) {
                return Err(DelegationError::OutpointInUse(outpoint));
            }
        }

        inner.index(id, &entry);
        inner.delegations.insert(id, entry);
        info!(
            delegation = %hex::encode(&id[..8]),
            delegator = %request.delegator_id,
            validator = %request.validator_id,
            amount = request.amount,
            height = request.height,
            "Created delegation"
        );
        Ok(id)
    }

    /// Begin withdrawing a delegator's stake from a validator.
    ///
    /// Consumes whole Active entries in insertion order until the
    /// requested amount is covered; `amount = 0` consumes them all. Each
    /// consumed entry starts unbonding and its full amount is removed from
    /// the validator's delegated total. Returns the total now unbonding.
    pub fn process_undelegation(
        &self,
        request: &UndelegationRequest,
        registry: &ValidatorRegistry,
    ) -> Result<Amount> {
        let mut consumed: Vec<Amount> = Vec::new();

        {
            let mut inner = self.inner.write();
            let current_height = inner.current_height;

            let ids = inner
                .by_delegator
                .get(&request.delegator_id)
                .cloned()
                .ok_or(DelegationError::NoMatchingDelegations(request.delegator_id))?;

            // Verify against the pubkey captured at delegation time
            let pubkey = ids
                .iter()
                .filter_map(|id| inner.delegations.get(id))
                .map(|e| e.delegator_pubkey)
                .next()
                .ok_or(DelegationError::NoMatchingDelegations(request.delegator_id))?;
            if !request.verify(&pubkey) {
                warn!(delegator = %request.delegator_id, "Rejected undelegation with bad signature");
                return Err(DelegationError::InvalidSignature);
            }

            let mut remaining = request.amount;
            for id in ids {
                let Some(entry) = inner.delegations.get_mut(&id) else {
                    continue;
                };
                if entry.validator_id != request.validator_id
                    || entry.status != DelegationStatus::Active
                {
                    continue;
                }

                entry.status = DelegationStatus::Unbonding;
                entry.unbonding_start_height = current_height;
                consumed.push(entry.amount);
                info!(
                    delegation = %hex::encode(&id[..8]),
                    amount = entry.amount,
                    height = current_height,
                    "Delegation unbonding"
                );

                if request.amount != 0 {
                    remaining = remaining.saturating_sub(entry.amount);
                    if remaining == 0 {
                        break;
                    }
                }
            }
        }

        if consumed.is_empty() {
            return Err(DelegationError::NoMatchingDelegations(request.delegator_id));
        }

        // Ledger lock released; report each consumed entry to the registry
        for amount in &consumed {
            if let Err(e) = registry.remove_delegation(&request.validator_id, *amount) {
                warn!(
                    validator = %request.validator_id,
                    amount,
                    error = %e,
                    "Registry rejected delegation removal"
                );
            }
        }

        Ok(consumed.iter().sum())
    }

    /// Sweep a delegator's pending rewards.
    ///
    /// When the request names a validator only that validator's
    /// delegations are swept; otherwise all of them. Returns the total
    /// claimed, which may be zero.
    pub fn process_reward_claim(&self, request: &RewardClaimRequest) -> Result<Amount> {
        let mut inner = self.inner.write();
        let current_height = inner.current_height;

        let ids = inner
            .by_delegator
            .get(&request.delegator_id)
            .cloned()
            .ok_or(DelegationError::NoMatchingDelegations(request.delegator_id))?;

        let pubkey = ids
            .iter()
            .filter_map(|id| inner.delegations.get(id))
            .map(|e| e.delegator_pubkey)
            .next()
            .ok_or(DelegationError::NoMatchingDelegations(request.delegator_id))?;
        if !request.verify(&pubkey) {
            warn!(delegator = %request.delegator_id, "Rejected reward claim with bad signature");
            return Err(DelegationError::InvalidSignature);
        }

        let mut total_claimed: Amount = 0;
        for id in ids {
            let Some(entry) = inner.delegations.get_mut(&id) else {
                continue;
            };
            if let Some(validator_id) = request.validator_id {
                if entry.validator_id != validator_id {
                    continue;
                }
            }
            if entry.pending_rewards > 0 {
                total_claimed += entry.pending_rewards;
                entry.pending_rewards = 0;
                entry.last_reward_height = current_height;
            }
        }

        if total_claimed > 0 {
            info!(
                delegator = %request.delegator_id,
                amount = total_claimed,
                "Claimed delegation rewards"
            );
        }
        Ok(total_claimed)
    }

    /// Distribute a block's delegators' share across Active delegations.
    ///
    /// Each delegation receives `⌊share · amount / total_active⌋`; zero
    /// shares are skipped and the floor-division remainder stays
    /// unallocated. Returns the total credited.
    pub fn distribute_block_reward(
        &self,
        validator_id: &KeyId,
        delegators_share: Amount,
    ) -> Amount {
        if delegators_share == 0 {
            return 0;
        }

        let mut inner = self.inner.write();
        let Some(ids) = inner.by_validator.get(validator_id).cloned() else {
            return 0;
        };

        let total_active: u128 = ids
            .iter()
            .filter_map(|id| inner.delegations.get(id))
            .filter(|e| e.is_active())
            .map(|e| e.amount as u128)
            .sum();
        if total_active == 0 {
            return 0;
        }

        let mut distributed: Amount = 0;
        for id in ids {
            let Some(entry) = inner.delegations.get_mut(&id) else {
                continue;
            };
            if !entry.is_active() {
                continue;
            }
            let share =
                ((delegators_share as u128 * entry.amount as u128) / total_active) as Amount;
            if share > 0 {
                entry.pending_rewards += share;
                distributed += share;
            }
        }

        debug!(
            validator = %validator_id,
            delegators_share,
            distributed,
            "Distributed block reward to delegators"
        );
        distributed
    }

    /// Credit rewards to a single delegation.
    pub fn add_rewards(&self, id: &DelegationId, rewards: Amount) -> Result<()> {
        let mut inner = self.inner.write();
        let entry = inner
            .delegations
            .get_mut(id)
            .ok_or(DelegationError::UnknownDelegation)?;
        entry.pending_rewards += rewards;
        Ok(())
    }

    /// Advance to `height` and run lifecycle transitions.
    ///
    /// Pending delegations past the maturity period become Active and are
    /// credited to their validator in the registry; Unbonding delegations
    /// past the unbonding period become Withdrawn.
    pub fn process_block(&self, height: u64, registry: &ValidatorRegistry) {
        // (validator, amount) pairs to credit once the lock is released
        let mut activated: Vec<(KeyId, Amount)> = Vec::new();

        {
            let mut inner = self.inner.write();
            inner.current_height = height;

            for (id, entry) in inner.delegations.iter_mut() {
                match entry.status {
                    DelegationStatus::Pending => {
                        if height.saturating_sub(entry.delegation_height)
                            >= self.params.delegation_maturity
                        {
                            entry.status = DelegationStatus::Active;
                            activated.push((entry.validator_id, entry.amount));
                            info!(
                                delegation = %hex::encode(&id[..8]),
                                height,
                                "Delegation matured, now active"
                            );
                        }
                    }
                    DelegationStatus::Unbonding => {
                        if height.saturating_sub(entry.unbonding_start_height)
                            >= self.params.delegation_unbonding_period
                        {
                            entry.status = DelegationStatus::Withdrawn;
                            info!(
                                delegation = %hex::encode(&id[..8]),
                                height,
                                "Delegation unbonding complete, withdrawn"
                            );
                        }
                    }
                    _ => {}
                }
            }
        }

        for (validator_id, amount) in activated {
            if let Err(e) = registry.add_delegation(&validator_id, amount) {
                warn!(
                    validator = %validator_id,
                    amount,
                    error = %e,
                    "Registry rejected delegation credit"
                );
            }
        }
    }

    /// Look up a delegation by id.
    pub fn get(&self, id: &DelegationId) -> Option<DelegationEntry> {
        self.inner.read().delegations.get(id).cloned()
    }

    /// Look up a delegation by the outpoint backing it.
    pub fn get_by_outpoint(&self, outpoint: &OutPoint) -> Option<DelegationEntry> {
        let inner = self.inner.read();
        let id = inner.by_outpoint.get(outpoint)?;
        inner.delegations.get(id).cloned()
    }

    /// Whether this outpoint backs a delegation.
    pub fn is_delegation(&self, outpoint: &OutPoint) -> bool {
        self.inner.read().by_outpoint.contains_key(outpoint)
    }

    /// All delegations made by a delegator, in insertion order.
    pub fn delegations_for_delegator(&self, delegator_id: &KeyId) -> Vec<DelegationEntry> {
        let inner = self.inner.read();
        inner
            .by_delegator
            .get(delegator_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.delegations.get(id))
            .cloned()
            .collect()
    }

    /// All delegations to a validator, in insertion order.
    pub fn delegations_for_validator(&self, validator_id: &KeyId) -> Vec<DelegationEntry> {
        let inner = self.inner.read();
        inner
            .by_validator
            .get(validator_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.delegations.get(id))
            .cloned()
            .collect()
    }

    /// Sum of Active delegation amounts to a validator.
    pub fn total_for_validator(&self, validator_id: &KeyId) -> Amount {
        let inner = self.inner.read();
        inner
            .by_validator
            .get(validator_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.delegations.get(id))
            .filter(|e| e.is_active())
            .map(|e| e.amount)
            .sum()
    }

    /// Total unclaimed rewards across a delegator's delegations.
    pub fn pending_rewards_for_delegator(&self, delegator_id: &KeyId) -> Amount {
        let inner = self.inner.read();
        inner
            .by_delegator
            .get(delegator_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.delegations.get(id))
            .map(|e| e.pending_rewards)
            .sum()
    }

    /// Number of Active delegations across the ledger.
    pub fn active_delegation_count(&self) -> usize {
        self.inner
            .read()
            .delegations
            .values()
            .filter(|e| e.is_active())
            .count()
    }

    /// Number of distinct delegators with Active delegations to a
    /// validator.
    pub fn delegator_count_for_validator(&self, validator_id: &KeyId) -> usize {
        let inner = self.inner.read();
        let unique: HashSet<KeyId> = inner
            .by_validator
            .get(validator_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.delegations.get(id))
            .filter(|e| e.is_active())
            .map(|e| e.delegator_id)
            .collect();
        unique.len()
    }

    /// Re-index a delegation after its backing UTXO moved.
    pub fn update_delegation_outpoint(
        &self,
        id: &DelegationId,
        new_outpoint: Option<OutPoint>,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(outpoint) = new_outpoint {
            if let Some(existing) = inner.by_outpoint.get(&outpoint) {
                if existing != id {
                    return Err(DelegationError::OutpointInUse(outpoint));
                }
            }
        }

        let entry = inner
            .delegations
            .get_mut(id)
            .ok_or(DelegationError::UnknownDelegation)?;
        let old = entry.delegation_outpoint.take();
        entry.delegation_outpoint = new_outpoint;

        if let Some(old) = old {
            inner.by_outpoint.remove(&old);
        }
        if let Some(new) = new_outpoint {
            inner.by_outpoint.insert(new, *id);
        }
        Ok(())
    }

    /// Height the ledger has processed up to.
    pub fn current_height(&self) -> u64 {
        self.inner.read().current_height
    }

    /// Set the height without running lifecycle transitions.
    pub fn set_height(&self, height: u64) {
        self.inner.write().current_height = height;
    }

    /// Snapshot the ledger state for persistence.
    pub fn snapshot(&self) -> LedgerSnapshot {
        let inner = self.inner.read();
        // Preserve per-delegator insertion order in the snapshot so the
        // rebuilt indexes consume in the same order
        let mut entries = Vec::with_capacity(inner.delegations.len());
        let mut seen: HashSet<DelegationId> = HashSet::new();
        for ids in inner.by_delegator.values() {
            for id in ids {
                if let Some(entry) = inner.delegations.get(id) {
                    if seen.insert(*id) {
                        entries.push(entry.clone());
                    }
                }
            }
        }
        LedgerSnapshot {
            entries,
            current_height: inner.current_height,
        }
    }

    /// Replace the ledger state from a snapshot, rebuilding all three
    /// indexes.
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        let mut inner = self.inner.write();
        inner.delegations.clear();
        inner.by_delegator.clear();
        inner.by_validator.clear();
        inner.by_outpoint.clear();
        inner.current_height = snapshot.current_height;

        for entry in snapshot.entries {
            let id = entry.id();
            inner.index(id, &entry);
            inner.delegations.insert(id, entry);
        }
        info!(
            delegations = inner.delegations.len(),
            height = inner.current_height,
            "Restored delegation ledger"
        );
    }

    /// Serialize the ledger to bytes.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(&self.snapshot()).unwrap_or_default()
    }

    /// Load ledger state from bytes produced by [`encode`](Self::encode).
    pub fn decode(&self, bytes: &[u8]) -> Result<()> {
        let snapshot: LedgerSnapshot = bincode::deserialize(bytes)
            .map_err(|e| DelegationError::SnapshotDecode(e.to_string()))?;
        self.restore(snapshot);
        Ok(())
    }
}
