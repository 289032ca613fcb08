//! The validator registry component.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use veristake_config::ConsensusParams;
use veristake_crypto::PublicKey;
use veristake_types::{Amount, KeyId, OutPoint};
use veristake_wire::{UpdateKind, ValidatorUpdate};

use crate::entry::{ValidatorEntry, ValidatorStatus};
use crate::error::RegistryError;
use crate::Result;

/// Serializable snapshot of the registry for persistence.
///
/// Entries are stored as a plain sequence; the outpoint index is derived
/// state and is rebuilt on restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// All validator entries.
    pub entries: Vec<ValidatorEntry>,
    /// Height the registry had processed up to.
    pub current_height: u64,
}

#[derive(Default)]
struct Inner {
    validators: HashMap<KeyId, ValidatorEntry>,
    outpoint_index: HashMap<OutPoint, KeyId>,
    current_height: u64,
}

/// Authoritative table of validators, keyed by validator id.
///
/// Thread-safe behind a single internal lock; all operations are
/// synchronous and bounded.
pub struct ValidatorRegistry {
    params: Arc<ConsensusParams>,
    inner: RwLock<Inner>,
}

impl ValidatorRegistry {
    /// Create an empty registry bound to the given network parameters.
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

    /// Register a new validator.
    ///
    /// The entry is always stored in the Pending state regardless of the
    /// status it arrives with; maturity promotes it on a later block.
    pub fn register(&self, mut entry: ValidatorEntry) -> Result<()> {
        if entry.self_stake < self.params.min_validator_stake {
            return Err(RegistryError::StakeTooLow {
                stake: entry.self_stake,
                minimum: self.params.min_validator_stake,
            });
        }
        if entry.pool_fee_bps < self.params.min_pool_fee
            || entry.pool_fee_bps > self.params.max_pool_fee
        {
            return Err(RegistryError::FeeOutOfRange(entry.pool_fee_bps as i64));
        }
        if entry.name.len() > self.params.max_validator_name {
            return Err(RegistryError::NameTooLong {
                len: entry.name.len(),
                limit: self.params.max_validator_name,
            });
        }

        let mut inner = self.inner.write();
        if inner.validators.contains_key(&entry.validator_id) {
            return Err(RegistryError::AlreadyRegistered(entry.validator_id));
        }
        if let Some(outpoint) = entry.stake_outpoint {
            if inner.outpoint_index.contains_key(&outpoint) {
                return Err(RegistryError::OutpointInUse(outpoint));
            }
            inner.outpoint_index.insert(outpoint, entry.validator_id);
        }

        entry.status = ValidatorStatus::Pending;
        info!(
            validator = %entry.validator_id,
            stake = entry.self_stake,
            fee_bps = entry.pool_fee_bps,
            height = entry.registration_height,
            "Registered validator"
        );
        inner.validators.insert(entry.validator_id, entry);
        Ok(())
    }

    /// Apply a signed validator update.
    pub fn process_update(&self, update: &ValidatorUpdate) -> Result<()> {
        let mut inner = self.inner.write();
        let current_height = inner.current_height;
        let entry = inner
            .validators
            .get_mut(&update.validator_id)
            .ok_or(RegistryError::UnknownValidator(update.validator_id))?;

        if !update.verify(&entry.pubkey) {
            warn!(validator = %update.validator_id, "Rejected update with bad signature");
            return Err(RegistryError::InvalidSignature);
        }

        match update.kind {
            UpdateKind::UpdateFee => {
                let fee = update.new_value;
                if fee < self.params.min_pool_fee as i64 || fee > self.params.max_pool_fee as i64 {
                    return Err(RegistryError::FeeOutOfRange(fee));
                }
                entry.pool_fee_bps = fee as u16;
                info!(validator = %entry.validator_id, fee_bps = entry.pool_fee_bps, "Updated pool fee");
            }
            UpdateKind::UpdateName => {
                if update.new_name.len() > self.params.max_validator_name {
                    return Err(RegistryError::NameTooLong {
                        len: update.new_name.len(),
                        limit: self.params.max_validator_name,
                    });
                }
                entry.name = update.new_name.clone();
                info!(validator = %entry.validator_id, name = %entry.name, "Updated validator name");
            }
            UpdateKind::Deactivate => {
                if entry.status != ValidatorStatus::Active {
                    return Err(RegistryError::StatusForbidsUpdate {
                        status: entry.status.as_str(),
                    });
                }
                entry.status = ValidatorStatus::Unbonding;
                // The unbonding clock runs from the moment of deactivation
                entry.last_active_height = current_height;
                info!(validator = %entry.validator_id, "Validator deactivating, unbonding started");
            }
            UpdateKind::Reactivate => {
                match entry.status {
                    ValidatorStatus::Jailed => {
                        if current_height < entry.jail_release_height {
                            return Err(RegistryError::JailNotExpired {
                                release_height: entry.jail_release_height,
                                current_height,
                            });
                        }
                    }
                    ValidatorStatus::Inactive => {}
                    _ => {
                        return Err(RegistryError::StatusForbidsUpdate {
                            status: entry.status.as_str(),
                        });
                    }
                }
                entry.status = ValidatorStatus::Active;
                entry.jail_release_height = 0;
                entry.last_active_height = current_height;
                info!(validator = %entry.validator_id, "Validator reactivated");
            }
            UpdateKind::IncreaseStake => {
                let delta = u64::try_from(update.new_value)
                    .ok()
                    .filter(|d| *d > 0)
                    .ok_or(RegistryError::InvalidStakeDelta(update.new_value))?;
                entry.self_stake = entry
                    .self_stake
                    .checked_add(delta)
                    .ok_or(RegistryError::InvalidStakeDelta(update.new_value))?;
                info!(
                    validator = %entry.validator_id,
                    delta,
                    self_stake = entry.self_stake,
                    "Increased self-stake"
                );
            }
            UpdateKind::DecreaseStake => {
                let delta = u64::try_from(update.new_value)
                    .ok()
                    .filter(|d| *d > 0)
                    .ok_or(RegistryError::InvalidStakeDelta(update.new_value))?;
                if delta > entry.self_stake {
                    return Err(RegistryError::InvalidStakeDelta(update.new_value));
                }
                let remaining = entry.self_stake - delta;
                if remaining < self.params.min_validator_stake {
                    return Err(RegistryError::StakeTooLow {
                        stake: remaining,
                        minimum: self.params.min_validator_stake,
                    });
                }
                entry.self_stake = remaining;
                info!(
                    validator = %entry.validator_id,
                    delta,
                    self_stake = entry.self_stake,
                    "Decreased self-stake"
                );
            }
        }

        Ok(())
    }

    /// Jail a validator for `jail_blocks` blocks.
    pub fn jail_validator(&self, validator_id: &KeyId, jail_blocks: u64) -> Result<()> {
        let mut inner = self.inner.write();
        let current_height = inner.current_height;
        let entry = inner
            .validators
            .get_mut(validator_id)
            .ok_or(RegistryError::UnknownValidator(*validator_id))?;

        entry.status = ValidatorStatus::Jailed;
        entry.jail_release_height = current_height + jail_blocks;
        warn!(
            validator = %validator_id,
            release_height = entry.jail_release_height,
            "Jailed validator"
        );
        Ok(())
    }

    /// Release a validator whose jail term has expired.
    pub fn unjail_validator(&self, validator_id: &KeyId) -> Result<()> {
        let mut inner = self.inner.write();
        let current_height = inner.current_height;
        let entry = inner
            .validators
            .get_mut(validator_id)
            .ok_or(RegistryError::UnknownValidator(*validator_id))?;

        if entry.status != ValidatorStatus::Jailed {
            return Err(RegistryError::NotJailed(*validator_id));
        }
        if current_height < entry.jail_release_height {
            return Err(RegistryError::JailNotExpired {
                release_height: entry.jail_release_height,
                current_height,
            });
        }

        entry.status = ValidatorStatus::Active;
        entry.jail_release_height = 0;
        entry.last_active_height = current_height;
        info!(validator = %validator_id, "Unjailed validator");
        Ok(())
    }

    /// Re-index a validator's stake after the locking UTXO moved.
    ///
    /// `None` clears the outpoint. Collisions with another validator's
    /// stake are rejected.
    pub fn update_stake_outpoint(
        &self,
        validator_id: &KeyId,
        new_outpoint: Option<OutPoint>,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(outpoint) = new_outpoint {
            if let Some(owner) = inner.outpoint_index.get(&outpoint) {
                if owner != validator_id {
                    return Err(RegistryError::OutpointInUse(outpoint));
                }
            }
        }

        let entry = inner
            .validators
            .get_mut(validator_id)
            .ok_or(RegistryError::UnknownValidator(*validator_id))?;
        let old = entry.stake_outpoint.take();
        entry.stake_outpoint = new_outpoint;

        if let Some(old) = old {
            inner.outpoint_index.remove(&old);
        }
        if let Some(new) = new_outpoint {
            inner.outpoint_index.insert(new, *validator_id);
        }
        debug!(validator = %validator_id, "Re-indexed stake outpoint");
        Ok(())
    }

    /// Credit delegated stake to a validator.
    pub fn add_delegation(&self, validator_id: &KeyId, amount: Amount) -> Result<()> {
        let mut inner = self.inner.write();
        let entry = inner
            .validators
            .get_mut(validator_id)
            .ok_or(RegistryError::UnknownValidator(*validator_id))?;

        entry.total_delegated = entry.total_delegated.saturating_add(amount);
        entry.delegator_count += 1;
        debug!(
            validator = %validator_id,
            amount,
            total_delegated = entry.total_delegated,
            delegators = entry.delegator_count,
            "Added delegation"
        );
        Ok(())
    }

    /// Remove delegated stake from a validator.
    pub fn remove_delegation(&self, validator_id: &KeyId, amount: Amount) -> Result<()> {
        let mut inner = self.inner.write();
        let entry = inner
            .validators
            .get_mut(validator_id)
            .ok_or(RegistryError::UnknownValidator(*validator_id))?;

        if amount > entry.total_delegated {
            return Err(RegistryError::DelegationUnderflow {
                amount,
                total: entry.total_delegated,
            });
        }
        entry.total_delegated -= amount;
        entry.delegator_count = entry.delegator_count.saturating_sub(1);
        debug!(
            validator = %validator_id,
            amount,
            total_delegated = entry.total_delegated,
            delegators = entry.delegator_count,
            "Removed delegation"
        );
        Ok(())
    }

    /// Look up a validator by id.
    pub fn get(&self, validator_id: &KeyId) -> Option<ValidatorEntry> {
        self.inner.read().validators.get(validator_id).cloned()
    }

    /// The registered public key for a validator, used to verify messages.
    pub fn pubkey(&self, validator_id: &KeyId) -> Option<PublicKey> {
        self.inner
            .read()
            .validators
            .get(validator_id)
            .map(|e| e.pubkey)
    }

    /// Look up a validator by the outpoint locking its stake.
    pub fn get_by_outpoint(&self, outpoint: &OutPoint) -> Option<ValidatorEntry> {
        let inner = self.inner.read();
        let id = inner.outpoint_index.get(outpoint)?;
        inner.validators.get(id).cloned()
    }

    /// Whether this outpoint locks some validator's stake.
    pub fn is_validator_stake(&self, outpoint: &OutPoint) -> bool {
        self.inner.read().outpoint_index.contains_key(outpoint)
    }

    /// All Active validators, in unspecified order.
    pub fn active_validators(&self) -> Vec<ValidatorEntry> {
        self.inner
            .read()
            .validators
            .values()
            .filter(|e| e.status == ValidatorStatus::Active)
            .cloned()
            .collect()
    }

    /// Active validators sorted by total stake, highest first.
    pub fn validators_by_stake(&self) -> Vec<ValidatorEntry> {
        let mut result = self.active_validators();
        result.sort_by(|a, b| b.total_stake().cmp(&a.total_stake()));
        result
    }

    /// Active validators charging at most `max_fee_bps`, cheapest first.
    pub fn validators_by_max_fee(&self, max_fee_bps: u16) -> Vec<ValidatorEntry> {
        let mut result: Vec<ValidatorEntry> = self
            .inner
            .read()
            .validators
            .values()
            .filter(|e| e.status == ValidatorStatus::Active && e.pool_fee_bps <= max_fee_bps)
            .cloned()
            .collect();
        result.sort_by_key(|e| e.pool_fee_bps);
        result
    }

    /// Every registered validator, regardless of status.
    pub fn all_validators(&self) -> Vec<ValidatorEntry> {
        self.inner.read().validators.values().cloned().collect()
    }

    /// Total number of registered validators.
    pub fn validator_count(&self) -> usize {
        self.inner.read().validators.len()
    }

    /// Number of Active validators.
    pub fn active_validator_count(&self) -> usize {
        self.inner
            .read()
            .validators
            .values()
            .filter(|e| e.status == ValidatorStatus::Active)
            .count()
    }

    /// Height the registry has processed up to.
    pub fn current_height(&self) -> u64 {
        self.inner.read().current_height
    }

    /// Set the height without running lifecycle transitions.
    pub fn set_height(&self, height: u64) {
        self.inner.write().current_height = height;
    }

    /// Advance to `height` and run lifecycle transitions.
    ///
    /// - Pending registrations past the maturity period become Active.
    /// - Unbonding validators past the unbonding period become Inactive.
    /// - Expired jail terms are logged; the validator stays Jailed until
    ///   an explicit reactivation.
    pub fn process_block(&self, height: u64) {
        let mut inner = self.inner.write();
        inner.current_height = height;

        for entry in inner.validators.values_mut() {
            match entry.status {
                ValidatorStatus::Pending => {
                    if height.saturating_sub(entry.registration_height)
                        >= self.params.delegation_maturity
                    {
                        entry.status = ValidatorStatus::Active;
                        entry.last_active_height = height;
                        info!(
                            validator = %entry.validator_id,
                            height,
                            "Validator matured, now active"
                        );
                    }
                }
                ValidatorStatus::Unbonding => {
                    if entry.last_active_height + self.params.unbonding_period <= height {
                        entry.status = ValidatorStatus::Inactive;
                        info!(
                            validator = %entry.validator_id,
                            height,
                            "Validator unbonding complete, now inactive"
                        );
                    }
                }
                ValidatorStatus::Jailed => {
                    if height >= entry.jail_release_height {
                        debug!(
                            validator = %entry.validator_id,
                            "Jail term expired, validator may reactivate"
                        );
                    }
                }
                _ => {}
            }
        }
    }

    /// Snapshot the registry state for persistence.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read();
        RegistrySnapshot {
            entries: inner.validators.values().cloned().collect(),
            current_height: inner.current_height,
        }
    }

    /// Replace the registry state from a snapshot, rebuilding the
    /// outpoint index.
    pub fn restore(&self, snapshot: RegistrySnapshot) {
        let mut inner = self.inner.write();
        inner.validators.clear();
        inner.outpoint_index.clear();
        inner.current_height = snapshot.current_height;

        for entry in snapshot.entries {
            if let Some(outpoint) = entry.stake_outpoint {
                inner.outpoint_index.insert(outpoint, entry.validator_id);
            }
            inner.validators.insert(entry.validator_id, entry);
        }
        info!(
            validators = inner.validators.len(),
            height = inner.current_height,
            "Restored validator registry"
        );
    }

    /// Serialize the registry to bytes.
    pub fn encode(&self) -> Vec<u8> {
        bincode::serialize(&self.snapshot()).unwrap_or_default()
    }

    /// Load registry state from bytes produced by [`encode`](Self::encode).
    pub fn decode(&self, bytes: &[u8]) -> Result<()> {
        let snapshot: RegistrySnapshot = bincode::deserialize(bytes)
            .map_err(|e| RegistryError::SnapshotDecode(e.to_string()))?;
        self.restore(snapshot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veristake_crypto::PrivateKey;

    fn setup() -> (Arc<ConsensusParams>, ValidatorRegistry, PrivateKey) {
        let params = Arc::new(ConsensusParams::regtest());
        let registry = ValidatorRegistry::new(Arc::clone(&params));
        (params, registry, PrivateKey::random())
    }

    fn register(registry: &ValidatorRegistry, params: &ConsensusParams, key: &PrivateKey) {
        let entry = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 500, 0);
        registry.register(entry).unwrap();
    }

    #[test]
    fn test_register_forces_pending() {
        let (params, registry, key) = setup();
        let mut entry = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 0, 0);
        entry.status = ValidatorStatus::Active;
        registry.register(entry).unwrap();
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Pending
        );
    }

    #[test]
    fn test_register_rejects_duplicates_and_bad_preconditions() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);

        let dup = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 0, 0);
        assert!(matches!(
            registry.register(dup),
            Err(RegistryError::AlreadyRegistered(_))
        ));

        let poor = ValidatorEntry::new(
            PrivateKey::random().public_key(),
            params.min_validator_stake - 1,
            0,
            0,
        );
        assert!(matches!(
            registry.register(poor),
            Err(RegistryError::StakeTooLow { .. })
        ));

        let named = ValidatorEntry::new(
            PrivateKey::random().public_key(),
            params.min_validator_stake,
            0,
            0,
        )
        .with_name("x".repeat(params.max_validator_name + 1));
        assert!(matches!(
            registry.register(named),
            Err(RegistryError::NameTooLong { .. })
        ));
    }

    #[test]
    fn test_outpoint_collision_rejected() {
        let (params, registry, key) = setup();
        let outpoint = OutPoint::new([1u8; 32], 0);
        let entry = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 0, 0)
            .with_outpoint(outpoint);
        registry.register(entry).unwrap();

        let other = PrivateKey::random();
        let clash = ValidatorEntry::new(other.public_key(), params.min_validator_stake, 0, 0)
            .with_outpoint(outpoint);
        assert!(matches!(
            registry.register(clash),
            Err(RegistryError::OutpointInUse(_))
        ));

        // Same collision through re-indexing
        let entry = ValidatorEntry::new(other.public_key(), params.min_validator_stake, 0, 0);
        registry.register(entry).unwrap();
        assert!(matches!(
            registry.update_stake_outpoint(&other.key_id(), Some(outpoint)),
            Err(RegistryError::OutpointInUse(_))
        ));
    }

    #[test]
    fn test_outpoint_reindex() {
        let (params, registry, key) = setup();
        let old = OutPoint::new([1u8; 32], 0);
        let new = OutPoint::new([2u8; 32], 1);
        let entry = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 0, 0)
            .with_outpoint(old);
        registry.register(entry).unwrap();

        registry
            .update_stake_outpoint(&key.key_id(), Some(new))
            .unwrap();
        assert!(!registry.is_validator_stake(&old));
        assert_eq!(
            registry.get_by_outpoint(&new).unwrap().validator_id,
            key.key_id()
        );

        registry.update_stake_outpoint(&key.key_id(), None).unwrap();
        assert!(!registry.is_validator_stake(&new));
    }

    #[test]
    fn test_maturity_transition() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);

        registry.process_block(params.delegation_maturity - 1);
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Pending
        );

        registry.process_block(params.delegation_maturity);
        let entry = registry.get(&key.key_id()).unwrap();
        assert_eq!(entry.status, ValidatorStatus::Active);
        assert_eq!(entry.last_active_height, params.delegation_maturity);
    }

    #[test]
    fn test_deactivate_then_unbond() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);
        registry.process_block(params.delegation_maturity);

        let deactivate_height = params.delegation_maturity + 3;
        registry.process_block(deactivate_height);
        let mut update = ValidatorUpdate::new(
            key.key_id(),
            UpdateKind::Deactivate,
            0,
            deactivate_height,
        );
        update.sign(&key).unwrap();
        registry.process_update(&update).unwrap();
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Unbonding
        );

        registry.process_block(deactivate_height + params.unbonding_period - 1);
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Unbonding
        );

        registry.process_block(deactivate_height + params.unbonding_period);
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Inactive
        );
    }

    #[test]
    fn test_update_rejects_bad_signature() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);

        let imposter = PrivateKey::random();
        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::UpdateFee, 100, 0);
        update.sign(&imposter).unwrap();
        assert!(matches!(
            registry.process_update(&update),
            Err(RegistryError::InvalidSignature)
        ));
    }

    #[test]
    fn test_fee_update_bounds() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);

        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::UpdateFee, 10_001, 0);
        update.sign(&key).unwrap();
        assert!(matches!(
            registry.process_update(&update),
            Err(RegistryError::FeeOutOfRange(_))
        ));

        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::UpdateFee, 10_000, 0);
        update.sign(&key).unwrap();
        registry.process_update(&update).unwrap();
        assert_eq!(registry.get(&key.key_id()).unwrap().pool_fee_bps, 10_000);
    }

    #[test]
    fn test_decrease_stake_floor() {
        let (params, registry, key) = setup();
        let entry = ValidatorEntry::new(
            key.public_key(),
            params.min_validator_stake + 100,
            0,
            0,
        );
        registry.register(entry).unwrap();

        let mut update =
            ValidatorUpdate::new(key.key_id(), UpdateKind::DecreaseStake, 101, 0);
        update.sign(&key).unwrap();
        assert!(matches!(
            registry.process_update(&update),
            Err(RegistryError::StakeTooLow { .. })
        ));

        let mut update =
            ValidatorUpdate::new(key.key_id(), UpdateKind::DecreaseStake, 100, 0);
        update.sign(&key).unwrap();
        registry.process_update(&update).unwrap();
        assert_eq!(
            registry.get(&key.key_id()).unwrap().self_stake,
            params.min_validator_stake
        );
    }

    #[test]
    fn test_jail_and_release() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);
        registry.process_block(params.delegation_maturity);

        let jail_height = params.delegation_maturity;
        registry.jail_validator(&key.key_id(), 100).unwrap();
        let entry = registry.get(&key.key_id()).unwrap();
        assert_eq!(entry.status, ValidatorStatus::Jailed);
        assert_eq!(entry.jail_release_height, jail_height + 100);

        registry.process_block(jail_height + 50);
        assert!(matches!(
            registry.unjail_validator(&key.key_id()),
            Err(RegistryError::JailNotExpired { .. })
        ));

        registry.process_block(jail_height + 100);
        registry.unjail_validator(&key.key_id()).unwrap();
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Active
        );
    }

    #[test]
    fn test_reactivate_from_jail_via_update() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);
        registry.process_block(params.delegation_maturity);
        registry.jail_validator(&key.key_id(), 100).unwrap();

        let mut update = ValidatorUpdate::new(key.key_id(), UpdateKind::Reactivate, 0, 0);
        update.sign(&key).unwrap();
        assert!(matches!(
            registry.process_update(&update),
            Err(RegistryError::JailNotExpired { .. })
        ));

        registry.process_block(params.delegation_maturity + 100);
        registry.process_update(&update).unwrap();
        assert_eq!(
            registry.get(&key.key_id()).unwrap().status,
            ValidatorStatus::Active
        );
    }

    #[test]
    fn test_delegation_accounting() {
        let (params, registry, key) = setup();
        register(&registry, &params, &key);

        registry.add_delegation(&key.key_id(), 500).unwrap();
        registry.add_delegation(&key.key_id(), 700).unwrap();
        let entry = registry.get(&key.key_id()).unwrap();
        assert_eq!(entry.total_delegated, 1_200);
        assert_eq!(entry.delegator_count, 2);

        assert!(matches!(
            registry.remove_delegation(&key.key_id(), 5_000),
            Err(RegistryError::DelegationUnderflow { .. })
        ));

        registry.remove_delegation(&key.key_id(), 700).unwrap();
        let entry = registry.get(&key.key_id()).unwrap();
        assert_eq!(entry.total_delegated, 500);
        assert_eq!(entry.delegator_count, 1);
    }

    #[test]
    fn test_query_ordering() {
        let (params, registry, _) = setup();

        for (stake_extra, fee) in [(30u64, 900u16), (10, 100), (20, 500)] {
            let key = PrivateKey::random();
            let entry = ValidatorEntry::new(
                key.public_key(),
                params.min_validator_stake + stake_extra,
                fee,
                0,
            );
            registry.register(entry).unwrap();
        }
        registry.process_block(params.delegation_maturity);

        let by_stake = registry.validators_by_stake();
        assert_eq!(by_stake.len(), 3);
        assert!(by_stake[0].total_stake() >= by_stake[1].total_stake());
        assert!(by_stake[1].total_stake() >= by_stake[2].total_stake());

        let cheap = registry.validators_by_max_fee(500);
        assert_eq!(cheap.len(), 2);
        assert_eq!(cheap[0].pool_fee_bps, 100);
        assert_eq!(cheap[1].pool_fee_bps, 500);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (params, registry, key) = setup();
        let outpoint = OutPoint::new([3u8; 32], 2);
        let entry = ValidatorEntry::new(key.public_key(), params.min_validator_stake, 250, 0)
            .with_name("atlas")
            .with_outpoint(outpoint);
        registry.register(entry).unwrap();
        registry.process_block(42);

        let bytes = registry.encode();

        let restored = ValidatorRegistry::new(Arc::clone(&params));
        restored.decode(&bytes).unwrap();

        assert_eq!(restored.current_height(), 42);
        let entry = restored.get(&key.key_id()).unwrap();
        assert_eq!(entry.name, "atlas");
        assert_eq!(entry.stake_outpoint, Some(outpoint));
        // Outpoint index is rebuilt, not persisted
        assert_eq!(
            restored.get_by_outpoint(&outpoint).unwrap().validator_id,
            key.key_id()
        );
    }
}
