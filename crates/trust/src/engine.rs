//! The trust score engine.
//!
//! Tracks expected versus received heartbeats per validator across a
//! rolling window and derives uptime, tier, and reward multiplier.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use veristake_config::ConsensusParams;
use veristake_types::{Amount, KeyId};

use crate::tier::TrustTier;

/// Per-validator liveness record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeRecord {
    /// The validator this record belongs to.
    pub validator_id: KeyId,
    /// Self-stake mirror, used for tier eligibility.
    pub stake_amount: Amount,
    /// Pool fee mirror, surfaced in validator listings.
    pub pool_fee_bps: u16,
    /// Height the validator registered.
    pub registration_height: u64,
    /// Height of the last accepted heartbeat.
    pub last_heartbeat_height: u64,
    /// Heartbeats expected inside the current window.
    pub heartbeats_expected: u64,
    /// Heartbeats received, never above `heartbeats_expected`.
    pub heartbeats_received: u64,
    /// Mirror of the registry's active-ness, for fast filtering.
    pub is_active: bool,
    /// Address the last heartbeat was sent from.
    pub last_known_address: Option<SocketAddr>,
    /// Unix timestamp of the last check-in.
    pub last_check_in_time: i64,
    /// Consecutive successful check-ins.
    pub consecutive_check_ins: u32,
    /// Total missed check-ins observed.
    pub missed_check_ins: u32,
}

impl UptimeRecord {
    fn new(validator_id: KeyId, stake_amount: Amount, pool_fee_bps: u16, height: u64) -> Self {
        Self {
            validator_id,
            stake_amount,
            pool_fee_bps,
            registration_height: height,
            last_heartbeat_height: height,
            heartbeats_expected: 0,
            heartbeats_received: 0,
            is_active: true,
            last_known_address: None,
            last_check_in_time: 0,
            consecutive_check_ins: 0,
            missed_check_ins: 0,
        }
    }

    /// Uptime in tenths of a percent (950 = 95.0%).
    ///
    /// A validator with no expectations yet is considered fully up.
    pub fn uptime_x10(&self) -> u32 {
        if self.heartbeats_expected == 0 {
            return 1000;
        }
        ((self.heartbeats_received * 1000) / self.heartbeats_expected) as u32
    }

    /// The trust tier under the given parameters.
    ///
    /// Inactive validators and validators below the stake floor rank
    /// `None` regardless of uptime.
    pub fn tier(&self, params: &ConsensusParams) -> TrustTier {
        if !self.is_active || self.stake_amount < params.min_validator_stake {
            return TrustTier::None;
        }
        TrustTier::from_uptime(self.uptime_x10(), params)
    }

    /// The reward multiplier in percent under the given parameters.
    pub fn reward_multiplier(&self, params: &ConsensusParams) -> u32 {
        self.tier(params).reward_multiplier(params)
    }

    /// Whether the validator is eligible to stake at all.
    pub fn is_eligible(&self, params: &ConsensusParams) -> bool {
        self.tier(params) != TrustTier::None
    }
}

#[derive(Default)]
struct Inner {
    validators: HashMap<KeyId, UptimeRecord>,
    current_height: u64,
}

/// Heartbeat bookkeeping and tier classification for all validators.
///
/// One internal lock; every operation is synchronous and bounded. Failure
/// modes on the heartbeat path are silent drops returning `false`, matching
/// how unsolicited network input is treated everywhere else.
pub struct TrustScoreEngine {
    params: Arc<ConsensusParams>,
    inner: RwLock<Inner>,
}

impl TrustScoreEngine {
    /// Create an empty engine bound to the given network parameters.
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

    /// Track a newly registered validator, counters zeroed.
    ///
    /// Mirrors the registry's preconditions on stake and fee; returns
    /// `false` (and records nothing) when they fail or the validator is
    /// already tracked.
    pub fn register_validator(
        &self,
        validator_id: KeyId,
        stake_amount: Amount,
        pool_fee_bps: u16,
        height: u64,
    ) -> bool {
        if stake_amount < self.params.min_validator_stake {
            warn!(
                validator = %validator_id,
                stake = stake_amount,
                minimum = self.params.min_validator_stake,
                "Refusing to track validator below stake floor"
            );
            return false;
        }
        if pool_fee_bps > self.params.max_pool_fee {
            warn!(validator = %validator_id, fee_bps = pool_fee_bps, "Refusing to track validator with invalid fee");
            return false;
        }

        let mut inner = self.inner.write();
        if inner.validators.contains_key(&validator_id) {
            debug!(validator = %validator_id, "Validator already tracked");
            return false;
        }

        inner.validators.insert(
            validator_id,
            UptimeRecord::new(validator_id, stake_amount, pool_fee_bps, height),
        );
        info!(
            validator = %validator_id,
            stake = stake_amount,
            fee_bps = pool_fee_bps,
            height,
            "Tracking validator liveness"
        );
        true
    }

    /// Mirror a stake change; dropping below the floor deactivates.
    pub fn update_stake(&self, validator_id: &KeyId, new_stake: Amount) -> bool {
        let mut inner = self.inner.write();
        let Some(record) = inner.validators.get_mut(validator_id) else {
            return false;
        };
        record.stake_amount = new_stake;
        if new_stake < self.params.min_validator_stake {
            record.is_active = false;
            info!(validator = %validator_id, "Validator deactivated, stake below floor");
        }
        true
    }

    /// Mirror a pool fee change.
    pub fn update_pool_fee(&self, validator_id: &KeyId, new_fee_bps: u16) -> bool {
        if new_fee_bps > self.params.max_pool_fee {
            return false;
        }
        let mut inner = self.inner.write();
        match inner.validators.get_mut(validator_id) {
            Some(record) => {
                record.pool_fee_bps = new_fee_bps;
                true
            }
            None => false,
        }
    }

    /// Record a heartbeat from a validator at `height`.
    ///
    /// Silently returns `false` for unknown validators, inactive
    /// validators, and heartbeats arriving before a full interval has
    /// passed since the last one.
    pub fn process_heartbeat(&self, validator_id: &KeyId, height: u64) -> bool {
        let mut inner = self.inner.write();
        let Some(record) = inner.validators.get_mut(validator_id) else {
            trace!(validator = %validator_id, "Heartbeat from unknown validator");
            return false;
        };
        if !record.is_active {
            trace!(validator = %validator_id, "Heartbeat from inactive validator");
            return false;
        }
        if height < record.last_heartbeat_height + self.params.heartbeat_interval {
            trace!(
                validator = %validator_id,
                height,
                last = record.last_heartbeat_height,
                "Heartbeat too early"
            );
            return false;
        }

        record.heartbeats_received += 1;
        record.last_heartbeat_height = height;
        debug!(validator = %validator_id, height, "Recorded heartbeat");
        true
    }

    /// Recompute every active validator's expected heartbeat count at
    /// `height`.
    ///
    /// `expected = min(height − registration_height, uptime_window) /
    /// heartbeat_interval`. The received counter is clamped to the new
    /// expectation so `received ≤ expected` survives window shrinkage.
    pub fn update_heartbeat_expectations(&self, height: u64) {
        let mut inner = self.inner.write();
        inner.current_height = height;

        for record in inner.validators.values_mut() {
            if !record.is_active {
                continue;
            }
            let since_registration = height.saturating_sub(record.registration_height);
            let window = since_registration.min(self.params.uptime_window);
            record.heartbeats_expected = window / self.params.heartbeat_interval;
            if record.heartbeats_received > record.heartbeats_expected {
                record.heartbeats_received = record.heartbeats_expected;
            }
        }
    }

    /// Record the address a validated heartbeat came from.
    pub fn update_validator_address(
        &self,
        validator_id: &KeyId,
        address: SocketAddr,
        timestamp: i64,
    ) -> bool {
        let mut inner = self.inner.write();
        let Some(record) = inner.validators.get_mut(validator_id) else {
            trace!(validator = %validator_id, "Address check-in from unknown validator");
            return false;
        };

        record.last_known_address = Some(address);
        record.last_check_in_time = timestamp;
        record.consecutive_check_ins += 1;
        debug!(
            validator = %validator_id,
            address = %address,
            consecutive = record.consecutive_check_ins,
            "Validator checked in"
        );
        true
    }

    /// Penalize validators that have gone quiet.
    ///
    /// A validator more than two intervals behind on heartbeats gets a
    /// missed check-in and its consecutive streak reset.
    pub fn record_missed_check_ins(&self, height: u64) {
        let interval = self.params.heartbeat_interval;
        let mut inner = self.inner.write();

        for record in inner.validators.values_mut() {
            if !record.is_active {
                continue;
            }
            if height.saturating_sub(record.last_heartbeat_height) > interval * 2 {
                record.missed_check_ins += 1;
                record.consecutive_check_ins = 0;
                debug!(
                    validator = %record.validator_id,
                    missed = record.missed_check_ins,
                    "Validator missed check-in"
                );
            }
        }
    }

    /// Look up a validator's liveness record.
    pub fn get(&self, validator_id: &KeyId) -> Option<UptimeRecord> {
        self.inner.read().validators.get(validator_id).cloned()
    }

    /// The trust tier for a validator; unknown validators rank `None`.
    pub fn tier(&self, validator_id: &KeyId) -> TrustTier {
        self.inner
            .read()
            .validators
            .get(validator_id)
            .map(|r| r.tier(&self.params))
            .unwrap_or(TrustTier::None)
    }

    /// The reward multiplier in percent; unknown validators earn 0.
    pub fn reward_multiplier(&self, validator_id: &KeyId) -> u32 {
        self.inner
            .read()
            .validators
            .get(validator_id)
            .map(|r| r.reward_multiplier(&self.params))
            .unwrap_or(0)
    }

    /// Whether a validator is eligible to stake.
    pub fn is_validator_eligible(&self, validator_id: &KeyId) -> bool {
        self.inner
            .read()
            .validators
            .get(validator_id)
            .map(|r| r.is_eligible(&self.params))
            .unwrap_or(false)
    }

    /// Mirror the registry's active-ness flag.
    pub fn set_active(&self, validator_id: &KeyId, active: bool) -> bool {
        let mut inner = self.inner.write();
        match inner.validators.get_mut(validator_id) {
            Some(record) => {
                record.is_active = active;
                true
            }
            None => false,
        }
    }

    /// Stop counting a validator toward liveness.
    pub fn deactivate(&self, validator_id: &KeyId) -> bool {
        self.set_active(validator_id, false)
    }

    /// All records currently marked active.
    pub fn active_validators(&self) -> Vec<UptimeRecord> {
        self.inner
            .read()
            .validators
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect()
    }

    /// Active validators currently classified at exactly `tier`.
    pub fn validators_by_tier(&self, tier: TrustTier) -> Vec<UptimeRecord> {
        self.inner
            .read()
            .validators
            .values()
            .filter(|r| r.is_active && r.tier(&self.params) == tier)
            .cloned()
            .collect()
    }

    /// Addresses of every active validator that has checked in.
    pub fn validator_addresses(&self) -> Vec<SocketAddr> {
        self.inner
            .read()
            .validators
            .values()
            .filter(|r| r.is_active)
            .filter_map(|r| r.last_known_address)
            .collect()
    }

    /// Addresses of active validators at or above `min_tier`.
    pub fn trusted_validator_addresses(&self, min_tier: TrustTier) -> Vec<SocketAddr> {
        self.inner
            .read()
            .validators
            .values()
            .filter(|r| r.is_active && r.tier(&self.params) >= min_tier)
            .filter_map(|r| r.last_known_address)
            .collect()
    }

    /// Whether this address belongs to an active validator.
    pub fn is_validator_address(&self, address: &SocketAddr) -> bool {
        self.inner
            .read()
            .validators
            .values()
            .any(|r| r.is_active && r.last_known_address == Some(*address))
    }

    /// The validator last seen at this address, if any.
    pub fn validator_id_by_address(&self, address: &SocketAddr) -> Option<KeyId> {
        self.inner
            .read()
            .validators
            .values()
            .find(|r| r.last_known_address == Some(*address))
            .map(|r| r.validator_id)
    }

    /// Number of validators being tracked.
    pub fn validator_count(&self) -> usize {
        self.inner.read().validators.len()
    }

    /// Height the engine last recomputed expectations at.
    pub fn current_height(&self) -> u64 {
        self.inner.read().current_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> (Arc<ConsensusParams>, TrustScoreEngine) {
        let params = Arc::new(ConsensusParams::regtest());
        let engine = TrustScoreEngine::new(Arc::clone(&params));
        (params, engine)
    }

    fn track(engine: &TrustScoreEngine, params: &ConsensusParams) -> KeyId {
        let id = KeyId::new([7u8; 20]);
        assert!(engine.register_validator(id, params.min_validator_stake, 500, 0));
        id
    }

    #[test]
    fn test_register_preconditions() {
        let (params, engine) = engine();
        let id = KeyId::new([1u8; 20]);

        assert!(!engine.register_validator(id, params.min_validator_stake - 1, 0, 0));
        assert!(!engine.register_validator(id, params.min_validator_stake, 10_001, 0));
        assert!(engine.register_validator(id, params.min_validator_stake, 0, 0));
        // Duplicate
        assert!(!engine.register_validator(id, params.min_validator_stake, 0, 0));
    }

    #[test]
    fn test_full_uptime_before_any_expectation() {
        let (params, engine) = engine();
        let id = track(&engine, &params);
        let record = engine.get(&id).unwrap();
        assert_eq!(record.uptime_x10(), 1000);
        assert_eq!(record.tier(&params), TrustTier::Platinum);
    }

    #[test]
    fn test_heartbeat_interval_gate() {
        let (params, engine) = engine();
        let id = track(&engine, &params);
        let interval = params.heartbeat_interval;

        // Too early: less than one interval since registration
        assert!(!engine.process_heartbeat(&id, interval - 1));
        assert!(engine.process_heartbeat(&id, interval));
        // Too early again relative to the accepted one; the boundary is
        // exclusive even at an exact multiple of the interval
        assert!(!engine.process_heartbeat(&id, interval + 1));
        assert!(engine.process_heartbeat(&id, interval * 2));

        let record = engine.get(&id).unwrap();
        assert_eq!(record.heartbeats_received, 2);
        assert_eq!(record.last_heartbeat_height, interval * 2);
    }

    #[test]
    fn test_unknown_and_inactive_dropped() {
        let (params, engine) = engine();
        let id = track(&engine, &params);

        assert!(!engine.process_heartbeat(&KeyId::new([9u8; 20]), 100));
        engine.deactivate(&id);
        assert!(!engine.process_heartbeat(&id, params.heartbeat_interval));
    }

    #[test]
    fn test_expectations_and_uptime() {
        let (params, engine) = engine();
        let id = track(&engine, &params);
        let interval = params.heartbeat_interval;

        // Deliver every other heartbeat across 10 intervals
        for i in 1..=10u64 {
            engine.update_heartbeat_expectations(i * interval);
            if i % 2 == 0 {
                assert!(engine.process_heartbeat(&id, i * interval));
            }
        }
        engine.update_heartbeat_expectations(10 * interval);

        let record = engine.get(&id).unwrap();
        assert_eq!(record.heartbeats_expected, 10);
        assert_eq!(record.heartbeats_received, 5);
        assert_eq!(record.uptime_x10(), 500);
        assert_eq!(record.tier(&params), TrustTier::None);
    }

    #[test]
    fn test_received_clamped_to_window() {
        let (params, engine) = engine();
        let id = track(&engine, &params);
        let interval = params.heartbeat_interval;
        let window_intervals = params.uptime_window / interval;

        // Heartbeat every interval for twice the window length
        for i in 1..=(window_intervals * 2) {
            engine.update_heartbeat_expectations(i * interval);
            assert!(engine.process_heartbeat(&id, i * interval));
        }
        engine.update_heartbeat_expectations(window_intervals * 2 * interval);

        let record = engine.get(&id).unwrap();
        assert_eq!(record.heartbeats_expected, window_intervals);
        assert!(record.heartbeats_received <= record.heartbeats_expected);
        assert_eq!(record.uptime_x10(), 1000);
    }

    #[test]
    fn test_address_tracking() {
        let (params, engine) = engine();
        let id = track(&engine, &params);
        let addr: SocketAddr = "203.0.113.5:18888".parse().unwrap();

        assert!(engine.update_validator_address(&id, addr, 1_700_000_000));
        assert!(engine.is_validator_address(&addr));
        assert_eq!(engine.validator_id_by_address(&addr), Some(id));
        assert_eq!(engine.validator_addresses(), vec![addr]);

        let record = engine.get(&id).unwrap();
        assert_eq!(record.consecutive_check_ins, 1);
        assert_eq!(record.last_check_in_time, 1_700_000_000);

        assert!(!engine.update_validator_address(&KeyId::new([9u8; 20]), addr, 0));
    }

    #[test]
    fn test_missed_check_ins() {
        let (params, engine) = engine();
        let id = track(&engine, &params);
        let interval = params.heartbeat_interval;

        engine.update_validator_address(&id, "203.0.113.5:1".parse().unwrap(), 0);
        assert_eq!(engine.get(&id).unwrap().consecutive_check_ins, 1);

        // Within two intervals: not missed yet
        engine.record_missed_check_ins(interval * 2);
        assert_eq!(engine.get(&id).unwrap().missed_check_ins, 0);

        engine.record_missed_check_ins(interval * 2 + 1);
        let record = engine.get(&id).unwrap();
        assert_eq!(record.missed_check_ins, 1);
        assert_eq!(record.consecutive_check_ins, 0);
    }

    #[test]
    fn test_stake_drop_deactivates() {
        let (params, engine) = engine();
        let id = track(&engine, &params);

        assert!(engine.update_stake(&id, params.min_validator_stake - 1));
        let record = engine.get(&id).unwrap();
        assert!(!record.is_active);
        assert_eq!(record.tier(&params), TrustTier::None);
    }

    #[test]
    fn test_tier_listing() {
        let (params, engine) = engine();
        let id = track(&engine, &params);

        // No expectations yet: everything reads as Platinum
        assert_eq!(engine.validators_by_tier(TrustTier::Platinum).len(), 1);
        assert!(engine.validators_by_tier(TrustTier::Bronze).is_empty());
        assert_eq!(
            engine
                .trusted_validator_addresses(TrustTier::Bronze)
                .len(),
            0 // no address recorded yet
        );

        engine.update_validator_address(&id, "203.0.113.5:1".parse().unwrap(), 0);
        assert_eq!(
            engine.trusted_validator_addresses(TrustTier::Bronze).len(),
            1
        );
    }
}
