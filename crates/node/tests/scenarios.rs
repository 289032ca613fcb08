//! End-to-end scenarios for the validator core: registration maturity,
//! heartbeat-driven tiers, reward splits, unbonding, jailing, and replay
//! protection.

use std::sync::Arc;

use veristake::{ConsensusParams, ValidatorCore, ValidatorStatus};
use veristake_crypto::PrivateKey;
use veristake_registry::ValidatorEntry;
use veristake_trust::TrustTier;
use veristake_types::COIN;
use veristake_wire::{
    DelegationRequest, Heartbeat, UndelegationRequest, UpdateKind, ValidatorUpdate,
};

fn core_with(params: ConsensusParams) -> Arc<ValidatorCore> {
    Arc::new(ValidatorCore::new(params).unwrap())
}

fn register_validator(core: &ValidatorCore, stake: u64, fee_bps: u16, height: u64) -> PrivateKey {
    let key = PrivateKey::random();
    let registration = {
        let mut reg = veristake_wire::ValidatorRegistration::new(
            key.public_key(),
            stake,
            fee_bps,
            height,
        );
        reg.sign(&key).unwrap();
        reg
    };
    assert!(core.process_validator_registration(&registration));
    key
}

/// S1: a fresh registration stays Pending through the maturity window and
/// becomes Active exactly when it closes.
#[test]
fn registration_matures_into_active() {
    let params = ConsensusParams::mainnet();
    let maturity = params.delegation_maturity;
    let core = core_with(params);

    let key = register_validator(&core, 100_000 * COIN, 500, 0);
    let registry = core.registry();

    core.on_new_block(maturity - 1, [0u8; 32], 0);
    assert_eq!(
        registry.get(&key.key_id()).unwrap().status,
        ValidatorStatus::Pending
    );

    core.on_new_block(maturity, [0u8; 32], 0);
    assert_eq!(
        registry.get(&key.key_id()).unwrap().status,
        ValidatorStatus::Active
    );
}

/// S2: 955 heartbeats over a 1,000-interval window land the validator in
/// Bronze with the Bronze multiplier.
#[test]
fn uptime_of_955_earns_bronze() {
    let params = ConsensusParams::mainnet();
    let interval = params.heartbeat_interval;
    let window_intervals = params.uptime_window / interval;
    assert_eq!(window_intervals, 1_000);

    let core = core_with(params.clone());
    let key = register_validator(&core, 100_000 * COIN, 500, 0);
    let trust = core.trust();

    let mut delivered = 0u64;
    for i in 1..=window_intervals {
        let height = i * interval;
        trust.update_heartbeat_expectations(height);
        // Skip every 22nd interval: 45 misses across the window
        if i % 22 != 0 {
            assert!(trust.process_heartbeat(&key.key_id(), height));
            delivered += 1;
        }
    }
    trust.update_heartbeat_expectations(window_intervals * interval);
    assert_eq!(delivered, 955);

    let record = trust.get(&key.key_id()).unwrap();
    assert_eq!(record.heartbeats_expected, 1_000);
    assert_eq!(record.heartbeats_received, 955);
    assert_eq!(record.uptime_x10(), 955);
    assert_eq!(record.tier(&params), TrustTier::Bronze);
    assert_eq!(
        record.reward_multiplier(&params),
        params.bronze_reward_multiplier
    );
}

/// S3: the reference reward split. self=100, delegated=900, 10% fee,
/// R=1000: validator 190, delegators 810, no dust.
#[test]
fn reference_reward_split() {
    let key = PrivateKey::random();
    let mut entry = ValidatorEntry::new(key.public_key(), 100, 1_000, 0);
    entry.total_delegated = 900;

    let split = entry.split_block_reward(1_000);
    assert_eq!(split.validator, 190);
    assert_eq!(split.delegators, 810);
    assert_eq!(split.validator + split.delegators, 1_000);
}

/// S3, end to end: a single delegator of the full 810 delegators' share.
#[test]
fn single_delegator_receives_delegators_share() {
    let params = ConsensusParams::regtest();
    let maturity = params.delegation_maturity;
    let core = core_with(params.clone());

    let validator = register_validator(&core, params.min_validator_stake, 1_000, 0);
    let delegator = PrivateKey::random();
    let mut request = DelegationRequest::new(
        &delegator,
        validator.key_id(),
        900 * COIN,
        0,
    );
    request.sign(&delegator).unwrap();
    assert!(core.process_delegation(&request, None));

    core.on_new_block(maturity, [0u8; 32], 0);

    let entry = core.registry().get(&validator.key_id()).unwrap();
    let split = entry.split_block_reward(1_000);
    let distributed = core
        .delegation()
        .distribute_block_reward(&validator.key_id(), split.delegators);
    assert_eq!(distributed, split.delegators);
    assert_eq!(
        core.delegation()
            .pending_rewards_for_delegator(&delegator.key_id()),
        split.delegators
    );
}

/// S4: undelegating everything starts unbonding immediately, debits the
/// validator, and withdraws after the unbonding period.
#[test]
fn undelegate_all_walks_through_unbonding() {
    let params = ConsensusParams::regtest();
    let maturity = params.delegation_maturity;
    let unbonding = params.delegation_unbonding_period;
    let core = core_with(params.clone());

    let validator = register_validator(&core, params.min_validator_stake, 500, 0);
    let delegator = PrivateKey::random();
    let amount = 10_000 * COIN;

    let mut request = DelegationRequest::new(&delegator, validator.key_id(), amount, 0);
    request.sign(&delegator).unwrap();
    assert!(core.process_delegation(&request, None));

    core.on_new_block(maturity, [0u8; 32], 0);
    assert_eq!(
        core.registry().get(&validator.key_id()).unwrap().total_delegated,
        amount
    );

    // Undelegate everything at height H
    let undelegate_height = maturity + 10;
    core.on_new_block(undelegate_height, [0u8; 32], 0);
    let mut undelegation =
        UndelegationRequest::new(delegator.key_id(), validator.key_id(), 0, undelegate_height);
    undelegation.sign(&delegator).unwrap();
    assert!(core.process_undelegation(&undelegation));

    let delegations = core
        .delegation()
        .delegations_for_delegator(&delegator.key_id());
    assert_eq!(delegations.len(), 1);
    assert_eq!(delegations[0].status.as_str(), "unbonding");
    // The validator's delegated total is already gone
    assert_eq!(
        core.registry().get(&validator.key_id()).unwrap().total_delegated,
        0
    );

    // One block before the unbonding period ends: still unbonding
    core.on_new_block(undelegate_height + unbonding - 1, [0u8; 32], 0);
    assert_eq!(
        core.delegation()
            .delegations_for_delegator(&delegator.key_id())[0]
            .status
            .as_str(),
        "unbonding"
    );

    core.on_new_block(undelegate_height + unbonding, [0u8; 32], 0);
    assert_eq!(
        core.delegation()
            .delegations_for_delegator(&delegator.key_id())[0]
            .status
            .as_str(),
        "withdrawn"
    );
}

/// S5: a jailed validator cannot reactivate until the jail term ends.
#[test]
fn jail_blocks_reactivation_until_release() {
    let params = ConsensusParams::regtest();
    let maturity = params.delegation_maturity;
    let core = core_with(params.clone());

    let key = register_validator(&core, params.min_validator_stake, 0, 0);
    core.on_new_block(maturity, [0u8; 32], 0);

    let jail_height = maturity;
    assert!(core.jail_validator(&key.key_id(), Some(100)));
    assert_eq!(
        core.registry().get(&key.key_id()).unwrap().status,
        ValidatorStatus::Jailed
    );

    // Halfway through the term: rejected
    core.on_new_block(jail_height + 50, [0u8; 32], 0);
    let mut reactivate =
        ValidatorUpdate::new(key.key_id(), UpdateKind::Reactivate, 0, jail_height + 50);
    reactivate.sign(&key).unwrap();
    assert!(!core.process_validator_update(&reactivate));
    assert_eq!(
        core.registry().get(&key.key_id()).unwrap().status,
        ValidatorStatus::Jailed
    );

    // At the release height: accepted
    core.on_new_block(jail_height + 100, [0u8; 32], 0);
    let mut reactivate =
        ValidatorUpdate::new(key.key_id(), UpdateKind::Reactivate, 0, jail_height + 100);
    reactivate.sign(&key).unwrap();
    assert!(core.process_validator_update(&reactivate));
    assert_eq!(
        core.registry().get(&key.key_id()).unwrap().status,
        ValidatorStatus::Active
    );
    // Tier eligibility follows
    assert!(core.trust().get(&key.key_id()).unwrap().is_active);
}

/// S6: an exact duplicate heartbeat is dropped with no side effects.
#[test]
fn duplicate_heartbeat_is_dropped() {
    let params = ConsensusParams::regtest();
    let interval = params.heartbeat_interval;
    let core = core_with(params);

    let key = register_validator(&core, core.params().min_validator_stake, 0, 0);

    let mut heartbeat = Heartbeat::new(key.key_id(), interval, [3u8; 32], 1_700_000_000)
        .with_address("203.0.113.77:18888".parse().unwrap());
    heartbeat.sign(&key).unwrap();

    assert!(core.process_heartbeat(&heartbeat));
    let before = core.trust().get(&key.key_id()).unwrap();

    assert!(!core.process_heartbeat(&heartbeat));
    let after = core.trust().get(&key.key_id()).unwrap();
    assert_eq!(before, after);
    assert_eq!(core.heartbeats().stats().seen_heartbeats, 1);
}
