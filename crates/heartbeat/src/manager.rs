//! The heartbeat manager.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};
use veristake_config::ConsensusParams;
use veristake_crypto::PrivateKey;
use veristake_p2p::{PeerDiscovery, PeerPromotionSink};
use veristake_registry::{ValidatorEntry, ValidatorRegistry};
use veristake_trust::TrustScoreEngine;
use veristake_types::{Hash, KeyId};
use veristake_wire::{Heartbeat, ValidatorRegistration};

use crate::seen::SeenHeartbeats;

/// Point-in-time counters for logging and RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatStats {
    /// Whether this node holds a validator key.
    pub is_validator: bool,
    /// Height of the last heartbeat we broadcast.
    pub last_heartbeat_height: u64,
    /// Hashes in the replay cache.
    pub seen_heartbeats: usize,
    /// Heartbeats queued for the network layer.
    pub outbound_queued: usize,
}

struct Inner {
    validator_key: Option<PrivateKey>,
    last_heartbeat_height: u64,
    local_address: Option<SocketAddr>,
    seen: SeenHeartbeats,
    outbound: Vec<Heartbeat>,
}

/// Orchestrates heartbeat traffic between the network layer and the core.
///
/// Holds its own lock for broadcast state and the replay cache; calls into
/// the registry, trust engine, and peer sink only with that lock released,
/// so the component lock order stays strictly downward.
pub struct HeartbeatManager {
    params: Arc<ConsensusParams>,
    registry: Arc<ValidatorRegistry>,
    trust: Arc<TrustScoreEngine>,
    peers: Arc<PeerDiscovery>,
    promotion: Mutex<Option<Arc<dyn PeerPromotionSink>>>,
    inner: Mutex<Inner>,
}

impl HeartbeatManager {
    /// Wire up the manager against its collaborators.
    pub fn new(
        params: Arc<ConsensusParams>,
        registry: Arc<ValidatorRegistry>,
        trust: Arc<TrustScoreEngine>,
        peers: Arc<PeerDiscovery>,
    ) -> Self {
        Self {
            params,
            registry,
            trust,
            peers,
            promotion: Mutex::new(None),
            inner: Mutex::new(Inner {
                validator_key: None,
                last_heartbeat_height: 0,
                local_address: None,
                seen: SeenHeartbeats::new(),
                outbound: Vec::new(),
            }),
        }
    }

    /// Install the callback that promotes fresh peers to persistent
    /// connections. Without one, discovered peers stay queued in the sink.
    pub fn set_promotion_sink(&self, sink: Arc<dyn PeerPromotionSink>) {
        *self.promotion.lock() = Some(sink);
    }

    /// Become a validator with the given key.
    pub fn set_validator_key(&self, key: PrivateKey) {
        let mut inner = self.inner.lock();
        info!(validator = %key.key_id(), "Configured as validator");
        inner.validator_key = Some(key);
    }

    /// Set the address advertised in our heartbeats.
    pub fn set_local_address(&self, address: SocketAddr) {
        self.inner.lock().local_address = Some(address);
    }

    /// Whether this node holds a validator key.
    pub fn is_validator(&self) -> bool {
        self.inner.lock().validator_key.is_some()
    }

    /// Our validator id, if we are one.
    pub fn validator_id(&self) -> Option<KeyId> {
        self.inner.lock().validator_key.as_ref().map(|k| k.key_id())
    }

    /// Whether a heartbeat is due at `height`.
    ///
    /// True on heartbeat boundaries (`height % interval == 0`) once at
    /// least one full interval has passed since our last broadcast.
    pub fn should_broadcast_heartbeat(&self, height: u64) -> bool {
        let inner = self.inner.lock();
        if inner.validator_key.is_none() {
            return false;
        }
        let interval = self.params.heartbeat_interval;
        if height.saturating_sub(inner.last_heartbeat_height) < interval {
            return false;
        }
        height % interval == 0
    }

    /// Construct, sign, and queue our heartbeat for the current tip.
    ///
    /// Records the heartbeat's own hash in the replay cache so the network
    /// echoing it back is a no-op.
    pub fn broadcast_heartbeat(&self, height: u64, block_hash: Hash, timestamp: i64) -> bool {
        let mut inner = self.inner.lock();
        let Some(key) = inner.validator_key.clone() else {
            return false;
        };

        let mut heartbeat = Heartbeat::new(key.key_id(), height, block_hash, timestamp);
        if let Some(address) = inner.local_address {
            heartbeat = heartbeat.with_address(address);
        }
        if let Err(e) = heartbeat.sign(&key) {
            warn!(error = %e, "Failed to sign heartbeat");
            return false;
        }

        inner.seen.insert(heartbeat.message_id());
        inner.last_heartbeat_height = height;
        info!(
            height,
            address = %heartbeat.address_string(),
            "Queued heartbeat broadcast"
        );
        inner.outbound.push(heartbeat);
        true
    }

    /// Drain heartbeats queued for the network layer.
    pub fn take_outbound(&self) -> Vec<Heartbeat> {
        std::mem::take(&mut self.inner.lock().outbound)
    }

    /// Handle a heartbeat received from the network.
    ///
    /// Replays are dropped silently. The signature is verified against the
    /// registry's public key for the claimed validator, then liveness and
    /// the carried address are recorded, and a previously unseen address
    /// is promoted to a persistent peer.
    pub fn process_heartbeat(&self, heartbeat: &Heartbeat) -> bool {
        let message_id = heartbeat.message_id();
        {
            let mut inner = self.inner.lock();
            if !inner.seen.insert(message_id) {
                trace!(
                    heartbeat = %hex::encode(&message_id[..8]),
                    "Dropping replayed heartbeat"
                );
                return false;
            }
        }

        let Some(pubkey) = self.registry.pubkey(&heartbeat.validator_id) else {
            debug!(validator = %heartbeat.validator_id, "Heartbeat from unregistered validator");
            return false;
        };
        if !heartbeat.verify(&pubkey) {
            warn!(validator = %heartbeat.validator_id, "Heartbeat signature invalid");
            return false;
        }

        if !self
            .trust
            .process_heartbeat(&heartbeat.validator_id, heartbeat.block_height)
        {
            debug!(
                validator = %heartbeat.validator_id,
                height = heartbeat.block_height,
                "Trust engine rejected heartbeat"
            );
            return false;
        }

        if let Some(address) = heartbeat.node_address {
            self.trust.update_validator_address(
                &heartbeat.validator_id,
                address,
                heartbeat.timestamp,
            );

            if self
                .peers
                .process_validator_address(address, &heartbeat.validator_id)
            {
                let sink = self.promotion.lock().clone();
                if let Some(sink) = sink {
                    info!(address = %address, "Auto-adding validator peer");
                    sink.add_persistent_peer(address);
                    self.peers.mark_peer_added(&address);
                }
            }
        }

        debug!(
            validator = %heartbeat.validator_id,
            height = heartbeat.block_height,
            "Processed heartbeat"
        );
        true
    }

    /// Handle a validator registration received from the network.
    ///
    /// Verifies the self-certifying signature and the stake floor, then
    /// registers the validator in the registry and mirrors it into the
    /// trust engine.
    pub fn process_validator_registration(&self, registration: &ValidatorRegistration) -> bool {
        if !registration.verify() {
            warn!("Validator registration signature invalid");
            return false;
        }
        if registration.stake_amount < self.params.min_validator_stake {
            debug!(
                stake = registration.stake_amount,
                minimum = self.params.min_validator_stake,
                "Registration below stake floor"
            );
            return false;
        }

        let validator_id = registration.validator_id();
        if let Err(e) = self
            .registry
            .register(ValidatorEntry::from_registration(registration))
        {
            debug!(validator = %validator_id, error = %e, "Registry rejected registration");
            return false;
        }
        self.trust.register_validator(
            validator_id,
            registration.stake_amount,
            registration.pool_fee_bps,
            registration.registration_height,
        );

        info!(
            validator = %validator_id,
            stake = registration.stake_amount,
            "Processed validator registration"
        );
        true
    }

    /// Build a signed registration for this node's key.
    pub fn create_registration(
        &self,
        stake_amount: u64,
        pool_fee_bps: u16,
        height: u64,
    ) -> Option<ValidatorRegistration> {
        let key = self.inner.lock().validator_key.clone()?;
        let mut registration =
            ValidatorRegistration::new(key.public_key(), stake_amount, pool_fee_bps, height);
        if let Err(e) = registration.sign(&key) {
            warn!(error = %e, "Failed to sign registration");
            return None;
        }
        Some(registration)
    }

    /// Block hook: refresh heartbeat expectations and broadcast when due.
    pub fn on_new_block(&self, height: u64, block_hash: Hash, timestamp: i64) {
        self.trust.update_heartbeat_expectations(height);

        if self.should_broadcast_heartbeat(height) {
            self.broadcast_heartbeat(height, block_hash, timestamp);
        }
    }

    /// Current counters for logging and RPC.
    pub fn stats(&self) -> HeartbeatStats {
        let inner = self.inner.lock();
        HeartbeatStats {
            is_validator: inner.validator_key.is_some(),
            last_heartbeat_height: inner.last_heartbeat_height,
            seen_heartbeats: inner.seen.len(),
            outbound_queued: inner.outbound.len(),
        }
    }
}
