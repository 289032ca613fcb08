//! The top-level validator core context.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use veristake_config::{ConsensusParams, NodeConfig};
use veristake_crypto::PrivateKey;
use veristake_delegation::{DelegationId, DelegationLedger};
use veristake_heartbeat::HeartbeatManager;
use veristake_p2p::{PeerDiscovery, PeerPromotionSink};
use veristake_registry::{ValidatorEntry, ValidatorRegistry};
use veristake_rpc::{CoreDispatch, NodeRpc, RpcError, WalletRpc};
use veristake_trust::{TrustScoreEngine, TrustTier};
use veristake_types::{Amount, Hash, KeyId, OutPoint};
use veristake_wire::{
    DelegationRequest, Heartbeat, RewardClaimRequest, UndelegationRequest, ValidatorRegistration,
    ValidatorUpdate,
};

/// File name for the persisted validator registry.
const VALIDATORS_FILE: &str = "validators.dat";
/// File name for the persisted delegation ledger.
const DELEGATIONS_FILE: &str = "delegations.dat";

/// What a block reward works out to for one validator.
///
/// The block-producing engine turns this into coinbase outputs; the core
/// only does the arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRewardPlan {
    /// The validator's trust tier at computation time.
    pub tier: TrustTier,
    /// Tier reward multiplier in percent.
    pub multiplier: u32,
    /// Base reward after the tier multiplier.
    pub total_reward: Amount,
    /// Amount owed to the validator (stake share + pool fee).
    pub validator_payout: Amount,
    /// Amount owed collectively to delegators before distribution.
    pub delegators_share: Amount,
    /// Amount actually credited to delegations (floor-division dust stays
    /// with the validator's engine-side payout).
    pub distributed: Amount,
}

impl BlockRewardPlan {
    fn zero(tier: TrustTier) -> Self {
        Self {
            tier,
            multiplier: 0,
            total_reward: 0,
            validator_payout: 0,
            delegators_share: 0,
            distributed: 0,
        }
    }
}

/// Top-level context owning the validator core's five subsystems.
///
/// Constructed during node initialization once chain parameters are known;
/// every worker thread gets a reference. All cross-component orchestration
/// lives here so each component keeps exactly one leaf lock.
pub struct ValidatorCore {
    params: Arc<ConsensusParams>,
    registry: Arc<ValidatorRegistry>,
    trust: Arc<TrustScoreEngine>,
    delegation: Arc<DelegationLedger>,
    peers: Arc<PeerDiscovery>,
    heartbeats: Arc<HeartbeatManager>,
}

impl ValidatorCore {
    /// Build a core over validated consensus parameters.
    pub fn new(params: ConsensusParams) -> Result<Self> {
        params.validate().context("invalid consensus parameters")?;
        let params = Arc::new(params);

        let registry = Arc::new(ValidatorRegistry::new(Arc::clone(&params)));
        let trust = Arc::new(TrustScoreEngine::new(Arc::clone(&params)));
        let delegation = Arc::new(DelegationLedger::new(Arc::clone(&params)));
        let peers = Arc::new(PeerDiscovery::new());
        let heartbeats = Arc::new(HeartbeatManager::new(
            Arc::clone(&params),
            Arc::clone(&registry),
            Arc::clone(&trust),
            Arc::clone(&peers),
        ));

        Ok(Self {
            params,
            registry,
            trust,
            delegation,
            peers,
            heartbeats,
        })
    }

    /// Build a core from an operator config: parameters, peer file,
    /// validator key, and advertised address.
    pub fn from_config(config: &NodeConfig) -> Result<Self> {
        config.validate().context("invalid node configuration")?;
        let core = Self::new(config.consensus.clone())?;

        core.peers.set_config_path(config.peers_path());
        if let Err(e) = core.peers.load_peers_from_config() {
            warn!(error = %e, "Starting with empty peer set");
        }

        if config.is_validator() {
            let key = PrivateKey::from_hex(&config.validator_key)
                .context("invalid validator key in config")?;
            core.heartbeats.set_validator_key(key);
        }
        if !config.listen_address.is_empty() {
            match config.listen_address.parse() {
                Ok(address) => core.heartbeats.set_local_address(address),
                Err(e) => warn!(
                    address = %config.listen_address,
                    error = %e,
                    "Ignoring unparsable listen address"
                ),
            }
        }

        info!(validator = core.heartbeats.is_validator(), "Validator core initialized");
        Ok(core)
    }

    /// The bound consensus parameters.
    pub fn params(&self) -> &Arc<ConsensusParams> {
        &self.params
    }

    /// The validator registry.
    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    /// The trust score engine.
    pub fn trust(&self) -> &Arc<TrustScoreEngine> {
        &self.trust
    }

    /// The delegation ledger.
    pub fn delegation(&self) -> &Arc<DelegationLedger> {
        &self.delegation
    }

    /// The peer discovery sink.
    pub fn peers(&self) -> &Arc<PeerDiscovery> {
        &self.peers
    }

    /// The heartbeat manager.
    pub fn heartbeats(&self) -> &Arc<HeartbeatManager> {
        &self.heartbeats
    }

    /// Install the network-layer callback for peer promotion.
    pub fn set_promotion_sink(&self, sink: Arc<dyn PeerPromotionSink>) {
        self.heartbeats.set_promotion_sink(sink);
    }

    /// The node-side RPC query surface.
    pub fn node_rpc(&self) -> NodeRpc {
        NodeRpc::new(
            Arc::clone(&self.params),
            Arc::clone(&self.registry),
            Arc::clone(&self.trust),
            Arc::clone(&self.delegation),
        )
    }

    /// The wallet-side RPC surface for `key`'s owner.
    pub fn wallet_rpc(core: &Arc<Self>, key: PrivateKey) -> WalletRpc {
        WalletRpc::new(
            key,
            Arc::clone(&core.params),
            Arc::clone(&core.registry),
            Arc::clone(&core.trust),
            Arc::clone(&core.delegation),
            Arc::clone(core) as Arc<dyn CoreDispatch>,
        )
    }

    /// Block hook, called once per connected block by the (single)
    /// block-processing thread.
    ///
    /// Never fails the block: component-level rejections are logged and
    /// swallowed.
    pub fn on_new_block(&self, height: u64, block_hash: Hash, timestamp: i64) {
        self.registry.process_block(height);
        self.delegation.process_block(height, &self.registry);
        // Refresh expectations (and maybe broadcast our own heartbeat)
        self.heartbeats.on_new_block(height, block_hash, timestamp);
        self.trust.record_missed_check_ins(height);
        debug!(height, "Processed block");
    }

    /// Compute the tier-multiplied reward split for the validator minting
    /// a block, and credit the delegators' share to the ledger.
    ///
    /// An unknown or tier-less validator earns nothing.
    pub fn compute_block_reward(&self, validator_id: &KeyId, base_reward: Amount) -> BlockRewardPlan {
        let tier = self.trust.tier(validator_id);
        let multiplier = self.trust.reward_multiplier(validator_id);
        if multiplier == 0 {
            return BlockRewardPlan::zero(tier);
        }
        let Some(entry) = self.registry.get(validator_id) else {
            return BlockRewardPlan::zero(tier);
        };

        let total_reward = ((base_reward as u128 * multiplier as u128) / 100) as Amount;
        let split = entry.split_block_reward(total_reward);
        let distributed = self
            .delegation
            .distribute_block_reward(validator_id, split.delegators);

        debug!(
            validator = %validator_id,
            tier = %tier,
            total_reward,
            validator_payout = split.validator,
            distributed,
            "Computed block reward"
        );
        BlockRewardPlan {
            tier,
            multiplier,
            total_reward,
            validator_payout: split.validator,
            delegators_share: split.delegators,
            distributed,
        }
    }

    /// Network entry point: a heartbeat arrived from a peer.
    pub fn process_heartbeat(&self, heartbeat: &Heartbeat) -> bool {
        self.heartbeats.process_heartbeat(heartbeat)
    }

    /// Network entry point: a validator registration arrived from a peer.
    pub fn process_validator_registration(&self, registration: &ValidatorRegistration) -> bool {
        self.heartbeats.process_validator_registration(registration)
    }

    /// Network entry point: a signed validator update arrived.
    pub fn process_validator_update(&self, update: &ValidatorUpdate) -> bool {
        match self.registry.process_update(update) {
            Ok(()) => {
                self.mirror_update_into_trust(update);
                true
            }
            Err(e) => {
                debug!(validator = %update.validator_id, error = %e, "Rejected validator update");
                false
            }
        }
    }

    /// Network entry point: a delegation request arrived.
    pub fn process_delegation(
        &self,
        request: &DelegationRequest,
        outpoint: Option<OutPoint>,
    ) -> bool {
        match self
            .delegation
            .process_delegation(request, outpoint, &self.registry)
        {
            Ok(_) => true,
            Err(e) => {
                debug!(delegator = %request.delegator_id, error = %e, "Rejected delegation");
                false
            }
        }
    }

    /// Network entry point: an undelegation request arrived.
    pub fn process_undelegation(&self, request: &UndelegationRequest) -> bool {
        match self.delegation.process_undelegation(request, &self.registry) {
            Ok(_) => true,
            Err(e) => {
                debug!(delegator = %request.delegator_id, error = %e, "Rejected undelegation");
                false
            }
        }
    }

    /// Network entry point: a reward claim arrived.
    pub fn process_reward_claim(&self, request: &RewardClaimRequest) -> bool {
        match self.delegation.process_reward_claim(request) {
            Ok(_) => true,
            Err(e) => {
                debug!(delegator = %request.delegator_id, error = %e, "Rejected reward claim");
                false
            }
        }
    }

    /// External signal: jail a misbehaving validator.
    pub fn jail_validator(&self, validator_id: &KeyId, jail_blocks: Option<u64>) -> bool {
        let blocks = jail_blocks.unwrap_or(self.params.default_jail_blocks);
        match self.registry.jail_validator(validator_id, blocks) {
            Ok(()) => {
                self.trust.set_active(validator_id, false);
                true
            }
            Err(e) => {
                debug!(validator = %validator_id, error = %e, "Jail request rejected");
                false
            }
        }
    }

    // Registry updates that change stake, fee, or active-ness are mirrored
    // into the trust engine so tier eligibility tracks the registry.
    fn mirror_update_into_trust(&self, update: &ValidatorUpdate) {
        use veristake_wire::UpdateKind;

        let id = &update.validator_id;
        match update.kind {
            UpdateKind::UpdateFee => {
                self.trust.update_pool_fee(id, update.new_value as u16);
            }
            UpdateKind::IncreaseStake | UpdateKind::DecreaseStake => {
                if let Some(entry) = self.registry.get(id) {
                    self.trust.update_stake(id, entry.self_stake);
                }
            }
            UpdateKind::Deactivate => {
                self.trust.set_active(id, false);
            }
            UpdateKind::Reactivate => {
                self.trust.set_active(id, true);
            }
            UpdateKind::UpdateName => {}
        }
    }

    /// Persist the registry, the ledger, and the peer file under `dir`.
    pub fn save_state(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating state dir {}", dir.display()))?;

        let validators_path = dir.join(VALIDATORS_FILE);
        std::fs::write(&validators_path, self.registry.encode())
            .with_context(|| format!("writing {}", validators_path.display()))?;

        let delegations_path = dir.join(DELEGATIONS_FILE);
        std::fs::write(&delegations_path, self.delegation.encode())
            .with_context(|| format!("writing {}", delegations_path.display()))?;

        if self.peers.config_path().is_some() {
            if let Err(e) = self.peers.save_peers_to_config() {
                // Peer persistence is best-effort
                warn!(error = %e, "Could not save peer config");
            }
        }

        info!(dir = %dir.display(), "Saved validator core state");
        Ok(())
    }

    /// Restore the registry and ledger from `dir`, where files exist.
    pub fn load_state(&self, dir: &Path) -> Result<()> {
        let validators_path = dir.join(VALIDATORS_FILE);
        if validators_path.exists() {
            let bytes = std::fs::read(&validators_path)
                .with_context(|| format!("reading {}", validators_path.display()))?;
            self.registry
                .decode(&bytes)
                .context("decoding validator registry")?;

            // Rebuild the trust engine's view from the restored registry
            for entry in self.registry.all_validators() {
                self.trust.register_validator(
                    entry.validator_id,
                    entry.self_stake,
                    entry.pool_fee_bps,
                    entry.registration_height,
                );
            }
        }

        let delegations_path = dir.join(DELEGATIONS_FILE);
        if delegations_path.exists() {
            let bytes = std::fs::read(&delegations_path)
                .with_context(|| format!("reading {}", delegations_path.display()))?;
            self.delegation
                .decode(&bytes)
                .context("decoding delegation ledger")?;
        }

        info!(dir = %dir.display(), "Loaded validator core state");
        Ok(())
    }
}

// The wallet RPC's write path routes through the same processing the
// network messages take.
impl CoreDispatch for ValidatorCore {
    fn submit_registration(&self, registration: &ValidatorRegistration) -> Result<(), RpcError> {
        if !registration.verify() {
            return Err(RpcError::InvalidParams("bad registration signature".into()));
        }
        if registration.stake_amount < self.params.min_validator_stake {
            return Err(RpcError::InvalidParams(format!(
                "stake {} below minimum {}",
                registration.stake_amount, self.params.min_validator_stake
            )));
        }
        self.registry
            .register(ValidatorEntry::from_registration(registration))?;
        self.trust.register_validator(
            registration.validator_id(),
            registration.stake_amount,
            registration.pool_fee_bps,
            registration.registration_height,
        );
        Ok(())
    }

    fn submit_update(&self, update: &ValidatorUpdate) -> Result<(), RpcError> {
        self.registry.process_update(update)?;
        self.mirror_update_into_trust(update);
        Ok(())
    }

    fn submit_delegation(
        &self,
        request: &DelegationRequest,
        outpoint: Option<OutPoint>,
    ) -> Result<DelegationId, RpcError> {
        Ok(self
            .delegation
            .process_delegation(request, outpoint, &self.registry)?)
    }

    fn submit_undelegation(&self, request: &UndelegationRequest) -> Result<u64, RpcError> {
        Ok(self
            .delegation
            .process_undelegation(request, &self.registry)?)
    }

    fn submit_reward_claim(&self, request: &RewardClaimRequest) -> Result<u64, RpcError> {
        Ok(self.delegation.process_reward_claim(request)?)
    }

    fn current_height(&self) -> u64 {
        self.registry.current_height()
    }
}
