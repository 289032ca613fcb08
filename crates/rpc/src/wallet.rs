//! Wallet-side RPC operations.
//!
//! Each operation builds the corresponding wire message, signs it with the
//! wallet's key, and submits it through the [`CoreDispatch`] so it follows
//! the same path a network-received message would.

use std::sync::Arc;

use tracing::info;
use veristake_config::ConsensusParams;
use veristake_crypto::PrivateKey;
use veristake_delegation::DelegationLedger;
use veristake_registry::ValidatorRegistry;
use veristake_trust::TrustScoreEngine;
use veristake_types::{KeyId, OutPoint};
use veristake_wire::{
    DelegationRequest, RewardClaimRequest, UndelegationRequest, UpdateKind, ValidatorRegistration,
    ValidatorUpdate,
};

use crate::dispatch::CoreDispatch;
use crate::error::RpcError;
use crate::node::NodeRpc;
use crate::types::{RpcDelegationInfo, RpcValidatorInfo};
use crate::Result;

fn parse_key_id(param: &str) -> Result<KeyId> {
    KeyId::from_hex(param).map_err(|_| RpcError::InvalidParams(format!("bad key id '{param}'")))
}

/// Wallet-facing operation surface.
///
/// Owns the wallet key; reads go straight to the components, writes go
/// through the dispatcher.
pub struct WalletRpc {
    key: PrivateKey,
    params: Arc<ConsensusParams>,
    registry: Arc<ValidatorRegistry>,
    delegation: Arc<DelegationLedger>,
    dispatch: Arc<dyn CoreDispatch>,
    queries: NodeRpc,
}

impl WalletRpc {
    /// Wire the wallet surface for `key`'s owner.
    pub fn new(
        key: PrivateKey,
        params: Arc<ConsensusParams>,
        registry: Arc<ValidatorRegistry>,
        trust: Arc<TrustScoreEngine>,
        delegation: Arc<DelegationLedger>,
        dispatch: Arc<dyn CoreDispatch>,
    ) -> Self {
        let queries = NodeRpc::new(
            Arc::clone(&params),
            Arc::clone(&registry),
            Arc::clone(&trust),
            Arc::clone(&delegation),
        );
        Self {
            key,
            params,
            registry,
            delegation,
            dispatch,
            queries,
        }
    }

    /// The wallet's key id.
    pub fn wallet_id(&self) -> KeyId {
        self.key.key_id()
    }

    fn sign_error(e: impl std::fmt::Display) -> RpcError {
        RpcError::Internal(format!("signing failed: {e}"))
    }

    /// `registervalidator(stake, outpoint?, fee_bps?, name?)`
    ///
    /// Registers this wallet as a validator. The stake amount references
    /// funds the wallet has locked in `outpoint`; the fee defaults to 0.
    /// A name, when given, is applied with a follow-up signed update.
    pub fn register_validator(
        &self,
        stake_amount: u64,
        outpoint: Option<OutPoint>,
        fee_bps: Option<u16>,
        name: Option<String>,
    ) -> Result<String> {
        let fee = fee_bps.unwrap_or(0);
        if fee > self.params.max_pool_fee {
            return Err(RpcError::InvalidParams(format!(
                "pool fee {fee} above maximum {}",
                self.params.max_pool_fee
            )));
        }
        if let Some(ref name) = name {
            if name.len() > self.params.max_validator_name {
                return Err(RpcError::InvalidParams(format!(
                    "name exceeds {} bytes",
                    self.params.max_validator_name
                )));
            }
        }

        let height = self.dispatch.current_height();
        let mut registration =
            ValidatorRegistration::new(self.key.public_key(), stake_amount, fee, height);
        registration.sign(&self.key).map_err(Self::sign_error)?;
        self.dispatch.submit_registration(&registration)?;

        let validator_id = registration.validator_id();
        if let Some(outpoint) = outpoint {
            self.registry
                .update_stake_outpoint(&validator_id, Some(outpoint))?;
        }
        if let Some(name) = name {
            let mut update = ValidatorUpdate::rename(validator_id, name, height);
            update.sign(&self.key).map_err(Self::sign_error)?;
            self.dispatch.submit_update(&update)?;
        }

        info!(validator = %validator_id, stake = stake_amount, "Wallet registered as validator");
        Ok(validator_id.to_string())
    }

    /// `setvalidatorpoolfee(fee_bps)`
    pub fn set_validator_pool_fee(&self, fee_bps: u16) -> Result<()> {
        let validator_id = self.wallet_id();
        if self.registry.get(&validator_id).is_none() {
            return Err(RpcError::WalletNotConfigured(
                "wallet is not a registered validator".to_string(),
            ));
        }

        let mut update = ValidatorUpdate::new(
            validator_id,
            UpdateKind::UpdateFee,
            fee_bps as i64,
            self.dispatch.current_height(),
        );
        update.sign(&self.key).map_err(Self::sign_error)?;
        self.dispatch.submit_update(&update)
    }

    /// `delegatestake(validator_id, amount, outpoint?)`
    pub fn delegate_stake(
        &self,
        validator_id: &str,
        amount: u64,
        outpoint: Option<OutPoint>,
    ) -> Result<String> {
        let validator_id = parse_key_id(validator_id)?;
        let mut request = DelegationRequest::new(
            &self.key,
            validator_id,
            amount,
            self.dispatch.current_height(),
        );
        request.sign(&self.key).map_err(Self::sign_error)?;
        let id = self.dispatch.submit_delegation(&request, outpoint)?;
        Ok(hex::encode(id))
    }

    /// `undelegatestake(validator_id, amount?)` - amount omitted or 0
    /// withdraws everything.
    pub fn undelegate_stake(&self, validator_id: &str, amount: Option<u64>) -> Result<u64> {
        let validator_id = parse_key_id(validator_id)?;
        let mut request = UndelegationRequest::new(
            self.wallet_id(),
            validator_id,
            amount.unwrap_or(0),
            self.dispatch.current_height(),
        );
        request.sign(&self.key).map_err(Self::sign_error)?;
        self.dispatch.submit_undelegation(&request)
    }

    /// `claimrewards(validator_id?)`
    pub fn claim_rewards(&self, validator_id: Option<&str>) -> Result<u64> {
        let validator_id = validator_id.map(parse_key_id).transpose()?;
        let mut request = RewardClaimRequest::new(
            self.wallet_id(),
            validator_id,
            self.dispatch.current_height(),
        );
        request.sign(&self.key).map_err(Self::sign_error)?;
        self.dispatch.submit_reward_claim(&request)
    }

    /// `getmydelegations()`
    pub fn get_my_delegations(&self) -> Vec<RpcDelegationInfo> {
        self.delegation
            .delegations_for_delegator(&self.wallet_id())
            .iter()
            .map(RpcDelegationInfo::from)
            .collect()
    }

    /// `getmyvalidator()`
    pub fn get_my_validator(&self) -> Result<RpcValidatorInfo> {
        self.queries.get_validator(&self.wallet_id().to_string())
    }
}
