//! The write path from RPC into the core.

use veristake_delegation::DelegationId;
use veristake_types::OutPoint;
use veristake_wire::{
    DelegationRequest, RewardClaimRequest, UndelegationRequest, ValidatorRegistration,
    ValidatorUpdate,
};

use crate::Result;

/// Seam between wallet-side RPC and the node's core context.
///
/// The wallet layer builds and signs messages; the dispatcher routes them
/// through the same processing pipeline network messages take, so an RPC
/// submission and a gossiped message are indistinguishable to the core.
pub trait CoreDispatch: Send + Sync {
    /// Submit a signed validator registration.
    fn submit_registration(&self, registration: &ValidatorRegistration) -> Result<()>;

    /// Submit a signed validator update.
    fn submit_update(&self, update: &ValidatorUpdate) -> Result<()>;

    /// Submit a signed delegation request backed by `outpoint`.
    fn submit_delegation(
        &self,
        request: &DelegationRequest,
        outpoint: Option<OutPoint>,
    ) -> Result<DelegationId>;

    /// Submit a signed undelegation request; returns the amount unbonding.
    fn submit_undelegation(&self, request: &UndelegationRequest) -> Result<u64>;

    /// Submit a signed reward claim; returns the amount claimed.
    fn submit_reward_claim(&self, request: &RewardClaimRequest) -> Result<u64>;

    /// The chain height messages should be stamped with.
    fn current_height(&self) -> u64;
}
