//! # VeriStake RPC
//!
//! RPC semantics for the validator core.
//!
//! Transport framing is a collaborator's concern; this crate defines what
//! the methods *mean*: parameter validation, the queries they run against
//! the registry / trust engine / delegation ledger, the shape of their
//! JSON responses, and the error codes they fail with.
//!
//! - [`NodeRpc`] - node-side read-only queries (`listvalidators`,
//!   `getvalidator`, `getvalidatorstats`, `listdelegations`,
//!   `getpendingrewards`, `gettrusttierinfo`)
//! - [`WalletRpc`] - wallet-side operations that sign messages with the
//!   wallet's key and submit them through a [`CoreDispatch`]
//!   (`registervalidator`, `setvalidatorpoolfee`, `delegatestake`,
//!   `undelegatestake`, `claimrewards`, `getmydelegations`,
//!   `getmyvalidator`)

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod dispatch;
pub mod error;
pub mod node;
pub mod types;
pub mod wallet;

pub use dispatch::CoreDispatch;
pub use error::RpcError;
pub use node::NodeRpc;
pub use types::{
    RpcDelegationInfo, RpcPendingRewards, RpcTrustTierInfo, RpcValidatorInfo, RpcValidatorStats,
    TierCounts,
};
pub use wallet::WalletRpc;

/// Result type alias for RPC operations.
pub type Result<T> = std::result::Result<T, RpcError>;
