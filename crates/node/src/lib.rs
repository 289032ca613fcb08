//! # VeriStake
//!
//! Trust-tiered proof-of-stake validator core.
//!
//! VeriStake manages a population of stake-backed validators, tracks their
//! liveness through signed periodic heartbeats, classifies each into a
//! discrete trust tier based on measured uptime, lets token holders
//! delegate stake to validators with proportional reward splitting, and
//! computes tier-multiplied block rewards. Heartbeat-carried addresses
//! feed an auto-peer-discovery layer that promotes reachable validators
//! to persistent peers.
//!
//! ## Components
//!
//! - [`ValidatorCore`] - top-level context owning the five subsystems
//! - `veristake-registry` - the authoritative validator table
//! - `veristake-trust` - heartbeat uptime scoring and tiers
//! - `veristake-delegation` - the delegated-stake ledger
//! - `veristake-p2p` - the peer discovery sink
//! - `veristake-heartbeat` - heartbeat orchestration and replay protection
//!
//! ## Example
//!
//! ```rust
//! use veristake::ValidatorCore;
//! use veristake_config::ConsensusParams;
//!
//! let core = ValidatorCore::new(ConsensusParams::regtest()).unwrap();
//!
//! // The block-processing thread drives every lifecycle from one hook
//! core.on_new_block(1, [0u8; 32], 1_700_000_000);
//! assert_eq!(core.registry().current_height(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod core;

pub use crate::core::{BlockRewardPlan, ValidatorCore};

// The crates a node embedding this core will want in scope.
pub use veristake_config::{ConsensusParams, NodeConfig};
pub use veristake_registry::{ValidatorEntry, ValidatorRegistry, ValidatorStatus};
pub use veristake_trust::{TrustScoreEngine, TrustTier};
