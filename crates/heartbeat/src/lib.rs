//! # VeriStake Heartbeat
//!
//! The orchestration layer between the network and the validator core.
//!
//! The [`HeartbeatManager`] owns this node's validator key (if any),
//! decides when to sign and broadcast heartbeats, deduplicates incoming
//! heartbeats by hash, and dispatches validated messages into the
//! registry, the trust score engine, and the peer discovery sink.
//!
//! ```text
//! network ──▶ HeartbeatManager ──▶ registry (pubkey lookup, registrations)
//!                    │
//!                    ├──▶ trust engine (liveness + address)
//!                    └──▶ peer sink ──▶ promotion callback
//! ```
//!
//! Replay protection is a two-generation seen-set bounded at
//! [`MAX_SEEN_HEARTBEATS`](seen::MAX_SEEN_HEARTBEATS) hashes: when the
//! current generation fills, it becomes the previous generation and the
//! oldest half of history drops in one swap.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod manager;
pub mod seen;

pub use manager::{HeartbeatManager, HeartbeatStats};
pub use seen::SeenHeartbeats;
