//! # VeriStake P2P
//!
//! Auto-peer-discovery sink for validator addresses.
//!
//! Heartbeats carry the sender's reachable address. Once a heartbeat
//! validates, its address lands here: new addresses are remembered,
//! queued for promotion to persistent peers, and written to a plain
//! `addnode=ip:port` config file that survives restarts.
//!
//! The [`PeerPromotionSink`] trait is the seam to the network layer: the
//! heartbeat manager pushes fresh addresses through it instead of holding
//! a reference back into networking code.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod discovery;

pub use discovery::{PeerDiscovery, PeerFileError, PeerPromotionSink};
