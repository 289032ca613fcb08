//! # VeriStake Trust
//!
//! Heartbeat-driven trust scoring for validators.
//!
//! The [`TrustScoreEngine`] tracks, per validator, how many heartbeats were
//! expected against how many arrived across a rolling window, derives an
//! uptime percentage from the two counters, and classifies each validator
//! into a discrete [`TrustTier`] that scales its block rewards:
//!
//! ```text
//! uptime (tenths of %)   tier       typical multiplier
//! ─────────────────────────────────────────────────────
//!        ≥ 999           Platinum   200% (2.0x)
//!        ≥ 990           Gold       150% (1.5x)
//!        ≥ 970           Silver     120% (1.2x)
//!        ≥ 950           Bronze     100% (1.0x)
//!        below           None       0%  (ineligible)
//! ```
//!
//! The engine also records the network address each heartbeat was sent
//! from, feeding the auto-peer-discovery layer.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod engine;
pub mod tier;

pub use engine::{TrustScoreEngine, UptimeRecord};
pub use tier::TrustTier;
