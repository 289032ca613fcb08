//! Trust tier classification.

use serde::{Deserialize, Serialize};
use veristake_config::ConsensusParams;

/// Discrete trust classification derived from measured heartbeat uptime.
///
/// Ordered: `None < Bronze < Silver < Gold < Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrustTier {
    /// Below minimum requirements; earns no rewards.
    None,
    /// 95.0%+ uptime.
    Bronze,
    /// 97.0%+ uptime.
    Silver,
    /// 99.0%+ uptime.
    Gold,
    /// 99.9%+ uptime.
    Platinum,
}

impl TrustTier {
    /// Uppercase tier name, as exposed over RPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustTier::None => "NONE",
            TrustTier::Bronze => "BRONZE",
            TrustTier::Silver => "SILVER",
            TrustTier::Gold => "GOLD",
            TrustTier::Platinum => "PLATINUM",
        }
    }

    /// Classify an uptime measured in tenths of a percent.
    ///
    /// Highest tier first; anything below the bronze threshold is `None`.
    pub fn from_uptime(uptime_x10: u32, params: &ConsensusParams) -> Self {
        if uptime_x10 >= params.platinum_uptime_threshold {
            TrustTier::Platinum
        } else if uptime_x10 >= params.gold_uptime_threshold {
            TrustTier::Gold
        } else if uptime_x10 >= params.silver_uptime_threshold {
            TrustTier::Silver
        } else if uptime_x10 >= params.bronze_uptime_threshold {
            TrustTier::Bronze
        } else {
            TrustTier::None
        }
    }

    /// The reward multiplier for this tier, in percent (100 = 1.0x).
    ///
    /// `None` earns nothing.
    pub fn reward_multiplier(&self, params: &ConsensusParams) -> u32 {
        match self {
            TrustTier::None => 0,
            TrustTier::Bronze => params.bronze_reward_multiplier,
            TrustTier::Silver => params.silver_reward_multiplier,
            TrustTier::Gold => params.gold_reward_multiplier,
            TrustTier::Platinum => params.platinum_reward_multiplier,
        }
    }
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
