//! Consensus parameter binding.
//!
//! A read-only bundle of per-network constants, injected into the registry,
//! trust engine, and delegation ledger at construction. Changing any of
//! these on a live network is a consensus break.

use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Base units per whole coin.
const COIN: u64 = 100_000_000;

/// Per-network consensus parameters for the validator core.
///
/// Uptime thresholds are expressed in tenths of a percent (950 = 95.0%),
/// reward multipliers in percent (150 = 1.5x), pool fees in basis points
/// (10000 = 100%), and every duration in blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsensusParams {
    /// Minimum self-stake to register as a validator, in base units.
    pub min_validator_stake: u64,
    /// Minimum amount for a single delegation, in base units.
    pub min_delegation_amount: u64,

    /// Blocks between heartbeats from each validator.
    pub heartbeat_interval: u64,
    /// Rolling window over which uptime is measured, in blocks.
    pub uptime_window: u64,

    /// Bronze tier uptime threshold, tenths of a percent.
    pub bronze_uptime_threshold: u32,
    /// Silver tier uptime threshold, tenths of a percent.
    pub silver_uptime_threshold: u32,
    /// Gold tier uptime threshold, tenths of a percent.
    pub gold_uptime_threshold: u32,
    /// Platinum tier uptime threshold, tenths of a percent.
    pub platinum_uptime_threshold: u32,

    /// Bronze tier reward multiplier, percent (100 = 1.0x).
    pub bronze_reward_multiplier: u32,
    /// Silver tier reward multiplier, percent.
    pub silver_reward_multiplier: u32,
    /// Gold tier reward multiplier, percent.
    pub gold_reward_multiplier: u32,
    /// Platinum tier reward multiplier, percent.
    pub platinum_reward_multiplier: u32,

    /// Blocks a registration or delegation waits before becoming active.
    pub delegation_maturity: u64,
    /// Blocks a deactivating validator spends unbonding.
    pub unbonding_period: u64,
    /// Blocks a withdrawing delegation spends unbonding.
    pub delegation_unbonding_period: u64,
    /// Default jail duration in blocks when no explicit term is given.
    pub default_jail_blocks: u64,

    /// Minimum pool fee in basis points.
    pub min_pool_fee: u16,
    /// Maximum pool fee in basis points.
    pub max_pool_fee: u16,
    /// Maximum validator name length in bytes.
    pub max_validator_name: usize,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl ConsensusParams {
    /// Parameters of the primary network.
    pub fn mainnet() -> Self {
        Self {
            min_validator_stake: 100_000 * COIN,
            min_delegation_amount: 1_000 * COIN,
            heartbeat_interval: 100,
            uptime_window: 100_000,
            bronze_uptime_threshold: 950,
            silver_uptime_threshold: 970,
            gold_uptime_threshold: 990,
            platinum_uptime_threshold: 999,
            bronze_reward_multiplier: 100,
            silver_reward_multiplier: 120,
            gold_reward_multiplier: 150,
            platinum_reward_multiplier: 200,
            delegation_maturity: 500,
            unbonding_period: 259_200,
            delegation_unbonding_period: 259_200,
            default_jail_blocks: 86_400,
            min_pool_fee: 0,
            max_pool_fee: 10_000,
            max_validator_name: 64,
        }
    }

    /// Small-scale parameters for local regression testing.
    ///
    /// Short intervals so lifecycle transitions fit into unit tests.
    pub fn regtest() -> Self {
        Self {
            min_validator_stake: 100 * COIN,
            min_delegation_amount: COIN,
            heartbeat_interval: 10,
            uptime_window: 1_000,
            delegation_maturity: 5,
            unbonding_period: 20,
            delegation_unbonding_period: 20,
            default_jail_blocks: 10,
            ..Self::mainnet()
        }
    }

    /// Validate internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.min_validator_stake == 0 {
            return Err(ConfigError::InvalidMinStake);
        }
        if self.min_delegation_amount == 0 {
            return Err(ConfigError::InvalidMinDelegation);
        }
        if self.heartbeat_interval == 0 {
            return Err(ConfigError::InvalidHeartbeatInterval(self.heartbeat_interval));
        }
        if self.uptime_window < self.heartbeat_interval {
            return Err(ConfigError::InvalidUptimeWindow {
                window: self.uptime_window,
                interval: self.heartbeat_interval,
            });
        }

        for (name, value) in [
            ("bronze_uptime_threshold", self.bronze_uptime_threshold),
            ("silver_uptime_threshold", self.silver_uptime_threshold),
            ("gold_uptime_threshold", self.gold_uptime_threshold),
            ("platinum_uptime_threshold", self.platinum_uptime_threshold),
        ] {
            if value > 1000 {
                return Err(ConfigError::ThresholdOutOfRange { name, value });
            }
        }
        if self.bronze_uptime_threshold >= self.silver_uptime_threshold {
            return Err(ConfigError::NonMonotonicThresholds("bronze/silver"));
        }
        if self.silver_uptime_threshold >= self.gold_uptime_threshold {
            return Err(ConfigError::NonMonotonicThresholds("silver/gold"));
        }
        if self.gold_uptime_threshold >= self.platinum_uptime_threshold {
            return Err(ConfigError::NonMonotonicThresholds("gold/platinum"));
        }

        if self.min_pool_fee > self.max_pool_fee || self.max_pool_fee > 10_000 {
            return Err(ConfigError::InvalidPoolFeeBounds {
                min: self.min_pool_fee,
                max: self.max_pool_fee,
            });
        }

        for (name, value) in [
            ("delegation_maturity", self.delegation_maturity),
            ("unbonding_period", self.unbonding_period),
            (
                "delegation_unbonding_period",
                self.delegation_unbonding_period,
            ),
            ("default_jail_blocks", self.default_jail_blocks),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        if self.max_validator_name == 0 {
            return Err(ConfigError::InvalidNameLimit);
        }

        Ok(())
    }

}
