use anchor_lang::prelude::*;

use crate::constants::{period_start, PRECISION, SECONDS_PER_PERIOD};
use crate::error::VaultError;

/// Upstream pool snapshot as reported by the staking protocol.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolState {
    pub staked_amount: u64,
    pub accumulated_rewards_per_share: u128,
    pub last_rewarded_timestamp: i64,
}

impl PoolState {
    /// Returns the window `[last_rewarded, previous period start]` that the
    /// upstream pool has not folded into its accumulator yet, if any.
    pub fn unrewarded_window(&self, now: i64) -> Option<(i64, i64)> {
        let stale = now > self.last_rewarded_timestamp.saturating_add(SECONDS_PER_PERIOD);
        if stale && self.staked_amount != 0 {
            Some((self.last_rewarded_timestamp, period_start(now)))
        } else {
            None
        }
    }

    /// Accumulator projected forward by `rewards_since_last` distributed over
    /// the pool's current stake.
    pub fn projected_accumulator(&self, rewards_since_last: u64) -> Result<u128> {
        if self.staked_amount == 0 || rewards_since_last == 0 {
            return Ok(self.accumulated_rewards_per_share);
        }
        let increment = u128::from(rewards_since_last)
            .checked_mul(PRECISION)
            .ok_or(VaultError::MathOverflow)?
            / u128::from(self.staked_amount);
        Ok(self
            .accumulated_rewards_per_share
            .checked_add(increment)
            .ok_or(VaultError::MathOverflow)?)
    }
}
