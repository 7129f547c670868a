//! Reward split strategies.
//!
//! A strategy decides how much of a post-fee reward batch goes to
//! certificate holders; the remainder goes to the liquidity pool.

use std::fmt;

use anchor_lang::prelude::*;

use crate::constants::BASIS_POINTS_DENOMINATOR;
use crate::error::VaultError;
use crate::state::PoolKind;

pub trait RewardSplit: fmt::Debug + Send + Sync {
    /// Certificate holders' share of `reward_amount`.
    fn calculate(&self, kind: PoolKind, reward_amount: u64) -> u64;
}

/// Fixed basis-point share for certificate holders, floored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProportionalSplit {
    nft_share_bps: u16,
}

impl ProportionalSplit {
    /// # Errors
    /// Returns `InvalidSplitShare` if the share exceeds 100%.
    pub fn new(nft_share_bps: u16) -> Result<Self> {
        require!(
            u64::from(nft_share_bps) <= BASIS_POINTS_DENOMINATOR,
            VaultError::InvalidSplitShare
        );
        Ok(Self { nft_share_bps })
    }

    pub fn nft_share_bps(&self) -> u16 {
        self.nft_share_bps
    }
}

impl RewardSplit for ProportionalSplit {
    fn calculate(&self, _kind: PoolKind, reward_amount: u64) -> u64 {
        let share = u128::from(reward_amount) * u128::from(self.nft_share_bps)
            / u128::from(BASIS_POINTS_DENOMINATOR);
        u64::try_from(share).unwrap_or(u64::MAX)
    }
}
