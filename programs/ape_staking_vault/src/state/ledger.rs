//! Position ledger.
//!
//! Owns every per-staker position, refund escrow entry and custody record.
//! The ledger is pure bookkeeping: callers supply the live upstream
//! accumulator, and token movements happen in the instruction handlers.

use std::collections::BTreeMap;

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::state::{CustodyRecord, PoolKind, Position, Refund};

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    positions: BTreeMap<(PoolKind, Pubkey), Position>,
    refunds: BTreeMap<(PoolKind, Pubkey), Refund>,
    custody: BTreeMap<(PoolKind, u64), CustodyRecord>,
}

impl Ledger {
    pub fn position(&self, kind: PoolKind, staker: &Pubkey) -> Position {
        self.positions
            .get(&(kind, *staker))
            .copied()
            .unwrap_or_default()
    }

    pub fn refund(&self, kind: PoolKind, staker: &Pubkey) -> Refund {
        self.refunds
            .get(&(kind, *staker))
            .copied()
            .unwrap_or_default()
    }

    pub fn custody(&self, kind: PoolKind, id: u64) -> Option<CustodyRecord> {
        self.custody.get(&(kind, id)).copied()
    }

    /// Sum of principal over every staker in `kind`.
    pub fn total_staked(&self, kind: PoolKind) -> Result<u64> {
        self.positions
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .try_fold(0u64, |acc, (_, p)| {
                acc.checked_add(p.staked_amount)
                    .ok_or_else(|| error!(VaultError::MathOverflow))
            })
    }

    pub fn increase_position(
        &mut self,
        kind: PoolKind,
        staker: Pubkey,
        amount: u64,
        accumulator: u128,
    ) -> Result<()> {
        self.positions
            .entry((kind, staker))
            .or_default()
            .increase(amount, accumulator)
    }

    pub fn decrease_position(
        &mut self,
        kind: PoolKind,
        staker: Pubkey,
        amount: u64,
        accumulator: u128,
    ) -> Result<()> {
        self.positions
            .entry((kind, staker))
            .or_default()
            .decrease(amount, accumulator)
    }

    pub fn update_rewards_debt(
        &mut self,
        kind: PoolKind,
        staker: Pubkey,
        claimed: u64,
    ) -> Result<()> {
        if claimed == 0 {
            return Ok(());
        }
        self.positions
            .entry((kind, staker))
            .or_default()
            .realize(claimed)
    }

    /// Pending reward for `staker` at an already-projected accumulator.
    pub fn pending_rewards(
        &self,
        kind: PoolKind,
        staker: &Pubkey,
        projected_accumulator: u128,
    ) -> Result<u64> {
        self.position(kind, staker).pending(projected_accumulator)
    }

    pub fn add_refund(
        &mut self,
        kind: PoolKind,
        staker: Pubkey,
        principal: u64,
        reward: u64,
    ) -> Result<()> {
        if principal == 0 && reward == 0 {
            return Ok(());
        }
        let refund = self.refunds.entry((kind, staker)).or_default();
        refund.principal = refund
            .principal
            .checked_add(principal)
            .ok_or(VaultError::MathOverflow)?;
        refund.reward = refund
            .reward
            .checked_add(reward)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Zeroes and returns the refund entry in one step.
    pub fn take_refund(&mut self, kind: PoolKind, staker: &Pubkey) -> Refund {
        self.refunds
            .remove(&(kind, *staker))
            .unwrap_or_default()
    }

    pub fn insert_custody(&mut self, kind: PoolKind, id: u64, record: CustodyRecord) {
        self.custody.insert((kind, id), record);
    }

    pub fn remove_custody(&mut self, kind: PoolKind, id: u64) -> Option<CustodyRecord> {
        self.custody.remove(&(kind, id))
    }

    /// BLAKE3 hash of the serialized ledger.
    ///
    /// Equal digests mean equal positions, refunds and custody records.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let bytes = self
            .try_to_vec()
            .map_err(|_| error!(VaultError::SerializationFailed))?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }
}
