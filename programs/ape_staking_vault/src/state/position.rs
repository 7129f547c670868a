use anchor_lang::prelude::*;

use crate::constants::PRECISION;
use crate::error::VaultError;

/// Principal and reward debt attributed to one staker in one pool.
///
/// `pending = staked_amount * accumulator - rewards_debt`, scaled by `PRECISION`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub staked_amount: u64,
    pub rewards_debt: i128,
}

impl Position {
    /// Adds principal at the given accumulator.
    pub fn increase(&mut self, amount: u64, accumulator: u128) -> Result<()> {
        let debt_delta = scaled(amount, accumulator)?;
        self.staked_amount = self
            .staked_amount
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        self.rewards_debt = self
            .rewards_debt
            .checked_add(debt_delta)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Removes principal at the given accumulator. Underflow is an invariant violation.
    pub fn decrease(&mut self, amount: u64, accumulator: u128) -> Result<()> {
        require!(
            amount <= self.staked_amount,
            VaultError::PositionUnderflow
        );
        let debt_delta = scaled(amount, accumulator)?;
        self.staked_amount -= amount;
        self.rewards_debt = self
            .rewards_debt
            .checked_sub(debt_delta)
            .ok_or(VaultError::MathUnderflow)?;
        Ok(())
    }

    /// Records `claimed` as paid out so it is not projected again.
    pub fn realize(&mut self, claimed: u64) -> Result<()> {
        let delta = i128::from(claimed)
            .checked_mul(precision_i128()?)
            .ok_or(VaultError::MathOverflow)?;
        self.rewards_debt = self
            .rewards_debt
            .checked_add(delta)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }

    /// Unclaimed reward at `accumulator`, floored, never negative.
    pub fn pending(&self, accumulator: u128) -> Result<u64> {
        let accrued = scaled(self.staked_amount, accumulator)?;
        let pending = accrued
            .checked_sub(self.rewards_debt)
            .ok_or(VaultError::MathUnderflow)?
            .max(0);
        let pending = pending / precision_i128()?;
        u64::try_from(pending).map_err(|_| error!(VaultError::ConversionOverflow))
    }
}

/// Escrowed principal and reward recovered by a forced withdrawal.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Refund {
    pub principal: u64,
    pub reward: u64,
}

impl Refund {
    pub fn is_empty(&self) -> bool {
        self.principal == 0 && self.reward == 0
    }

    pub fn total(&self) -> Result<u64> {
        self.principal
            .checked_add(self.reward)
            .ok_or_else(|| error!(VaultError::MathOverflow))
    }
}

fn scaled(amount: u64, accumulator: u128) -> Result<i128> {
    let accumulator = i128::try_from(accumulator).map_err(|_| VaultError::ConversionOverflow)?;
    i128::from(amount)
        .checked_mul(accumulator)
        .ok_or_else(|| error!(VaultError::MathOverflow))
}

fn precision_i128() -> Result<i128> {
    i128::try_from(PRECISION).map_err(|_| error!(VaultError::ConversionOverflow))
}
