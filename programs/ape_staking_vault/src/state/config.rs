use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::VaultError;

/// Administrative configuration of the vault.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct VaultConfig {
    pub authority: Pubkey,
    /// Scheduler allowed to run stake, unstake, claim and compound.
    pub operator: Pubkey,
    pub fee_bps: u16,
    pub fee_recipient: Option<Pubkey>,
    pub fee_flush_threshold: u64,
    pub paused: bool,
}

impl VaultConfig {
    pub fn new(authority: Pubkey, operator: Pubkey) -> Self {
        Self {
            authority,
            operator,
            fee_bps: DEFAULT_FEE_BPS,
            fee_recipient: None,
            fee_flush_threshold: DEFAULT_FEE_FLUSH_THRESHOLD,
            paused: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require!(self.fee_bps <= MAX_FEE_BPS, VaultError::FeeTooHigh);
        require!(
            self.authority != Pubkey::default(),
            VaultError::Unauthorized
        );
        Ok(())
    }

    /// `floor(reward * fee_bps / 10000)`.
    pub fn fee_for(&self, reward: u64) -> Result<u64> {
        let fee = u128::from(reward)
            .checked_mul(u128::from(self.fee_bps))
            .ok_or(VaultError::MathOverflow)?
            / u128::from(BASIS_POINTS_DENOMINATOR);
        u64::try_from(fee).map_err(|_| error!(VaultError::ConversionOverflow))
    }
}
