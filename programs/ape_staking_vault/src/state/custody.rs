use anchor_lang::prelude::*;

/// Custody record for one certificate held by the vault.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CustodyRecord {
    /// Depositor who handed the certificate to the vault.
    pub owner: Pubkey,
    /// Party allowed to stake, unstake and claim on the owner's behalf.
    pub staker: Pubkey,
}
