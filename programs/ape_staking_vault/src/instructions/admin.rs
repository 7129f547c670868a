/// Admin instruction handlers.
///
/// Handles authority-only configuration of the vault.
///
/// ## Security Guarantees
/// - All admin functions require caller == config.authority
/// - Fee rate bounded by MAX_FEE_BPS

use std::sync::Arc;

use anchor_lang::prelude::*;

use crate::constants::*;
use crate::error::VaultError;
use crate::interfaces::*;
use crate::reward_split::RewardSplit;
use crate::state::PoolKind;
use crate::vault::Vault;

/// Set the paused state of the vault.
///
/// # Security
/// - Only the authority can call this
/// - When paused, deposits, stakes and compound are blocked
/// - Withdrawals, refunds, unstakes and claims remain available
pub fn set_paused_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    paused: bool,
) -> Result<()> {
    vault.require_authority(&caller)?;

    let previous_state = vault.config.paused;
    vault.config.paused = paused;

    msg!(
        "Vault {} (was {})",
        if paused { "PAUSED" } else { "RESUMED" },
        if previous_state { "paused" } else { "active" }
    );

    Ok(())
}

/// Update the protocol fee rate.
///
/// # Security
/// - Only the authority can call this
/// - Fee capped at MAX_FEE_BPS (10%)
/// - Applies to rewards realized after the change
pub fn set_fee_bps_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    fee_bps: u16,
) -> Result<()> {
    vault.require_authority(&caller)?;
    require!(fee_bps <= MAX_FEE_BPS, VaultError::FeeTooHigh);

    let old_fee = vault.config.fee_bps;
    vault.config.fee_bps = fee_bps;

    msg!("Fee updated: {}bp -> {}bp", old_fee, fee_bps);

    Ok(())
}

/// Update the fee recipient. `None` keeps fees accruing in the vault.
pub fn set_fee_recipient_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    recipient: Option<Pubkey>,
) -> Result<()> {
    vault.require_authority(&caller)?;
    vault.config.fee_recipient = recipient;

    match recipient {
        Some(recipient) => msg!("Fee recipient set to {}", recipient),
        None => msg!("Fee recipient cleared"),
    }

    Ok(())
}

/// Update the operator allowed to run the orchestrator.
pub fn set_operator_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    operator: Pubkey,
) -> Result<()> {
    vault.require_authority(&caller)?;

    let old_operator = vault.config.operator;
    vault.config.operator = operator;

    msg!("Operator updated: {} -> {}", old_operator, operator);

    Ok(())
}

/// Replace the reward split strategy for a certificate class.
pub fn set_reward_split_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    kind: PoolKind,
    split: Arc<dyn RewardSplit>,
) -> Result<()> {
    vault.require_authority(&caller)?;
    require!(kind.is_certificate(), VaultError::InvalidPoolKind);

    msg!("Reward split for {:?} set to {:?}", kind, split);
    vault.splits.insert(kind, split);

    Ok(())
}

/// Transfer vault authority to a new address.
///
/// # Security
/// - Only the current authority can call this
/// - New authority must be a valid pubkey (non-zero)
pub fn transfer_authority_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    new_authority: Pubkey,
) -> Result<()> {
    vault.require_authority(&caller)?;
    require!(
        new_authority != Pubkey::default(),
        VaultError::Unauthorized
    );

    let old_authority = vault.config.authority;
    vault.config.authority = new_authority;

    msg!("Authority transferred: {} -> {}", old_authority, new_authority);

    Ok(())
}
