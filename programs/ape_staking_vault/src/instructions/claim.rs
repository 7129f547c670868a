//! Claim instruction handlers.
//!
//! Handles realizing upstream rewards without moving principal.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::instructions::unstake::classify_companions;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{checked_sum, require_unique_ids, Settlement, Vault};

/// Harvests pending self-stake rewards into the liquidity pool.
pub(crate) fn harvest_self<E: Environment>(vault: &mut Vault<E>) -> Result<Settlement> {
    let address = vault.address;
    let reward = vault.env.self_pending_rewards(&address);
    if reward == 0 {
        return Ok(Settlement::default());
    }

    let before = vault.balance();
    vault.env.claim_self(&address)?;
    vault.reconcile_inflow(before, 0, reward)?;

    vault
        .ledger
        .update_rewards_debt(PoolKind::SelfStake, address, reward)?;
    vault.distribute_reward(PoolKind::SelfStake, reward)
}

/// Claims rewards for staked certificates of one kind and records them per staker.
pub(crate) fn claim_certificates<E: Environment>(
    vault: &mut Vault<E>,
    kind: PoolKind,
    ids: &[u64],
) -> Result<Settlement> {
    require!(kind.is_certificate(), VaultError::InvalidPoolKind);

    let mut claims = Vec::with_capacity(ids.len());
    let mut total = 0u64;
    for &id in ids {
        require!(vault.book.is_staked(kind, id), VaultError::CertificateNotStaked);
        let reward = vault.env.pending_rewards(kind, id);
        total = checked_sum(total, reward)?;
        claims.push((vault.staker_of(kind, id)?, reward));
    }

    let address = vault.address;
    let before = vault.balance();
    if kind == PoolKind::Companion {
        let batch = classify_companions(vault, ids, false)?;
        vault
            .env
            .claim_pairs(&address, &batch.primary_a, &batch.primary_b)?;
    } else {
        vault.env.claim_nfts(&address, kind, ids)?;
    }
    vault.reconcile_inflow(before, 0, total)?;

    for (staker, reward) in claims {
        vault.ledger.update_rewards_debt(kind, staker, reward)?;
    }
    vault.distribute_reward(kind, total)
}

/// Claim self-stake rewards.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Must be the operator
///
/// # Returns
/// The realized settlement
pub fn self_stake_handler<E: Environment>(vault: &mut Vault<E>, caller: Pubkey) -> Result<Settlement> {
    vault.require_operator(&caller)?;
    let settlement = harvest_self(vault)?;

    msg!("Harvested {} self-stake reward tokens", settlement.reward);

    Ok(settlement)
}

/// Claim rewards for staked primary certificates.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Operator or recorded staker of every certificate
/// * `kind` - `PrimaryA` or `PrimaryB`
/// * `ids` - Staked certificate ids
///
/// # Returns
/// The realized settlement
pub fn primary_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    kind: PoolKind,
    ids: &[u64],
) -> Result<Settlement> {
    require!(kind.is_primary(), VaultError::InvalidPoolKind);
    require_unique_ids(ids)?;
    vault.require_staker_or_operator(&caller, kind, ids)?;

    let settlement = claim_certificates(vault, kind, ids)?;

    msg!(
        "Claimed {} reward tokens for {} {:?} certificates",
        settlement.reward,
        ids.len(),
        kind
    );

    Ok(settlement)
}

/// Claim rewards for staked companion certificates.
pub fn companion_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    ids: &[u64],
) -> Result<Settlement> {
    require_unique_ids(ids)?;
    vault.require_staker_or_operator(&caller, PoolKind::Companion, ids)?;

    let settlement = claim_certificates(vault, PoolKind::Companion, ids)?;

    msg!(
        "Claimed {} reward tokens for {} companion certificates",
        settlement.reward,
        ids.len()
    );

    Ok(settlement)
}
