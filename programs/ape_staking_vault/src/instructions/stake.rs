//! Stake instruction handlers.
//!
//! Handles funding stakes from the liquidity pool and staking them into the
//! upstream pools.

use std::collections::BTreeSet;

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::instructions::claim::harvest_self;
use crate::instructions::unstake::unstake_self_principal;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{require_unique_ids, Vault};

/// A companion certificate to stake paired with a primary certificate.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompanionPair {
    /// Class of the primary certificate (`PrimaryA` or `PrimaryB`).
    pub primary: PoolKind,
    pub main_token_id: u64,
    pub companion_token_id: u64,
}

/// Moves exactly `amount` from the liquidity pool into the vault.
///
/// If the pool's idle balance is short, self-stake rewards are harvested
/// first and then self-stake principal is unstaked for the remainder.
pub(crate) fn prepare_funds<E: Environment>(vault: &mut Vault<E>, amount: u64) -> Result<()> {
    if vault.env.pending_ape_coin() < amount {
        harvest_self(vault)?;
    }

    let idle = vault.env.pending_ape_coin();
    if idle < amount {
        let shortfall = amount - idle;
        let self_staked = vault.env.self_staked(&vault.address);
        let unstake = shortfall.min(self_staked);
        if unstake > 0 {
            unstake_self_principal(vault, unstake)?;
        }
    }

    require!(
        vault.env.pending_ape_coin() >= amount,
        VaultError::InsufficientLiquidity
    );

    let address = vault.address;
    vault.env.pull_ape_coin(&address, amount)
}

/// Stakes `amount` already held by the vault into the self-stake pool.
fn deposit_self<E: Environment>(vault: &mut Vault<E>, amount: u64) -> Result<()> {
    let address = vault.address;
    let before = vault.balance();
    vault.env.deposit_self(&address, amount)?;
    vault.reconcile_outflow(before, amount)?;

    let accumulator = vault.live_accumulator(PoolKind::SelfStake);
    vault
        .ledger
        .increase_position(PoolKind::SelfStake, address, amount, accumulator)?;
    vault.ensure_in_sync(PoolKind::SelfStake)
}

/// Stakes liquidity-pool funds into the self-stake pool.
///
/// Only rewards are harvested to cover a short idle balance; unstaking
/// self-stake principal to restake it would be a no-op round trip.
pub(crate) fn stake_self<E: Environment>(vault: &mut Vault<E>, amount: u64) -> Result<()> {
    require!(amount > 0, VaultError::ZeroAmount);

    if vault.env.pending_ape_coin() < amount {
        harvest_self(vault)?;
    }
    require!(
        vault.env.pending_ape_coin() >= amount,
        VaultError::InsufficientLiquidity
    );
    let address = vault.address;
    vault.env.pull_ape_coin(&address, amount)?;
    deposit_self(vault, amount)?;

    msg!("Self-staked {} tokens", amount);
    msg!("Total self-staked: {}", vault.env.self_staked(&address));

    Ok(())
}

/// Stakes primary certificates at the per-position cap.
pub(crate) fn stake_certificates<E: Environment>(
    vault: &mut Vault<E>,
    kind: PoolKind,
    ids: &[u64],
) -> Result<u64> {
    require!(kind.is_primary(), VaultError::InvalidPoolKind);

    let mut stakers = Vec::with_capacity(ids.len());
    for &id in ids {
        stakers.push(vault.staker_of(kind, id)?);
        require!(
            !vault.book.is_staked(kind, id) && vault.env.staked_principal(kind, id) == 0,
            VaultError::CertificateAlreadyStaked
        );
    }

    let cap = vault.env.cap_per_position(kind);
    require!(cap > 0, VaultError::ZeroAmount);
    let total = cap
        .checked_mul(ids.len() as u64)
        .ok_or(VaultError::MathOverflow)?;
    prepare_funds(vault, total)?;

    let nfts: Vec<SingleNft> = ids
        .iter()
        .map(|&token_id| SingleNft {
            token_id,
            amount: cap,
        })
        .collect();
    let address = vault.address;
    let before = vault.balance();
    vault.env.deposit_nfts(&address, kind, &nfts)?;
    vault.reconcile_outflow(before, total)?;

    let accumulator = vault.live_accumulator(kind);
    for (&id, staker) in ids.iter().zip(stakers) {
        vault
            .ledger
            .increase_position(kind, staker, cap, accumulator)?;
        vault.book.insert(kind, id)?;
    }
    vault.ensure_in_sync(kind)?;

    Ok(total)
}

/// Stakes companion certificates paired with primary certificates in custody.
pub(crate) fn stake_companions<E: Environment>(
    vault: &mut Vault<E>,
    pairs: &[CompanionPair],
) -> Result<u64> {
    let kind = PoolKind::Companion;
    let cap = vault.env.cap_per_position(kind);
    require!(cap > 0, VaultError::ZeroAmount);

    let mut primary_a = Vec::new();
    let mut primary_b = Vec::new();
    let mut stakers = Vec::with_capacity(pairs.len());
    let mut mains = BTreeSet::new();
    for pair in pairs {
        require!(pair.primary.is_primary(), VaultError::InvalidPoolKind);
        require!(
            mains.insert((pair.primary, pair.main_token_id)),
            VaultError::PrimaryAlreadyPaired
        );
        require!(
            vault.ledger.custody(pair.primary, pair.main_token_id).is_some(),
            VaultError::CertificateNotInCustody
        );
        stakers.push(vault.staker_of(kind, pair.companion_token_id)?);
        require!(
            !vault.book.is_staked(kind, pair.companion_token_id)
                && vault.env.staked_principal(kind, pair.companion_token_id) == 0,
            VaultError::CertificateAlreadyStaked
        );
        require!(
            vault
                .env
                .paired_companion(pair.primary, pair.main_token_id)
                .is_none(),
            VaultError::PrimaryAlreadyPaired
        );

        let nft = PairNft {
            main_token_id: pair.main_token_id,
            companion_token_id: pair.companion_token_id,
            amount: cap,
        };
        match pair.primary {
            PoolKind::PrimaryA => primary_a.push(nft),
            _ => primary_b.push(nft),
        }
    }

    let total = cap
        .checked_mul(pairs.len() as u64)
        .ok_or(VaultError::MathOverflow)?;
    prepare_funds(vault, total)?;

    let address = vault.address;
    let before = vault.balance();
    vault.env.deposit_pairs(&address, &primary_a, &primary_b)?;
    vault.reconcile_outflow(before, total)?;

    let accumulator = vault.live_accumulator(kind);
    for (pair, staker) in pairs.iter().zip(stakers) {
        vault
            .ledger
            .increase_position(kind, staker, cap, accumulator)?;
        vault.book.insert(kind, pair.companion_token_id)?;
    }
    vault.ensure_in_sync(kind)?;

    Ok(total)
}

/// Stake liquidity-pool funds into the self-stake pool.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Must be the operator
/// * `amount` - Amount of ApeCoin to stake
///
/// # Returns
/// Result indicating success or error
pub fn self_stake_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    amount: u64,
) -> Result<()> {
    vault.require_not_paused()?;
    vault.require_operator(&caller)?;
    stake_self(vault, amount)
}

/// Stake primary certificates.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Operator or recorded staker of every certificate
/// * `kind` - `PrimaryA` or `PrimaryB`
/// * `ids` - Certificate ids in custody
///
/// # Returns
/// Total principal staked
pub fn primary_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    kind: PoolKind,
    ids: &[u64],
) -> Result<u64> {
    vault.require_not_paused()?;
    require!(kind.is_primary(), VaultError::InvalidPoolKind);
    require_unique_ids(ids)?;
    vault.require_staker_or_operator(&caller, kind, ids)?;

    let total = stake_certificates(vault, kind, ids)?;

    msg!("Staked {} tokens on {} {:?} certificates", total, ids.len(), kind);
    msg!("Total staked in {:?}: {}", kind, vault.ledger.total_staked(kind)?);

    Ok(total)
}

/// Stake companion certificates in pairs.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Operator, or recorded staker of both certificates of every pair
/// * `pairs` - Primary/companion pairs, both certificates in custody
///
/// # Returns
/// Total principal staked
pub fn companion_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    pairs: &[CompanionPair],
) -> Result<u64> {
    vault.require_not_paused()?;
    let ids: Vec<u64> = pairs.iter().map(|p| p.companion_token_id).collect();
    require_unique_ids(&ids)?;
    vault.require_staker_or_operator(&caller, PoolKind::Companion, &ids)?;
    for pair in pairs {
        require!(pair.primary.is_primary(), VaultError::InvalidPoolKind);
        vault.require_staker_or_operator(&caller, pair.primary, &[pair.main_token_id])?;
    }

    let total = stake_companions(vault, pairs)?;

    msg!("Staked {} tokens on {} companion pairs", total, pairs.len());

    Ok(total)
}
