//! Unstake instruction handlers.
//!
//! Handles withdrawing principal and rewards from the upstream pools and
//! routing them back: principal to the liquidity pool, reward through the
//! fee and the reward split.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::instructions::claim::harvest_self;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{checked_sum, require_unique_ids, Settlement, Vault};

/// One certificate removed from an upstream pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Exit {
    pub kind: PoolKind,
    pub token_id: u64,
    pub staker: Pubkey,
    pub principal: u64,
    pub reward: u64,
}

/// Companion pairs split by the class of their primary certificate.
#[derive(Clone, Debug, Default)]
pub(crate) struct PairBatch {
    pub primary_a: Vec<PairNft>,
    pub primary_b: Vec<PairNft>,
}

impl PairBatch {
    pub fn is_empty(&self) -> bool {
        self.primary_a.is_empty() && self.primary_b.is_empty()
    }
}

/// Classifies companion certificates by the primary pool they are paired with.
///
/// The upstream pair commands take the two primary classes as separate lists.
pub(crate) fn classify_companions<E: Environment>(
    vault: &Vault<E>,
    ids: &[u64],
    with_principal: bool,
) -> Result<PairBatch> {
    let mut batch = PairBatch::default();
    for &id in ids {
        let (primary, main_token_id) = vault
            .env
            .paired_primary(id)
            .ok_or(VaultError::CompanionNotPaired)?;
        let pair = PairNft {
            main_token_id,
            companion_token_id: id,
            amount: if with_principal {
                vault.env.staked_principal(PoolKind::Companion, id)
            } else {
                0
            },
        };
        match primary {
            PoolKind::PrimaryA => batch.primary_a.push(pair),
            PoolKind::PrimaryB => batch.primary_b.push(pair),
            _ => return err!(VaultError::InvalidPoolKind),
        }
    }
    Ok(batch)
}

/// Applies a batch of exits to the ledger and the stake book.
///
/// Positions are decreased by principal at the live accumulator and the
/// realized reward is recorded as paid.
fn settle_exits<E: Environment>(vault: &mut Vault<E>, kind: PoolKind, exits: &[Exit]) -> Result<()> {
    let accumulator = vault.live_accumulator(kind);
    for exit in exits {
        vault
            .ledger
            .decrease_position(kind, exit.staker, exit.principal, accumulator)?;
        vault
            .ledger
            .update_rewards_debt(kind, exit.staker, exit.reward)?;
        vault.book.remove(kind, exit.token_id)?;
    }
    vault.ensure_in_sync(kind)
}

/// Withdraws staked primary certificates in one batched upstream call.
///
/// Funds stay in the vault; the caller decides where they go.
pub(crate) fn exit_primary<E: Environment>(
    vault: &mut Vault<E>,
    kind: PoolKind,
    ids: &[u64],
) -> Result<Vec<Exit>> {
    require!(kind.is_primary(), VaultError::InvalidPoolKind);

    let mut exits = Vec::with_capacity(ids.len());
    let mut nfts = Vec::with_capacity(ids.len());
    for &id in ids {
        require!(vault.book.is_staked(kind, id), VaultError::CertificateNotStaked);
        let principal = vault.env.staked_principal(kind, id);
        exits.push(Exit {
            kind,
            token_id: id,
            staker: vault.staker_of(kind, id)?,
            principal,
            reward: vault.env.pending_rewards(kind, id),
        });
        nfts.push(SingleNft {
            token_id: id,
            amount: principal,
        });
    }
    let (principal, reward) = totals(&exits)?;

    let address = vault.address;
    let before = vault.balance();
    vault.env.withdraw_nfts(&address, kind, &nfts)?;
    vault.reconcile_inflow(before, principal, reward)?;

    settle_exits(vault, kind, &exits)?;
    Ok(exits)
}

/// Withdraws staked companion certificates in one batched upstream call.
pub(crate) fn exit_companions<E: Environment>(
    vault: &mut Vault<E>,
    ids: &[u64],
) -> Result<Vec<Exit>> {
    let kind = PoolKind::Companion;
    let mut exits = Vec::with_capacity(ids.len());
    for &id in ids {
        require!(vault.book.is_staked(kind, id), VaultError::CertificateNotStaked);
        exits.push(Exit {
            kind,
            token_id: id,
            staker: vault.staker_of(kind, id)?,
            principal: vault.env.staked_principal(kind, id),
            reward: vault.env.pending_rewards(kind, id),
        });
    }
    let batch = classify_companions(vault, ids, true)?;
    let (principal, reward) = totals(&exits)?;

    let address = vault.address;
    let before = vault.balance();
    vault
        .env
        .withdraw_pairs(&address, &batch.primary_a, &batch.primary_b)?;
    vault.reconcile_inflow(before, principal, reward)?;

    settle_exits(vault, kind, &exits)?;
    Ok(exits)
}

pub(crate) fn totals(exits: &[Exit]) -> Result<(u64, u64)> {
    exits.iter().try_fold((0u64, 0u64), |(p, r), exit| {
        Ok((checked_sum(p, exit.principal)?, checked_sum(r, exit.reward)?))
    })
}

/// Returns exited principal to the liquidity pool and distributes the reward.
pub(crate) fn route_exits<E: Environment>(
    vault: &mut Vault<E>,
    kind: PoolKind,
    exits: &[Exit],
) -> Result<Settlement> {
    let (principal, reward) = totals(exits)?;
    vault.return_principal(principal)?;
    let mut settlement = vault.distribute_reward(kind, reward)?;
    settlement.principal = principal;
    Ok(settlement)
}

/// Withdraws self-stake principal back into the liquidity pool.
///
/// Rewards are harvested first so the withdrawal moves principal only,
/// unless the upstream pool pays out on emptying the position.
pub(crate) fn unstake_self_principal<E: Environment>(
    vault: &mut Vault<E>,
    amount: u64,
) -> Result<Settlement> {
    require!(amount > 0, VaultError::ZeroAmount);
    let address = vault.address;
    require!(
        amount <= vault.env.self_staked(&address),
        VaultError::InsufficientSelfStake
    );

    let mut settlement = harvest_self(vault)?;

    let reward = if amount == vault.env.self_staked(&address) {
        vault.env.self_pending_rewards(&address)
    } else {
        0
    };
    let before = vault.balance();
    vault.env.withdraw_self(&address, amount)?;
    vault.reconcile_inflow(before, amount, reward)?;

    let accumulator = vault.live_accumulator(PoolKind::SelfStake);
    vault
        .ledger
        .decrease_position(PoolKind::SelfStake, address, amount, accumulator)?;
    vault
        .ledger
        .update_rewards_debt(PoolKind::SelfStake, address, reward)?;
    vault.ensure_in_sync(PoolKind::SelfStake)?;

    vault.return_principal(amount)?;
    settlement.merge(vault.distribute_reward(PoolKind::SelfStake, reward)?)?;
    settlement.principal = checked_sum(settlement.principal, amount)?;

    msg!("Unstaked {} self-staked tokens", amount);
    msg!(
        "Remaining self-staked: {}",
        vault.env.self_staked(&address)
    );

    Ok(settlement)
}

/// Unstake principal from the self-stake pool.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Must be the operator
/// * `amount` - Principal to unstake
///
/// # Returns
/// The realized settlement
pub fn self_stake_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    amount: u64,
) -> Result<Settlement> {
    vault.require_operator(&caller)?;
    unstake_self_principal(vault, amount)
}

/// Unstake primary certificates.
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

    let exits = exit_primary(vault, kind, ids)?;
    let settlement = route_exits(vault, kind, &exits)?;

    msg!("Unstaked {} {:?} certificates", ids.len(), kind);
    msg!(
        "Principal returned: {}, reward realized: {}",
        settlement.principal,
        settlement.reward
    );

    Ok(settlement)
}

/// Unstake companion certificates from their pairs.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Operator or recorded staker of every companion certificate
/// * `ids` - Staked companion certificate ids
///
/// # Returns
/// The realized settlement
pub fn companion_handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    ids: &[u64],
) -> Result<Settlement> {
    require_unique_ids(ids)?;
    vault.require_staker_or_operator(&caller, PoolKind::Companion, ids)?;

    let exits = exit_companions(vault, ids)?;
    let settlement = route_exits(vault, PoolKind::Companion, &exits)?;

    msg!("Unstaked {} companion certificates", ids.len());
    msg!(
        "Principal returned: {}, reward realized: {}",
        settlement.principal,
        settlement.reward
    );

    Ok(settlement)
}
