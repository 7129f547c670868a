//! Liquidity waterfall.
//!
//! Frees ApeCoin back into the liquidity pool from progressively more
//! disruptive sources until the requested amount is idle there.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::instructions::claim::harvest_self;
use crate::instructions::unstake::{exit_companions, exit_primary, route_exits, unstake_self_principal};
use crate::instructions::withdraw_refund::drain_refunds;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{checked_sum, Vault};

/// Amount still missing from the liquidity pool's idle balance.
fn shortfall<E: Environment>(vault: &Vault<E>, required: u64) -> u64 {
    required.saturating_sub(vault.env.pending_ape_coin())
}

/// Picks staked certificates in stake order until their principal plus
/// pending reward covers `needed`.
///
/// Stops at the first certificate that reaches the target, so the number of
/// certificates is minimal for the order, not the value unstaked.
pub(crate) fn select_certificates<E: Environment>(
    vault: &Vault<E>,
    kind: PoolKind,
    needed: u64,
) -> Result<Vec<u64>> {
    let mut selected = Vec::new();
    let mut covered = 0u64;
    for id in vault.book.staked_ids(kind) {
        if covered >= needed {
            break;
        }
        let value = checked_sum(
            vault.env.staked_principal(kind, id),
            vault.env.pending_rewards(kind, id),
        )?;
        covered = checked_sum(covered, value)?;
        selected.push(id);
    }
    Ok(selected)
}

fn unstake_for_shortfall<E: Environment>(
    vault: &mut Vault<E>,
    kind: PoolKind,
    needed: u64,
) -> Result<()> {
    let ids = select_certificates(vault, kind, needed)?;
    if ids.is_empty() {
        return Ok(());
    }
    let exits = match kind {
        PoolKind::Companion => exit_companions(vault, &ids)?,
        _ => exit_primary(vault, kind, &ids)?,
    };
    let settlement = route_exits(vault, kind, &exits)?;

    msg!(
        "Waterfall unstaked {} {:?} certificates: {} principal, {} reward",
        ids.len(),
        kind,
        settlement.principal,
        settlement.reward
    );

    Ok(())
}

/// Make `required` ApeCoin idle in the liquidity pool.
///
/// Sources are consulted in order while a shortfall remains: escrowed
/// refunds, self-stake rewards, self-stake principal, then `PrimaryA`,
/// `PrimaryB` and `Companion` certificates.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Liquidity pool or operator
/// * `required` - Amount the liquidity pool needs idle
///
/// # Returns
/// Amount available, capped at `required`. A value below `required` means
/// upstream liquidity ran out; it is not an error.
pub fn handler<E: Environment>(vault: &mut Vault<E>, caller: Pubkey, required: u64) -> Result<u64> {
    require!(
        caller == vault.env.liquidity_pool_address() || caller == vault.config.operator,
        VaultError::NotLiquidityPool
    );
    require!(required > 0, VaultError::ZeroAmount);

    if shortfall(vault, required) == 0 {
        return Ok(required);
    }

    drain_refunds(vault)?;

    if shortfall(vault, required) > 0 {
        harvest_self(vault)?;
    }

    let needed = shortfall(vault, required);
    if needed > 0 {
        let self_staked = vault.env.self_staked(&vault.address);
        let amount = needed.min(self_staked);
        if amount > 0 {
            unstake_self_principal(vault, amount)?;
        }
    }

    for kind in [PoolKind::PrimaryA, PoolKind::PrimaryB, PoolKind::Companion] {
        let needed = shortfall(vault, required);
        if needed == 0 {
            break;
        }
        unstake_for_shortfall(vault, kind, needed)?;
    }

    let available = vault.env.pending_ape_coin().min(required);

    msg!("Waterfall made {} of {} available", available, required);

    Ok(available)
}
