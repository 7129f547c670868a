//! Refund escrow handlers.
//!
//! Pays out principal and reward escrowed by forced withdrawals.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{checked_sum, Vault};

/// Routes the vault's own escrowed refunds back into the pools.
///
/// Principal returns to the liquidity pool; reward is treated as realized
/// reward and goes through the fee and the reward split.
pub(crate) fn drain_refunds<E: Environment>(vault: &mut Vault<E>) -> Result<u64> {
    let address = vault.address;
    let mut drained = 0u64;
    for kind in PoolKind::ALL {
        let refund = vault.ledger.take_refund(kind, &address);
        if refund.is_empty() {
            continue;
        }
        vault.return_principal(refund.principal)?;
        vault.distribute_reward(kind, refund.reward)?;
        drained = checked_sum(drained, refund.total()?)?;

        msg!(
            "Drained {:?} refund: {} principal, {} reward",
            kind,
            refund.principal,
            refund.reward
        );
    }
    Ok(drained)
}

/// Withdraw the caller's refund escrow for one pool kind.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Staker the refund is recorded under
/// * `kind` - Pool kind
///
/// # Returns
/// Amount paid out; zero when nothing is escrowed
pub fn handler<E: Environment>(vault: &mut Vault<E>, caller: Pubkey, kind: PoolKind) -> Result<u64> {
    let refund = vault.ledger.take_refund(kind, &caller);
    if refund.is_empty() {
        msg!("No {:?} refund escrowed for {}", kind, caller);
        return Ok(0);
    }

    let amount = refund.total()?;
    require!(vault.balance() >= amount, VaultError::InsufficientBalance);
    let address = vault.address;
    vault.env.transfer(&address, &caller, amount)?;

    msg!("Refunded {} tokens to {}", amount, caller);
    msg!("Principal: {}, reward: {}", refund.principal, refund.reward);

    Ok(amount)
}
