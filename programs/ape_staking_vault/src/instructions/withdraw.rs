//! Withdraw instruction handler.
//!
//! Returns certificates to their owner. Certificates still staked upstream
//! are unstaked first and the proceeds are escrowed for their staker, since
//! the owner forcing the withdrawal is not necessarily the party entitled to
//! them.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::instructions::unstake::{exit_companions, exit_primary, Exit};
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{require_unique_ids, Vault};

/// Escrows exit proceeds per staker instead of paying them out.
fn escrow_exits<E: Environment>(vault: &mut Vault<E>, exits: &[Exit]) -> Result<()> {
    for exit in exits {
        vault
            .ledger
            .add_refund(exit.kind, exit.staker, exit.principal, exit.reward)?;
        msg!(
            "Escrowed {} principal + {} reward for {} ({:?} #{})",
            exit.principal,
            exit.reward,
            exit.staker,
            exit.kind,
            exit.token_id
        );
    }
    Ok(())
}

/// Unstakes primary certificates and any staked companions paired with them.
fn refund_primary<E: Environment>(vault: &mut Vault<E>, kind: PoolKind, ids: &[u64]) -> Result<()> {
    let mut staked = Vec::new();
    let mut companions = Vec::new();
    for &id in ids {
        if vault.env.staked_principal(kind, id) > 0 {
            staked.push(id);
        }
        if let Some(companion) = vault.env.paired_companion(kind, id) {
            if vault.env.staked_principal(PoolKind::Companion, companion) > 0 {
                companions.push(companion);
            }
        }
    }

    // Pairs go first: the companion stake depends on its primary being held.
    if !companions.is_empty() {
        let exits = exit_companions(vault, &companions)?;
        escrow_exits(vault, &exits)?;
    }
    if !staked.is_empty() {
        let exits = exit_primary(vault, kind, &staked)?;
        escrow_exits(vault, &exits)?;
    }
    Ok(())
}

fn refund_companions<E: Environment>(vault: &mut Vault<E>, ids: &[u64]) -> Result<()> {
    let staked: Vec<u64> = ids
        .iter()
        .copied()
        .filter(|&id| vault.env.staked_principal(PoolKind::Companion, id) > 0)
        .collect();
    if staked.is_empty() {
        return Ok(());
    }
    let exits = exit_companions(vault, &staked)?;
    escrow_exits(vault, &exits)
}

/// Withdraw certificates from custody.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Recorded owner of every certificate
/// * `kind` - Certificate class
/// * `ids` - Certificate ids to withdraw
///
/// # Returns
/// Result indicating success or error
pub fn handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    kind: PoolKind,
    ids: &[u64],
) -> Result<()> {
    require!(kind.is_certificate(), VaultError::UnsupportedCertificate);
    require_unique_ids(ids)?;
    for &id in ids {
        let record = vault
            .ledger
            .custody(kind, id)
            .ok_or(VaultError::CertificateNotInCustody)?;
        require_keys_eq!(record.owner, caller, VaultError::NotCertificateOwner);
        require!(
            vault.env.owner_of(kind, id) == Some(vault.address),
            VaultError::CertificateTransferDenied
        );
    }

    match kind {
        PoolKind::Companion => refund_companions(vault, ids)?,
        _ => refund_primary(vault, kind, ids)?,
    }

    let address = vault.address;
    for &id in ids {
        vault
            .env
            .transfer_certificate(kind, id, &address, &caller)?;
        vault.ledger.remove_custody(kind, id);
    }

    msg!("Withdrew {} {:?} certificates to {}", ids.len(), kind, caller);

    Ok(())
}
