//! Deposit instruction handler.
//!
//! Takes certificates into custody and records who may stake them.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::interfaces::*;
use crate::state::{CustodyRecord, PoolKind};
use crate::vault::{require_unique_ids, Vault};

/// Deposit certificates into the vault.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Current owner of every certificate
/// * `kind` - Certificate class
/// * `ids` - Certificate ids to deposit
/// * `staker` - Party allowed to stake the certificates on the owner's behalf
///
/// # Returns
/// Result indicating success or error
pub fn handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    kind: PoolKind,
    ids: &[u64],
    staker: Pubkey,
) -> Result<()> {
    // === INPUT VALIDATION ===

    vault.require_not_paused()?;
    require!(kind.is_certificate(), VaultError::UnsupportedCertificate);
    require_unique_ids(ids)?;

    for &id in ids {
        require!(
            vault.env.owner_of(kind, id) == Some(caller),
            VaultError::NotCertificateOwner
        );
        require!(
            vault.env.staked_principal(kind, id) == 0,
            VaultError::CertificateAlreadyStaked
        );
    }

    // === CUSTODY TRANSFER ===

    let address = vault.address;
    for &id in ids {
        vault
            .env
            .transfer_certificate(kind, id, &caller, &address)?;
        vault.ledger.insert_custody(
            kind,
            id,
            CustodyRecord {
                owner: caller,
                staker,
            },
        );
    }

    msg!("Deposited {} {:?} certificates", ids.len(), kind);
    msg!("Owner: {}, staker: {}", caller, staker);

    Ok(())
}
