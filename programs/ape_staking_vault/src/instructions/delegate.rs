//! Delegation instruction handler.

use anchor_lang::prelude::*;

use crate::error::VaultError;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{require_unique_ids, Vault};

/// Enable or disable a delegate for certificates held in custody.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Recorded owner of every certificate
/// * `delegate` - Address to delegate to
/// * `kind` - Certificate class
/// * `ids` - Certificate ids
/// * `enabled` - True to grant, false to revoke
///
/// # Returns
/// Result indicating success or error
pub fn handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    delegate: Pubkey,
    kind: PoolKind,
    ids: &[u64],
    enabled: bool,
) -> Result<()> {
    require!(kind.is_certificate(), VaultError::UnsupportedCertificate);
    require_unique_ids(ids)?;

    let address = vault.address;
    for &id in ids {
        let record = vault
            .ledger
            .custody(kind, id)
            .ok_or(VaultError::CertificateNotInCustody)?;
        require_keys_eq!(record.owner, caller, VaultError::NotCertificateOwner);
        vault
            .env
            .set_delegate(&address, &delegate, kind, id, enabled)?;
    }

    msg!(
        "Delegate {} {} for {} {:?} certificates",
        delegate,
        if enabled { "ENABLED" } else { "DISABLED" },
        ids.len(),
        kind
    );

    Ok(())
}
