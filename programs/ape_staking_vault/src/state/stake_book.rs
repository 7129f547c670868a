use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use indexmap::IndexSet;

use crate::error::VaultError;
use crate::state::PoolKind;

/// Orchestrator-owned aggregate bookkeeping.
///
/// Staked ids are kept in insertion order; that order is the enumeration
/// order the liquidity waterfall walks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeBook {
    staked: BTreeMap<PoolKind, IndexSet<u64>>,
    pub pending_fee: u64,
}

impl StakeBook {
    pub fn staked_ids(&self, kind: PoolKind) -> Vec<u64> {
        self.staked
            .get(&kind)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_staked(&self, kind: PoolKind, id: u64) -> bool {
        self.staked
            .get(&kind)
            .map_or(false, |ids| ids.contains(&id))
    }

    pub fn insert(&mut self, kind: PoolKind, id: u64) -> Result<()> {
        require!(kind.is_certificate(), VaultError::InvalidPoolKind);
        require!(
            self.staked.entry(kind).or_default().insert(id),
            VaultError::CertificateAlreadyStaked
        );
        Ok(())
    }

    pub fn remove(&mut self, kind: PoolKind, id: u64) -> Result<()> {
        let removed = self
            .staked
            .get_mut(&kind)
            .map_or(false, |ids| ids.shift_remove(&id));
        require!(removed, VaultError::CertificateNotStaked);
        Ok(())
    }

    pub fn accrue_fee(&mut self, fee: u64) -> Result<()> {
        self.pending_fee = self
            .pending_fee
            .checked_add(fee)
            .ok_or(VaultError::MathOverflow)?;
        Ok(())
    }
}
