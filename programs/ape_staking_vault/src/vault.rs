//! Vault context shared by every instruction handler.
//!
//! Holds the ledger, the orchestrator's stake book, configuration and the
//! injected collaborator environment, plus the helpers handlers use to
//! observe balances, reconcile them and route rewards.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anchor_lang::prelude::*;

use crate::constants::DEFAULT_NFT_SHARE_BPS;
use crate::error::VaultError;
use crate::interfaces::*;
use crate::reward_split::{ProportionalSplit, RewardSplit};
use crate::state::{Ledger, PoolKind, StakeBook, VaultConfig};

/// Result of realizing principal and reward from the upstream pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Settlement {
    pub principal: u64,
    pub reward: u64,
    pub fee: u64,
    pub nft_share: u64,
    pub coin_share: u64,
}

impl Settlement {
    pub(crate) fn merge(&mut self, other: Settlement) -> Result<()> {
        self.principal = checked_sum(self.principal, other.principal)?;
        self.reward = checked_sum(self.reward, other.reward)?;
        self.fee = checked_sum(self.fee, other.fee)?;
        self.nft_share = checked_sum(self.nft_share, other.nft_share)?;
        self.coin_share = checked_sum(self.coin_share, other.coin_share)?;
        Ok(())
    }
}

/// Custodial staking vault.
///
/// `address` is both the custody account for certificates and ApeCoin and
/// the staker identity the vault's own positions are recorded under.
#[derive(Clone, Debug)]
pub struct Vault<E: Environment> {
    pub(crate) address: Pubkey,
    pub(crate) config: VaultConfig,
    pub(crate) ledger: Ledger,
    pub(crate) book: StakeBook,
    pub(crate) splits: BTreeMap<PoolKind, Arc<dyn RewardSplit>>,
    pub(crate) env: E,
}

impl<E: Environment> Vault<E> {
    /// Creates a vault with an empty ledger over the given environment.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(address: Pubkey, config: VaultConfig, env: E) -> Result<Self> {
        config.validate()?;
        let default_split: Arc<dyn RewardSplit> =
            Arc::new(ProportionalSplit::new(DEFAULT_NFT_SHARE_BPS)?);
        let splits = PoolKind::ALL
            .into_iter()
            .filter(|kind| kind.is_certificate())
            .map(|kind| (kind, Arc::clone(&default_split)))
            .collect();

        msg!("Vault {} initialized, fee {}bp", address, config.fee_bps);

        Ok(Self {
            address,
            config,
            ledger: Ledger::default(),
            book: StakeBook::default(),
            splits,
            env,
        })
    }

    /// Runs `op` against a staged copy and commits only if it succeeds.
    pub(crate) fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let mut staged = self.clone();
        let out = op(&mut staged)?;
        *self = staged;
        Ok(out)
    }

    // ---------- read-only views ----------

    pub fn address(&self) -> Pubkey {
        self.address
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn staked_ids(&self, kind: PoolKind) -> Vec<u64> {
        self.book.staked_ids(kind)
    }

    pub fn pending_fee(&self) -> u64 {
        self.book.pending_fee
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Mutable access to the injected collaborators (clock, upstream state).
    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.env
    }

    pub fn total_staked(&self, kind: PoolKind) -> Result<u64> {
        self.ledger.total_staked(kind)
    }

    /// Upstream accumulator projected to now, including periods the
    /// upstream pool has not folded in yet.
    pub fn projected_accumulator(&self, kind: PoolKind) -> Result<u128> {
        let pool = self.env.pool_state(kind);
        match pool.unrewarded_window(self.env.now()) {
            Some((from, to)) => pool.projected_accumulator(self.env.rewards_by(kind, from, to)),
            None => Ok(pool.accumulated_rewards_per_share),
        }
    }

    // ---------- authorization ----------

    pub(crate) fn require_authority(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.config.authority, VaultError::Unauthorized);
        Ok(())
    }

    pub(crate) fn require_operator(&self, caller: &Pubkey) -> Result<()> {
        require_keys_eq!(*caller, self.config.operator, VaultError::NotOperator);
        Ok(())
    }

    pub(crate) fn require_not_paused(&self) -> Result<()> {
        require!(!self.config.paused, VaultError::VaultPaused);
        Ok(())
    }

    /// Caller must be the operator or the recorded staker of every id.
    pub(crate) fn require_staker_or_operator(
        &self,
        caller: &Pubkey,
        kind: PoolKind,
        ids: &[u64],
    ) -> Result<()> {
        for &id in ids {
            let record = self
                .ledger
                .custody(kind, id)
                .ok_or(VaultError::CertificateNotInCustody)?;
            require!(
                *caller == self.config.operator || *caller == record.staker,
                VaultError::NotStakerOrOperator
            );
        }
        Ok(())
    }

    /// Recorded staker of a certificate in custody.
    pub(crate) fn staker_of(&self, kind: PoolKind, id: u64) -> Result<Pubkey> {
        self.ledger
            .custody(kind, id)
            .map(|record| record.staker)
            .ok_or_else(|| error!(VaultError::CertificateNotInCustody))
    }

    // ---------- balance observation ----------

    pub(crate) fn balance(&self) -> u64 {
        self.env.balance_of(&self.address)
    }

    pub(crate) fn live_accumulator(&self, kind: PoolKind) -> u128 {
        self.env.pool_state(kind).accumulated_rewards_per_share
    }

    /// Inflow since `before` must equal `principal + reward` exactly.
    pub(crate) fn reconcile_inflow(&self, before: u64, principal: u64, reward: u64) -> Result<()> {
        let received = self
            .balance()
            .checked_sub(before)
            .ok_or(VaultError::ReconciliationMismatch)?;
        let expected = checked_sum(principal, reward)?;
        if received != expected {
            msg!(
                "Reconciliation failed: received {}, expected {} principal + {} reward",
                received,
                principal,
                reward
            );
            return err!(VaultError::ReconciliationMismatch);
        }
        Ok(())
    }

    /// Outflow since `before` must equal `amount` exactly.
    pub(crate) fn reconcile_outflow(&self, before: u64, amount: u64) -> Result<()> {
        let spent = before
            .checked_sub(self.balance())
            .ok_or(VaultError::ReconciliationMismatch)?;
        require_eq!(spent, amount, VaultError::ReconciliationMismatch);
        Ok(())
    }

    /// Principal the upstream pool attributes to this vault in `kind`.
    pub(crate) fn upstream_staked(&self, kind: PoolKind) -> Result<u64> {
        if kind == PoolKind::SelfStake {
            return Ok(self.env.self_staked(&self.address));
        }
        self.book
            .staked_ids(kind)
            .into_iter()
            .try_fold(0u64, |acc, id| checked_sum(acc, self.env.staked_principal(kind, id)))
    }

    /// Ledger principal must match upstream principal after every stake change.
    pub(crate) fn ensure_in_sync(&self, kind: PoolKind) -> Result<()> {
        let ledger_total = self.ledger.total_staked(kind)?;
        let upstream_total = self.upstream_staked(kind)?;
        if ledger_total != upstream_total {
            msg!(
                "Ledger out of sync for {:?}: ledger {}, upstream {}",
                kind,
                ledger_total,
                upstream_total
            );
            return err!(VaultError::LedgerOutOfSync);
        }
        Ok(())
    }

    // ---------- fund routing ----------

    /// Sends principal back to the liquidity pool.
    pub(crate) fn return_principal(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let address = self.address;
        self.env.receive_ape_coin(&address, amount)
    }

    /// Takes the protocol fee from a realized reward and forwards the
    /// remainder to certificate holders and the liquidity pool.
    pub(crate) fn distribute_reward(&mut self, kind: PoolKind, reward: u64) -> Result<Settlement> {
        if reward == 0 {
            return Ok(Settlement::default());
        }
        let fee = self.config.fee_for(reward)?;
        self.book.accrue_fee(fee)?;
        let distributable = reward - fee;

        // Self-stake rewards have no certificate holders.
        let nft_share = match self.splits.get(&kind) {
            Some(split) if kind.is_certificate() => split.calculate(kind, distributable),
            _ => 0,
        };
        require!(nft_share <= distributable, VaultError::SplitExceedsReward);
        let coin_share = distributable - nft_share;

        let address = self.address;
        if nft_share > 0 {
            self.env
                .receive_certificate_rewards(&address, kind, nft_share)?;
        }
        if coin_share > 0 {
            self.env.receive_ape_coin(&address, coin_share)?;
        }

        msg!(
            "Reward {} from pool {} ({:?}): fee {}, certificates {}, liquidity {}",
            reward,
            kind.pool_id(),
            kind,
            fee,
            nft_share,
            coin_share
        );

        Ok(Settlement {
            principal: 0,
            reward,
            fee,
            nft_share,
            coin_share,
        })
    }

    /// Flushes the pending fee once it exceeds the threshold and a recipient is set.
    pub(crate) fn flush_fee_if_due(&mut self) -> Result<u64> {
        let pending = self.book.pending_fee;
        let recipient = match self.config.fee_recipient {
            Some(recipient) if pending > self.config.fee_flush_threshold => recipient,
            _ => return Ok(0),
        };
        let address = self.address;
        self.env.transfer(&address, &recipient, pending)?;
        self.book.pending_fee = 0;

        msg!("Flushed {} fee to {}", pending, recipient);

        Ok(pending)
    }
}

/// Rejects empty lists and repeated ids.
pub(crate) fn require_unique_ids(ids: &[u64]) -> Result<()> {
    require!(!ids.is_empty(), VaultError::EmptyInput);
    let mut seen = BTreeSet::new();
    for id in ids {
        require!(seen.insert(*id), VaultError::DuplicateCertificate);
    }
    Ok(())
}

pub(crate) fn checked_sum(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b)
        .ok_or_else(|| error!(VaultError::MathOverflow))
}
