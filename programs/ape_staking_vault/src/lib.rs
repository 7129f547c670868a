//! # ApeCoin Staking Vault
//!
//! A custodial vault that stakes ApeCoin and certificate NFTs into the four
//! upstream ApeCoin staking pools on behalf of depositors:
//!
//! - **SelfStake**: fungible-only pool funded from the liquidity pool
//! - **PrimaryA** / **PrimaryB**: one position per primary certificate
//! - **Companion**: one position per companion certificate paired with a primary
//!
//! ## Features
//! - Position ledger with reward-debt accounting against the upstream accumulator
//! - Refund escrow for certificates force-withdrawn by their owner
//! - Stake, unstake and claim paths reconciled against observed balance deltas
//! - Protocol fee and pluggable per-pool reward split
//! - Liquidity waterfall and a batched compound pass for the operator
//! - Authority controls for pausing, fees, operator and reward splits
//!
//! ## Atomicity
//! Every public operation runs against a staged copy of the vault, including
//! its environment, and commits only if the whole operation succeeds.

use std::sync::Arc;

use anchor_lang::prelude::*;

pub mod constants;
pub mod error;
pub mod instructions;
pub mod interfaces;
pub mod reward_split;
pub mod state;
pub mod vault;

pub use error::VaultError;
pub use instructions::{CertificateSets, CompanionPair, CompoundArgs, CompoundReport, StakeSets};
pub use interfaces::*;
pub use reward_split::{ProportionalSplit, RewardSplit};
pub use state::{CustodyRecord, Ledger, PoolKind, PoolState, Position, Refund, VaultConfig};
pub use vault::{Settlement, Vault};

impl<E: Environment> Vault<E> {
    // ---------- position ledger ----------

    /// Deposits certificates into custody.
    ///
    /// # Arguments
    /// * `caller` - Current owner of every certificate
    /// * `kind` - `PrimaryA`, `PrimaryB` or `Companion`
    /// * `ids` - Certificate ids
    /// * `staker` - Party allowed to stake, unstake and claim on the owner's behalf
    ///
    /// # Errors
    /// Returns an error if:
    /// - The vault is paused
    /// - The list is empty or repeats an id
    /// - The caller does not own a certificate
    /// - A certificate already carries upstream stake
    pub fn deposit(&mut self, caller: Pubkey, kind: PoolKind, ids: &[u64], staker: Pubkey) -> Result<()> {
        self.atomically(|vault| instructions::deposit::handler(vault, caller, kind, ids, staker))
    }

    /// Withdraws certificates from custody back to their owner.
    ///
    /// Certificates still staked upstream are unstaked first; the proceeds
    /// are escrowed for the recorded staker.
    ///
    /// # Errors
    /// Returns an error if the caller is not the recorded owner of every
    /// certificate, or if upstream reconciliation fails.
    pub fn withdraw(&mut self, caller: Pubkey, kind: PoolKind, ids: &[u64]) -> Result<()> {
        self.atomically(|vault| instructions::withdraw::handler(vault, caller, kind, ids))
    }

    /// Pays out and zeroes the caller's refund escrow for `kind`.
    ///
    /// Returns the amount paid; zero when nothing is escrowed.
    pub fn withdraw_refund(&mut self, caller: Pubkey, kind: PoolKind) -> Result<u64> {
        self.atomically(|vault| instructions::withdraw_refund::handler(vault, caller, kind))
    }

    /// Enables or disables a delegate for certificates the caller owns.
    pub fn set_delegate(
        &mut self,
        caller: Pubkey,
        delegate: Pubkey,
        kind: PoolKind,
        ids: &[u64],
        enabled: bool,
    ) -> Result<()> {
        self.atomically(|vault| {
            instructions::delegate::handler(vault, caller, delegate, kind, ids, enabled)
        })
    }

    /// Unclaimed reward of `staker` in `kind`, projected to the current time.
    pub fn pending_rewards(&self, kind: PoolKind, staker: &Pubkey) -> Result<u64> {
        let accumulator = self.projected_accumulator(kind)?;
        self.ledger.pending_rewards(kind, staker, accumulator)
    }

    pub fn position(&self, kind: PoolKind, staker: &Pubkey) -> Position {
        self.ledger.position(kind, staker)
    }

    pub fn refund(&self, kind: PoolKind, staker: &Pubkey) -> Refund {
        self.ledger.refund(kind, staker)
    }

    pub fn custody(&self, kind: PoolKind, id: u64) -> Option<CustodyRecord> {
        self.ledger.custody(kind, id)
    }

    // ---------- stake orchestrator ----------

    /// Stakes `amount` from the liquidity pool into the self-stake pool.
    ///
    /// # Errors
    /// Returns an error if the caller is not the operator, the vault is
    /// paused, or the liquidity pool cannot supply `amount`.
    pub fn stake_self(&mut self, caller: Pubkey, amount: u64) -> Result<()> {
        self.atomically(|vault| instructions::stake::self_stake_handler(vault, caller, amount))
    }

    /// Stakes primary certificates at the per-position cap.
    ///
    /// Returns the total principal staked.
    pub fn stake_primary(&mut self, caller: Pubkey, kind: PoolKind, ids: &[u64]) -> Result<u64> {
        self.atomically(|vault| instructions::stake::primary_handler(vault, caller, kind, ids))
    }

    /// Stakes companion certificates paired with primary certificates.
    ///
    /// Returns the total principal staked.
    pub fn stake_companion(&mut self, caller: Pubkey, pairs: &[CompanionPair]) -> Result<u64> {
        self.atomically(|vault| instructions::stake::companion_handler(vault, caller, pairs))
    }

    /// Unstakes self-stake principal back into the liquidity pool.
    pub fn unstake_self(&mut self, caller: Pubkey, amount: u64) -> Result<Settlement> {
        self.atomically(|vault| instructions::unstake::self_stake_handler(vault, caller, amount))
    }

    /// Unstakes primary certificates, returning principal to the liquidity
    /// pool and distributing the reward.
    pub fn unstake_primary(&mut self, caller: Pubkey, kind: PoolKind, ids: &[u64]) -> Result<Settlement> {
        self.atomically(|vault| instructions::unstake::primary_handler(vault, caller, kind, ids))
    }

    /// Unstakes companion certificates from their pairs.
    pub fn unstake_companion(&mut self, caller: Pubkey, ids: &[u64]) -> Result<Settlement> {
        self.atomically(|vault| instructions::unstake::companion_handler(vault, caller, ids))
    }

    /// Harvests self-stake rewards.
    pub fn claim_self(&mut self, caller: Pubkey) -> Result<Settlement> {
        self.atomically(|vault| instructions::claim::self_stake_handler(vault, caller))
    }

    /// Claims rewards for staked primary certificates without moving principal.
    pub fn claim_primary(&mut self, caller: Pubkey, kind: PoolKind, ids: &[u64]) -> Result<Settlement> {
        self.atomically(|vault| instructions::claim::primary_handler(vault, caller, kind, ids))
    }

    /// Claims rewards for staked companion certificates.
    pub fn claim_companion(&mut self, caller: Pubkey, ids: &[u64]) -> Result<Settlement> {
        self.atomically(|vault| instructions::claim::companion_handler(vault, caller, ids))
    }

    /// Runs the liquidity waterfall until `required` is idle in the
    /// liquidity pool or every source is exhausted.
    ///
    /// Returns the amount available, capped at `required`.
    pub fn withdraw_ape_coin(&mut self, caller: Pubkey, required: u64) -> Result<u64> {
        self.atomically(|vault| instructions::withdraw_ape_coin::handler(vault, caller, required))
    }

    /// Runs one batched compound pass.
    pub fn compound(&mut self, caller: Pubkey, args: &CompoundArgs) -> Result<CompoundReport> {
        self.atomically(|vault| instructions::compound::handler(vault, caller, args))
    }

    // ---------- administration ----------

    pub fn set_paused(&mut self, caller: Pubkey, paused: bool) -> Result<()> {
        self.atomically(|vault| instructions::admin::set_paused_handler(vault, caller, paused))
    }

    /// Updates the protocol fee rate, capped at 10%.
    pub fn set_fee_bps(&mut self, caller: Pubkey, fee_bps: u16) -> Result<()> {
        self.atomically(|vault| instructions::admin::set_fee_bps_handler(vault, caller, fee_bps))
    }

    pub fn set_fee_recipient(&mut self, caller: Pubkey, recipient: Option<Pubkey>) -> Result<()> {
        self.atomically(|vault| {
            instructions::admin::set_fee_recipient_handler(vault, caller, recipient)
        })
    }

    pub fn set_operator(&mut self, caller: Pubkey, operator: Pubkey) -> Result<()> {
        self.atomically(|vault| instructions::admin::set_operator_handler(vault, caller, operator))
    }

    /// Replaces the reward split strategy for a certificate class.
    pub fn set_reward_split(
        &mut self,
        caller: Pubkey,
        kind: PoolKind,
        split: Arc<dyn RewardSplit>,
    ) -> Result<()> {
        self.atomically(|vault| {
            instructions::admin::set_reward_split_handler(vault, caller, kind, split)
        })
    }

    pub fn transfer_authority(&mut self, caller: Pubkey, new_authority: Pubkey) -> Result<()> {
        self.atomically(|vault| {
            instructions::admin::transfer_authority_handler(vault, caller, new_authority)
        })
    }
}
