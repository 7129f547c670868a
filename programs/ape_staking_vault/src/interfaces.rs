//! Collaborator interfaces.
//!
//! The vault never holds upstream or token state itself. Everything it
//! observes or moves goes through these traits, which tests implement with an
//! in-memory environment.

use anchor_lang::prelude::*;

use crate::state::{PoolKind, PoolState};

/// One certificate and the amount to stake or withdraw for it.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleNft {
    pub token_id: u64,
    pub amount: u64,
}

/// A primary certificate paired with a companion certificate.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairNft {
    pub main_token_id: u64,
    pub companion_token_id: u64,
    pub amount: u64,
}

/// Upstream staking protocol.
///
/// Commands return only after the resulting token movement is visible
/// through [`ApeCoin::balance_of`].
pub trait ApeCoinStaking {
    fn pool_state(&self, kind: PoolKind) -> PoolState;

    /// Rewards the pool distributes over `[from, to)`.
    fn rewards_by(&self, kind: PoolKind, from: i64, to: i64) -> u64;

    /// Maximum principal a single certificate may carry.
    fn cap_per_position(&self, kind: PoolKind) -> u64;

    /// Principal currently staked on a certificate.
    fn staked_principal(&self, kind: PoolKind, token_id: u64) -> u64;

    /// Principal the holder has staked in the self-stake pool.
    fn self_staked(&self, holder: &Pubkey) -> u64;

    fn pending_rewards(&self, kind: PoolKind, token_id: u64) -> u64;

    fn self_pending_rewards(&self, holder: &Pubkey) -> u64;

    /// Companion certificate currently paired with a primary certificate.
    fn paired_companion(&self, primary: PoolKind, main_token_id: u64) -> Option<u64>;

    /// Primary certificate a companion certificate is paired with.
    fn paired_primary(&self, companion_token_id: u64) -> Option<(PoolKind, u64)>;

    fn deposit_self(&mut self, holder: &Pubkey, amount: u64) -> Result<()>;

    /// Withdraws principal; rewards are paid as well when the position is emptied.
    fn withdraw_self(&mut self, holder: &Pubkey, amount: u64) -> Result<()>;

    fn claim_self(&mut self, holder: &Pubkey) -> Result<()>;

    fn deposit_nfts(&mut self, holder: &Pubkey, kind: PoolKind, nfts: &[SingleNft]) -> Result<()>;

    /// Withdraws certificate principal together with its pending rewards.
    fn withdraw_nfts(&mut self, holder: &Pubkey, kind: PoolKind, nfts: &[SingleNft]) -> Result<()>;

    fn claim_nfts(&mut self, holder: &Pubkey, kind: PoolKind, token_ids: &[u64]) -> Result<()>;

    fn deposit_pairs(
        &mut self,
        holder: &Pubkey,
        primary_a_pairs: &[PairNft],
        primary_b_pairs: &[PairNft],
    ) -> Result<()>;

    fn withdraw_pairs(
        &mut self,
        holder: &Pubkey,
        primary_a_pairs: &[PairNft],
        primary_b_pairs: &[PairNft],
    ) -> Result<()>;

    fn claim_pairs(
        &mut self,
        holder: &Pubkey,
        primary_a_pairs: &[PairNft],
        primary_b_pairs: &[PairNft],
    ) -> Result<()>;
}

/// The fungible reward-bearing token.
pub trait ApeCoin {
    fn balance_of(&self, holder: &Pubkey) -> u64;

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()>;
}

/// Pool holding idle ApeCoin on behalf of ordinary users.
pub trait LiquidityPool {
    fn liquidity_pool_address(&self) -> Pubkey;

    /// Idle balance available to be pulled.
    fn pending_ape_coin(&self) -> u64;

    /// Moves `amount` from the liquidity pool to `to`.
    fn pull_ape_coin(&mut self, to: &Pubkey, amount: u64) -> Result<()>;

    /// Moves `amount` from `from` into the liquidity pool.
    fn receive_ape_coin(&mut self, from: &Pubkey, amount: u64) -> Result<()>;
}

/// Pool receiving the certificate holders' share of rewards.
pub trait CertificatePool {
    fn receive_certificate_rewards(
        &mut self,
        from: &Pubkey,
        kind: PoolKind,
        amount: u64,
    ) -> Result<()>;
}

/// Non-fungible custody transfers.
pub trait CertificateCustody {
    fn owner_of(&self, kind: PoolKind, token_id: u64) -> Option<Pubkey>;

    fn transfer_certificate(
        &mut self,
        kind: PoolKind,
        token_id: u64,
        from: &Pubkey,
        to: &Pubkey,
    ) -> Result<()>;
}

pub trait DelegationRegistry {
    fn set_delegate(
        &mut self,
        vault: &Pubkey,
        delegate: &Pubkey,
        kind: PoolKind,
        token_id: u64,
        enabled: bool,
    ) -> Result<()>;
}

pub trait TimeSource {
    /// Current unix timestamp.
    fn now(&self) -> i64;
}

/// Every collaborator the vault talks to.
///
/// `Clone` is required so an operation can run against a staged copy and be
/// discarded on failure.
pub trait Environment:
    ApeCoinStaking
    + ApeCoin
    + LiquidityPool
    + CertificatePool
    + CertificateCustody
    + DelegationRegistry
    + TimeSource
    + Clone
{
}

impl<T> Environment for T where
    T: ApeCoinStaking
        + ApeCoin
        + LiquidityPool
        + CertificatePool
        + CertificateCustody
        + DelegationRegistry
        + TimeSource
        + Clone
{
}
