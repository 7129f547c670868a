//! In-memory collaborators for integration tests.
//!
//! `MockEnv` models the upstream staking protocol with hourly reward
//! periods, a token ledger, the liquidity pool, the certificate reward pool
//! and certificate custody.

#![allow(dead_code)]

use std::collections::BTreeMap;

use anchor_lang::prelude::*;
use ape_staking_vault::constants::{period_start, PRECISION, SECONDS_PER_PERIOD};
use ape_staking_vault::*;

/// Start of the test timeline, aligned to a reward period.
pub const GENESIS: i64 = 1_000 * SECONDS_PER_PERIOD;

/// Upstream reserve funding rewards.
pub const RESERVE: u64 = 1_000_000_000;

#[derive(Clone, Copy, Debug, Default)]
pub struct MockStake {
    pub staked: u64,
    pub debt: i128,
}

#[derive(Clone, Debug, Default)]
pub struct MockPool {
    pub state: PoolState,
    pub rate_per_period: u64,
    pub cap: u64,
}

#[derive(Clone, Debug)]
pub struct MockEnv {
    pub now: i64,
    pub lp: Pubkey,
    pub nft_pool: Pubkey,
    pub upstream: Pubkey,
    pub balances: BTreeMap<Pubkey, u64>,
    pub pools: BTreeMap<PoolKind, MockPool>,
    pub stakes: BTreeMap<(PoolKind, u64), MockStake>,
    pub self_stakes: BTreeMap<Pubkey, MockStake>,
    pub pairs: BTreeMap<(PoolKind, u64), u64>,
    pub pair_of: BTreeMap<u64, (PoolKind, u64)>,
    pub owners: BTreeMap<(PoolKind, u64), Pubkey>,
    pub delegations: BTreeMap<(PoolKind, u64, Pubkey), bool>,
    pub certificate_rewards: BTreeMap<PoolKind, u64>,
    /// Extra amount paid on every withdrawal, to simulate upstream drift.
    pub withdraw_bonus: u64,
}

impl MockEnv {
    pub fn new() -> Self {
        let upstream = Pubkey::new_unique();
        let mut balances = BTreeMap::new();
        balances.insert(upstream, RESERVE);
        let pools = PoolKind::ALL
            .into_iter()
            .map(|kind| {
                let pool = MockPool {
                    state: PoolState {
                        staked_amount: 0,
                        accumulated_rewards_per_share: 0,
                        last_rewarded_timestamp: GENESIS,
                    },
                    rate_per_period: 0,
                    cap: 0,
                };
                (kind, pool)
            })
            .collect();
        Self {
            now: GENESIS,
            lp: Pubkey::new_unique(),
            nft_pool: Pubkey::new_unique(),
            upstream,
            balances,
            pools,
            stakes: BTreeMap::new(),
            self_stakes: BTreeMap::new(),
            pairs: BTreeMap::new(),
            pair_of: BTreeMap::new(),
            owners: BTreeMap::new(),
            delegations: BTreeMap::new(),
            certificate_rewards: BTreeMap::new(),
            withdraw_bonus: 0,
        }
    }

    pub fn configure_pool(&mut self, kind: PoolKind, rate_per_period: u64, cap: u64) {
        let pool = self.pool_mut(kind);
        pool.rate_per_period = rate_per_period;
        pool.cap = cap;
    }

    /// Principal staked by other participants of the upstream pool.
    pub fn add_external_stake(&mut self, kind: PoolKind, amount: u64) {
        self.update_pool(kind);
        self.pool_mut(kind).state.staked_amount += amount;
    }

    pub fn mint(&mut self, to: &Pubkey, amount: u64) {
        *self.balances.entry(*to).or_default() += amount;
    }

    pub fn mint_certificate(&mut self, kind: PoolKind, id: u64, owner: &Pubkey) {
        self.owners.insert((kind, id), *owner);
    }

    /// Moves the clock forward by whole periods plus a minute.
    pub fn advance_periods(&mut self, periods: i64) {
        self.now += periods * SECONDS_PER_PERIOD + 60;
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut MockPool {
        self.pools.entry(kind).or_default()
    }

    fn pool(&self, kind: PoolKind) -> MockPool {
        self.pools.get(&kind).cloned().unwrap_or_default()
    }

    fn periods_between(from: i64, to: i64) -> u64 {
        let span = period_start(to) - period_start(from);
        (span.max(0) / SECONDS_PER_PERIOD) as u64
    }

    /// Accumulator as the pool would have it after an update right now.
    fn current_accumulator(&self, kind: PoolKind) -> u128 {
        let pool = self.pool(kind);
        let last = pool.state.last_rewarded_timestamp;
        let to = period_start(self.now);
        if to <= last || pool.state.staked_amount == 0 {
            return pool.state.accumulated_rewards_per_share;
        }
        let rewards = self.rewards_by(kind, last, to);
        pool.state.accumulated_rewards_per_share
            + u128::from(rewards) * PRECISION / u128::from(pool.state.staked_amount)
    }

    fn update_pool(&mut self, kind: PoolKind) {
        let accumulator = self.current_accumulator(kind);
        let to = period_start(self.now);
        let pool = self.pool_mut(kind);
        pool.state.accumulated_rewards_per_share = accumulator;
        if to > pool.state.last_rewarded_timestamp {
            pool.state.last_rewarded_timestamp = to;
        }
    }

    fn pending_of(stake: MockStake, accumulator: u128) -> u64 {
        let accrued = i128::from(stake.staked) * accumulator as i128;
        ((accrued - stake.debt).max(0) / PRECISION as i128) as u64
    }

    fn pay_out(&mut self, to: &Pubkey, amount: u64) -> Result<()> {
        let upstream = self.upstream;
        self.transfer(&upstream, to, amount)
    }

    fn stake_in(&mut self, kind: PoolKind, holder: &Pubkey, key: Option<u64>, amount: u64) -> Result<()> {
        let upstream = self.upstream;
        self.transfer(holder, &upstream, amount)?;
        let accumulator = self.pool(kind).state.accumulated_rewards_per_share;
        let stake = match key {
            Some(id) => self.stakes.entry((kind, id)).or_default(),
            None => self.self_stakes.entry(*holder).or_default(),
        };
        stake.staked += amount;
        stake.debt += i128::from(amount) * accumulator as i128;
        self.pool_mut(kind).state.staked_amount += amount;
        Ok(())
    }

    /// Withdraws principal; a full withdrawal also pays the pending reward.
    fn withdraw_from(&mut self, kind: PoolKind, holder: &Pubkey, key: Option<u64>, amount: u64) -> Result<()> {
        let accumulator = self.pool(kind).state.accumulated_rewards_per_share;
        let current = match key {
            Some(id) => self.stakes.get(&(kind, id)).copied(),
            None => self.self_stakes.get(holder).copied(),
        }
        .unwrap_or_default();
        require!(amount <= current.staked, VaultError::InsufficientBalance);

        let mut payout = amount + self.withdraw_bonus;
        let remaining = if amount == current.staked {
            payout += Self::pending_of(current, accumulator);
            None
        } else {
            Some(MockStake {
                staked: current.staked - amount,
                debt: current.debt - i128::from(amount) * accumulator as i128,
            })
        };
        match (key, remaining) {
            (Some(id), Some(stake)) => {
                self.stakes.insert((kind, id), stake);
            }
            (Some(id), None) => {
                self.stakes.remove(&(kind, id));
            }
            (None, Some(stake)) => {
                self.self_stakes.insert(*holder, stake);
            }
            (None, None) => {
                self.self_stakes.remove(holder);
            }
        }
        self.pool_mut(kind).state.staked_amount -= amount;
        self.pay_out(holder, payout)
    }

    fn claim_from(&mut self, kind: PoolKind, holder: &Pubkey, key: Option<u64>) -> Result<()> {
        let accumulator = self.pool(kind).state.accumulated_rewards_per_share;
        let stake = match key {
            Some(id) => self.stakes.get_mut(&(kind, id)),
            None => self.self_stakes.get_mut(holder),
        };
        let Some(stake) = stake else {
            return Ok(());
        };
        let reward = Self::pending_of(*stake, accumulator);
        stake.debt = i128::from(stake.staked) * accumulator as i128;
        self.pay_out(holder, reward)
    }

    fn require_owner(&self, kind: PoolKind, id: u64, holder: &Pubkey) -> Result<()> {
        require!(
            self.owners.get(&(kind, id)) == Some(holder),
            VaultError::CertificateTransferDenied
        );
        Ok(())
    }

    fn pair_commands(
        primary_a: &[PairNft],
        primary_b: &[PairNft],
    ) -> Vec<(PoolKind, PairNft)> {
        primary_a
            .iter()
            .map(|pair| (PoolKind::PrimaryA, *pair))
            .chain(primary_b.iter().map(|pair| (PoolKind::PrimaryB, *pair)))
            .collect()
    }
}

impl ApeCoinStaking for MockEnv {
    fn pool_state(&self, kind: PoolKind) -> PoolState {
        self.pool(kind).state
    }

    fn rewards_by(&self, kind: PoolKind, from: i64, to: i64) -> u64 {
        Self::periods_between(from, to) * self.pool(kind).rate_per_period
    }

    fn cap_per_position(&self, kind: PoolKind) -> u64 {
        self.pool(kind).cap
    }

    fn staked_principal(&self, kind: PoolKind, token_id: u64) -> u64 {
        self.stakes
            .get(&(kind, token_id))
            .map(|stake| stake.staked)
            .unwrap_or_default()
    }

    fn self_staked(&self, holder: &Pubkey) -> u64 {
        self.self_stakes
            .get(holder)
            .map(|stake| stake.staked)
            .unwrap_or_default()
    }

    fn pending_rewards(&self, kind: PoolKind, token_id: u64) -> u64 {
        self.stakes
            .get(&(kind, token_id))
            .map(|stake| Self::pending_of(*stake, self.current_accumulator(kind)))
            .unwrap_or_default()
    }

    fn self_pending_rewards(&self, holder: &Pubkey) -> u64 {
        self.self_stakes
            .get(holder)
            .map(|stake| Self::pending_of(*stake, self.current_accumulator(PoolKind::SelfStake)))
            .unwrap_or_default()
    }

    fn paired_companion(&self, primary: PoolKind, main_token_id: u64) -> Option<u64> {
        self.pairs.get(&(primary, main_token_id)).copied()
    }

    fn paired_primary(&self, companion_token_id: u64) -> Option<(PoolKind, u64)> {
        self.pair_of.get(&companion_token_id).copied()
    }

    fn deposit_self(&mut self, holder: &Pubkey, amount: u64) -> Result<()> {
        self.update_pool(PoolKind::SelfStake);
        self.stake_in(PoolKind::SelfStake, holder, None, amount)
    }

    fn withdraw_self(&mut self, holder: &Pubkey, amount: u64) -> Result<()> {
        self.update_pool(PoolKind::SelfStake);
        self.withdraw_from(PoolKind::SelfStake, holder, None, amount)
    }

    fn claim_self(&mut self, holder: &Pubkey) -> Result<()> {
        self.update_pool(PoolKind::SelfStake);
        self.claim_from(PoolKind::SelfStake, holder, None)
    }

    fn deposit_nfts(&mut self, holder: &Pubkey, kind: PoolKind, nfts: &[SingleNft]) -> Result<()> {
        self.update_pool(kind);
        for nft in nfts {
            self.require_owner(kind, nft.token_id, holder)?;
            require!(nft.amount <= self.pool(kind).cap, VaultError::InsufficientBalance);
            self.stake_in(kind, holder, Some(nft.token_id), nft.amount)?;
        }
        Ok(())
    }

    fn withdraw_nfts(&mut self, holder: &Pubkey, kind: PoolKind, nfts: &[SingleNft]) -> Result<()> {
        self.update_pool(kind);
        for nft in nfts {
            self.require_owner(kind, nft.token_id, holder)?;
            self.withdraw_from(kind, holder, Some(nft.token_id), nft.amount)?;
        }
        Ok(())
    }

    fn claim_nfts(&mut self, holder: &Pubkey, kind: PoolKind, token_ids: &[u64]) -> Result<()> {
        self.update_pool(kind);
        for &id in token_ids {
            self.require_owner(kind, id, holder)?;
            self.claim_from(kind, holder, Some(id))?;
        }
        Ok(())
    }

    fn deposit_pairs(&mut self, holder: &Pubkey, primary_a: &[PairNft], primary_b: &[PairNft]) -> Result<()> {
        let kind = PoolKind::Companion;
        self.update_pool(kind);
        for (primary, pair) in Self::pair_commands(primary_a, primary_b) {
            self.require_owner(primary, pair.main_token_id, holder)?;
            self.require_owner(kind, pair.companion_token_id, holder)?;
            self.stake_in(kind, holder, Some(pair.companion_token_id), pair.amount)?;
            self.pairs
                .insert((primary, pair.main_token_id), pair.companion_token_id);
            self.pair_of
                .insert(pair.companion_token_id, (primary, pair.main_token_id));
        }
        Ok(())
    }

    fn withdraw_pairs(&mut self, holder: &Pubkey, primary_a: &[PairNft], primary_b: &[PairNft]) -> Result<()> {
        let kind = PoolKind::Companion;
        self.update_pool(kind);
        for (primary, pair) in Self::pair_commands(primary_a, primary_b) {
            self.require_owner(kind, pair.companion_token_id, holder)?;
            require!(
                self.pair_of.get(&pair.companion_token_id) == Some(&(primary, pair.main_token_id)),
                VaultError::CompanionNotPaired
            );
            self.withdraw_from(kind, holder, Some(pair.companion_token_id), pair.amount)?;
            if self.staked_principal(kind, pair.companion_token_id) == 0 {
                self.pairs.remove(&(primary, pair.main_token_id));
                self.pair_of.remove(&pair.companion_token_id);
            }
        }
        Ok(())
    }

    fn claim_pairs(&mut self, holder: &Pubkey, primary_a: &[PairNft], primary_b: &[PairNft]) -> Result<()> {
        let kind = PoolKind::Companion;
        self.update_pool(kind);
        for (_, pair) in Self::pair_commands(primary_a, primary_b) {
            self.require_owner(kind, pair.companion_token_id, holder)?;
            self.claim_from(kind, holder, Some(pair.companion_token_id))?;
        }
        Ok(())
    }
}

impl ApeCoin for MockEnv {
    fn balance_of(&self, holder: &Pubkey) -> u64 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: &Pubkey, to: &Pubkey, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let source = self.balance_of(from);
        require!(source >= amount, VaultError::InsufficientBalance);
        self.balances.insert(*from, source - amount);
        *self.balances.entry(*to).or_default() += amount;
        Ok(())
    }
}

impl LiquidityPool for MockEnv {
    fn liquidity_pool_address(&self) -> Pubkey {
        self.lp
    }

    fn pending_ape_coin(&self) -> u64 {
        self.balance_of(&self.lp)
    }

    fn pull_ape_coin(&mut self, to: &Pubkey, amount: u64) -> Result<()> {
        let lp = self.lp;
        self.transfer(&lp, to, amount)
    }

    fn receive_ape_coin(&mut self, from: &Pubkey, amount: u64) -> Result<()> {
        let lp = self.lp;
        self.transfer(from, &lp, amount)
    }
}

impl CertificatePool for MockEnv {
    fn receive_certificate_rewards(&mut self, from: &Pubkey, kind: PoolKind, amount: u64) -> Result<()> {
        let nft_pool = self.nft_pool;
        self.transfer(from, &nft_pool, amount)?;
        *self.certificate_rewards.entry(kind).or_default() += amount;
        Ok(())
    }
}

impl CertificateCustody for MockEnv {
    fn owner_of(&self, kind: PoolKind, token_id: u64) -> Option<Pubkey> {
        self.owners.get(&(kind, token_id)).copied()
    }

    fn transfer_certificate(&mut self, kind: PoolKind, token_id: u64, from: &Pubkey, to: &Pubkey) -> Result<()> {
        self.require_owner(kind, token_id, from)?;
        self.owners.insert((kind, token_id), *to);
        Ok(())
    }
}

impl DelegationRegistry for MockEnv {
    fn set_delegate(
        &mut self,
        vault: &Pubkey,
        delegate: &Pubkey,
        kind: PoolKind,
        token_id: u64,
        enabled: bool,
    ) -> Result<()> {
        self.require_owner(kind, token_id, vault)?;
        self.delegations.insert((kind, token_id, *delegate), enabled);
        Ok(())
    }
}

impl TimeSource for MockEnv {
    fn now(&self) -> i64 {
        self.now
    }
}

/// A vault over `MockEnv` with named participants.
pub struct Harness {
    pub vault: Vault<MockEnv>,
    pub authority: Pubkey,
    pub operator: Pubkey,
}

impl Harness {
    pub fn new(env: MockEnv) -> Self {
        let authority = Pubkey::new_unique();
        let operator = Pubkey::new_unique();
        let vault = Vault::new(
            Pubkey::new_unique(),
            VaultConfig::new(authority, operator),
            env,
        )
        .unwrap();
        Self {
            vault,
            authority,
            operator,
        }
    }

    /// A harness with no protocol fee.
    pub fn without_fee(env: MockEnv) -> Self {
        let mut harness = Self::new(env);
        harness.vault.set_fee_bps(harness.authority, 0).unwrap();
        harness
    }

    pub fn env(&self) -> &MockEnv {
        self.vault.environment()
    }

    pub fn env_mut(&mut self) -> &mut MockEnv {
        self.vault.environment_mut()
    }

    pub fn address(&self) -> Pubkey {
        self.vault.address()
    }

    pub fn lp_balance(&self) -> u64 {
        self.env().pending_ape_coin()
    }

    /// Mints certificates to `owner` and deposits them under `staker`.
    pub fn deposit(&mut self, owner: &Pubkey, staker: &Pubkey, kind: PoolKind, ids: &[u64]) {
        for &id in ids {
            self.env_mut().mint_certificate(kind, id, owner);
        }
        self.vault.deposit(*owner, kind, ids, *staker).unwrap();
    }

    /// Sum of ledger principal equals upstream principal attributed to the vault.
    pub fn assert_in_sync(&self) {
        for kind in PoolKind::ALL {
            let ledger = self.vault.total_staked(kind).unwrap();
            let upstream: u64 = if kind == PoolKind::SelfStake {
                self.env().self_staked(&self.address())
            } else {
                self.vault
                    .staked_ids(kind)
                    .iter()
                    .map(|&id| self.env().staked_principal(kind, id))
                    .sum()
            };
            assert_eq!(ledger, upstream, "{:?} ledger out of sync", kind);
        }
    }
}

/// `PrimaryA` #1 at 350 and `PrimaryB` #10 at 200, each paired with a
/// staked companion (#70 and #71, 100 each) in a single batch. The
/// liquidity pool is empty afterwards and the protocol fee is zero.
pub fn mixed_companion_vault(companion_rate: u64) -> (Harness, Pubkey) {
    let mut env = MockEnv::new();
    env.configure_pool(PoolKind::PrimaryA, 0, 350);
    env.configure_pool(PoolKind::PrimaryB, 0, 200);
    env.configure_pool(PoolKind::Companion, companion_rate, 100);
    let lp = env.lp;
    env.mint(&lp, 350 + 200 + 2 * 100);

    let mut h = Harness::without_fee(env);
    let staker = Pubkey::new_unique();
    h.deposit(&staker, &staker, PoolKind::PrimaryA, &[1]);
    h.deposit(&staker, &staker, PoolKind::PrimaryB, &[10]);
    h.deposit(&staker, &staker, PoolKind::Companion, &[70, 71]);
    let operator = h.operator;
    h.vault
        .stake_primary(operator, PoolKind::PrimaryA, &[1])
        .unwrap();
    h.vault
        .stake_primary(operator, PoolKind::PrimaryB, &[10])
        .unwrap();
    let pairs = [
        CompanionPair {
            primary: PoolKind::PrimaryA,
            main_token_id: 1,
            companion_token_id: 70,
        },
        CompanionPair {
            primary: PoolKind::PrimaryB,
            main_token_id: 10,
            companion_token_id: 71,
        },
    ];
    assert_eq!(h.vault.stake_companion(operator, &pairs).unwrap(), 200);
    assert_eq!(h.env().paired_primary(70), Some((PoolKind::PrimaryA, 1)));
    assert_eq!(h.env().paired_primary(71), Some((PoolKind::PrimaryB, 10)));
    assert_eq!(h.lp_balance(), 0);
    (h, staker)
}

pub fn assert_error(result: Result<impl std::fmt::Debug>, expected: VaultError) {
    let err = result.unwrap_err();
    assert_eq!(err, Error::from(expected));
}
