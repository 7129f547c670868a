//! Compound instruction handler.
//!
//! One batched maintenance pass run periodically by the operator.

use anchor_lang::prelude::*;

use crate::instructions::claim::{claim_certificates, harvest_self};
use crate::instructions::stake::{stake_certificates, stake_companions, stake_self, CompanionPair};
use crate::instructions::unstake::{exit_companions, exit_primary, route_exits};
use crate::instructions::withdraw_refund::drain_refunds;
use crate::interfaces::*;
use crate::state::PoolKind;
use crate::vault::{checked_sum, require_unique_ids, Settlement, Vault};

/// Certificate ids per certificate class.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateSets {
    pub primary_a: Vec<u64>,
    pub primary_b: Vec<u64>,
    pub companion: Vec<u64>,
}

impl CertificateSets {
    fn by_kind(&self) -> [(PoolKind, &[u64]); 3] {
        [
            (PoolKind::PrimaryA, self.primary_a.as_slice()),
            (PoolKind::PrimaryB, self.primary_b.as_slice()),
            (PoolKind::Companion, self.companion.as_slice()),
        ]
    }
}

/// Certificates to stake, companions given with the primary they pair with.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct StakeSets {
    pub primary_a: Vec<u64>,
    pub primary_b: Vec<u64>,
    pub companion: Vec<CompanionPair>,
}

/// Arguments of a compound pass.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompoundArgs {
    /// Harvest self-stake rewards.
    pub claim_self: bool,
    pub claim: CertificateSets,
    pub unstake: CertificateSets,
    pub stake: StakeSets,
    /// Idle liquidity above this is staked into the self-stake pool.
    pub self_stake_threshold: u64,
}

/// Summary of a compound pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompoundReport {
    pub refunds_drained: u64,
    pub realized: Settlement,
    pub staked: u64,
    pub self_staked: u64,
    pub fee_flushed: u64,
}

/// Run a compound pass.
///
/// Steps always run in this order: drain refunds, harvest self-stake
/// rewards, claim, unstake, stake, stake idle liquidity, flush the fee.
/// Refunds may supply liquidity and unstakes free capacity, so both must
/// land before any new stake is funded.
///
/// # Arguments
/// * `vault` - Vault context
/// * `caller` - Must be the operator
/// * `args` - Certificate sets and thresholds for this pass
///
/// # Returns
/// What the pass realized and staked
pub fn handler<E: Environment>(
    vault: &mut Vault<E>,
    caller: Pubkey,
    args: &CompoundArgs,
) -> Result<CompoundReport> {
    vault.require_not_paused()?;
    vault.require_operator(&caller)?;

    let mut report = CompoundReport {
        refunds_drained: drain_refunds(vault)?,
        ..CompoundReport::default()
    };

    if args.claim_self {
        report.realized.merge(harvest_self(vault)?)?;
    }

    for (kind, ids) in args.claim.by_kind() {
        if ids.is_empty() {
            continue;
        }
        require_unique_ids(ids)?;
        report.realized.merge(claim_certificates(vault, kind, ids)?)?;
    }

    for (kind, ids) in args.unstake.by_kind() {
        if ids.is_empty() {
            continue;
        }
        require_unique_ids(ids)?;
        let exits = match kind {
            PoolKind::Companion => exit_companions(vault, ids)?,
            _ => exit_primary(vault, kind, ids)?,
        };
        report.realized.merge(route_exits(vault, kind, &exits)?)?;
    }

    for (kind, ids) in [
        (PoolKind::PrimaryA, &args.stake.primary_a),
        (PoolKind::PrimaryB, &args.stake.primary_b),
    ] {
        if ids.is_empty() {
            continue;
        }
        require_unique_ids(ids)?;
        report.staked = checked_sum(report.staked, stake_certificates(vault, kind, ids)?)?;
    }
    if !args.stake.companion.is_empty() {
        let ids: Vec<u64> = args
            .stake
            .companion
            .iter()
            .map(|pair| pair.companion_token_id)
            .collect();
        require_unique_ids(&ids)?;
        report.staked = checked_sum(report.staked, stake_companions(vault, &args.stake.companion)?)?;
    }

    let idle = vault.env.pending_ape_coin();
    if idle > args.self_stake_threshold {
        stake_self(vault, idle)?;
        report.self_staked = idle;
    }

    report.fee_flushed = vault.flush_fee_if_due()?;

    msg!("Compound complete");
    msg!(
        "Refunds {}, reward {}, staked {}, self-staked {}, fee flushed {}",
        report.refunds_drained,
        report.realized.reward,
        report.staked,
        report.self_staked,
        report.fee_flushed
    );

    Ok(report)
}
