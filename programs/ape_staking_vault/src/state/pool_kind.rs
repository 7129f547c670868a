use anchor_lang::prelude::*;

/// The four upstream pools the vault stakes into.
#[derive(
    AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum PoolKind {
    /// Fungible-only pool (upstream pool id 0).
    SelfStake,
    /// First primary certificate class (upstream pool id 1).
    PrimaryA,
    /// Second primary certificate class (upstream pool id 2).
    PrimaryB,
    /// Companion class, staked paired with a primary certificate (upstream pool id 3).
    Companion,
}

impl PoolKind {
    pub const ALL: [PoolKind; 4] = [
        PoolKind::SelfStake,
        PoolKind::PrimaryA,
        PoolKind::PrimaryB,
        PoolKind::Companion,
    ];

    /// Pool id used by the upstream staking protocol.
    pub fn pool_id(self) -> u8 {
        match self {
            PoolKind::SelfStake => 0,
            PoolKind::PrimaryA => 1,
            PoolKind::PrimaryB => 2,
            PoolKind::Companion => 3,
        }
    }

    /// True for the classes the vault accepts into custody.
    pub fn is_certificate(self) -> bool {
        self != PoolKind::SelfStake
    }

    pub fn is_primary(self) -> bool {
        matches!(self, PoolKind::PrimaryA | PoolKind::PrimaryB)
    }
}
