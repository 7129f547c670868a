//! Instruction handlers for the ApeCoin staking vault.
//!
//! Depositor-facing custody operations and the operator-driven stake
//! orchestration. Handlers mutate the vault in place; atomicity is applied
//! by the public entry points in the crate root.

pub mod admin;
pub mod claim;
pub mod compound;
pub mod delegate;
pub mod deposit;
pub mod stake;
pub mod unstake;
pub mod withdraw;
pub mod withdraw_ape_coin;
pub mod withdraw_refund;

pub use compound::{CertificateSets, CompoundArgs, CompoundReport, StakeSets};
pub use stake::CompanionPair;
