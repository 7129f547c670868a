//! State structures for the ApeCoin staking vault.
//!
//! This module defines the ledger records, the orchestrator's aggregate
//! bookkeeping and the vault configuration.

pub mod config;
pub mod custody;
pub mod ledger;
pub mod pool_kind;
pub mod pool_state;
pub mod position;
pub mod stake_book;

pub use config::*;
pub use custody::*;
pub use ledger::*;
pub use pool_kind::*;
pub use pool_state::*;
pub use position::*;
pub use stake_book::*;
