//! Vault constants.
//!
//! This module defines all constant values used throughout the vault,
//! including reward periods, fee limits, and precision values.

/// Length of one upstream reward period in seconds (one hour)
pub const SECONDS_PER_PERIOD: i64 = 3_600;

/// Basis points denominator (100% = 10000 basis points)
pub const BASIS_POINTS_DENOMINATOR: u64 = 10_000;

/// Maximum allowed protocol fee (10% = 1000 basis points)
pub const MAX_FEE_BPS: u16 = 1_000;

/// Default protocol fee charged on realized rewards (2.5% = 250 basis points)
pub const DEFAULT_FEE_BPS: u16 = 250;

/// Pending fee is flushed to the recipient once it exceeds this amount
pub const DEFAULT_FEE_FLUSH_THRESHOLD: u64 = 1_000_000_000;

/// Default share of post-fee rewards routed to certificate holders (50%)
pub const DEFAULT_NFT_SHARE_BPS: u16 = 5_000;

/// Precision multiplier for accumulators and reward debt
pub const PRECISION: u128 = 1_000_000_000_000; // 10^12

/// Start of the reward period containing `timestamp`.
pub fn period_start(timestamp: i64) -> i64 {
    timestamp - timestamp.rem_euclid(SECONDS_PER_PERIOD)
}
