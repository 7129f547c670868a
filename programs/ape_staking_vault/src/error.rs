//! Error types for the ApeCoin staking vault.
//!
//! This module defines all custom error codes that can be returned by vault operations.
//! Each error has a unique code and descriptive message.
//!
//! ## Error Categories
//! - Input validation errors
//! - State/balance errors
//! - Reconciliation errors
//! - Math/overflow errors
//! - Authorization errors
//! - Custody errors
//!
//! `#[error_code]` numbers variants in declaration order.

use anchor_lang::prelude::*;

/// Custom error codes for the staking vault.
///
/// Error codes start at 6000 (Anchor's custom error offset) and follow
/// declaration order.
#[error_code]
pub enum VaultError {
    // ========== Input Validation Errors ==========

    /// [6000] Vault operations that add stake are currently paused.
    #[msg("Vault is currently paused")]
    VaultPaused,

    /// [6001] An id list or pair list was empty.
    #[msg("Input list must not be empty")]
    EmptyInput,

    /// [6002] Cannot stake, unstake or withdraw a zero amount.
    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    /// [6003] Fee exceeds the maximum allowed limit (10%).
    #[msg("Fee exceeds maximum allowed value of 1000 basis points (10%)")]
    FeeTooHigh,

    /// [6004] The same certificate appears twice in one call.
    #[msg("Duplicate certificate id in input")]
    DuplicateCertificate,

    /// [6005] Operation is not defined for this pool kind.
    #[msg("Invalid pool kind for this operation")]
    InvalidPoolKind,

    /// [6006] Split share exceeds 100%.
    #[msg("Reward split share exceeds 10000 basis points")]
    InvalidSplitShare,

    // ========== State/Balance Errors ==========

    /// [6007] Certificate already carries upstream stake.
    #[msg("Certificate is already staked upstream")]
    CertificateAlreadyStaked,

    /// [6008] Certificate is not staked by this vault.
    #[msg("Certificate is not staked")]
    CertificateNotStaked,

    /// [6009] Decrease would take a position below zero principal.
    #[msg("Position decrease exceeds staked principal")]
    PositionUnderflow,

    /// [6010] The liquidity pool cannot supply the amount needed.
    #[msg("Insufficient liquidity to fund stake")]
    InsufficientLiquidity,

    /// [6011] A balance is too small for the requested transfer.
    #[msg("Insufficient balance for transfer")]
    InsufficientBalance,

    /// [6012] Self-stake principal is smaller than the requested unstake.
    #[msg("Insufficient self-staked principal")]
    InsufficientSelfStake,

    /// [6013] Companion certificate is not paired with a primary certificate.
    #[msg("Companion certificate is not paired")]
    CompanionNotPaired,

    /// [6014] Primary certificate already has a staked companion.
    #[msg("Primary certificate is already paired")]
    PrimaryAlreadyPaired,

    // ========== Reconciliation Errors ==========

    /// [6015] Observed balance delta disagrees with expected principal + reward.
    #[msg("Balance delta does not match expected principal and reward")]
    ReconciliationMismatch,

    /// [6016] Ledger principal disagrees with upstream-attributed principal.
    #[msg("Ledger staked amount does not match upstream staked amount")]
    LedgerOutOfSync,

    /// [6017] Reward split returned more than the reward.
    #[msg("Reward split exceeds distributable reward")]
    SplitExceedsReward,

    // ========== Math/Overflow Errors ==========

    /// [6018] Arithmetic overflow occurred during calculation.
    #[msg("Arithmetic overflow occurred during calculation")]
    MathOverflow,

    /// [6019] Arithmetic underflow occurred during calculation.
    #[msg("Arithmetic underflow occurred during calculation")]
    MathUnderflow,

    /// [6020] Integer conversion failed (value out of range).
    #[msg("Integer conversion failed - value out of range")]
    ConversionOverflow,

    /// [6021] Ledger could not be serialized.
    #[msg("Ledger serialization failed")]
    SerializationFailed,

    // ========== Authorization Errors ==========

    /// [6022] Unauthorized - caller is not the vault authority.
    #[msg("Unauthorized: caller is not the vault authority")]
    Unauthorized,

    /// [6023] Caller is not the recorded owner of the certificate.
    #[msg("Unauthorized: caller is not the certificate owner")]
    NotCertificateOwner,

    /// [6024] Caller is neither the operator nor the recorded staker.
    #[msg("Unauthorized: caller is not the operator or certificate staker")]
    NotStakerOrOperator,

    /// [6025] Caller is not the operator.
    #[msg("Unauthorized: caller is not the operator")]
    NotOperator,

    /// [6026] Caller is neither the liquidity pool nor the operator.
    #[msg("Unauthorized: caller is not the liquidity pool or operator")]
    NotLiquidityPool,

    // ========== Custody Errors ==========

    /// [6027] Only the three certificate classes may be held in custody.
    #[msg("Unsupported certificate class")]
    UnsupportedCertificate,

    /// [6028] Certificate has no custody record in this vault.
    #[msg("Certificate is not held in custody")]
    CertificateNotInCustody,

    /// [6029] Certificate is not owned by the party moving it.
    #[msg("Certificate transfer from non-owner")]
    CertificateTransferDenied,
}
