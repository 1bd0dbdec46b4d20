//! Deposit and withdrawal failure reasons.

use thiserror::Error;

use mixer_circuits::Amount;

/// Why a deposit was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DepositError {
    #[error("Commitment must be non-zero")]
    ZeroCommitment,
    #[error("Deposit must be exactly {expected}, got {got}")]
    WrongDenomination { expected: Amount, got: Amount },
    #[error("Commitment is already in the tree")]
    DuplicateCommitment,
    #[error("Merkle tree is full ({capacity} leaves)")]
    CapacityExceeded { capacity: u64 },
    #[error("Pool custody would exceed {max} base units", max = Amount::MAX)]
    CustodyOverflow,
}

impl DepositError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            DepositError::ZeroCommitment => "zero_commitment",
            DepositError::WrongDenomination { .. } => "wrong_denomination",
            DepositError::DuplicateCommitment => "duplicate_commitment",
            DepositError::CapacityExceeded { .. } => "capacity_exceeded",
            DepositError::CustodyOverflow => "custody_overflow",
        }
    }
}

/// Why a withdrawal was rejected.
///
/// A rejection never changes pool state, and none of these succeed on a
/// plain retry: `UnknownRoot` needs a proof against a newer root, the others
/// cannot succeed with the same request at all. `OutOfOrder` means the
/// caller skipped or repeated a gate step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Fee {fee} exceeds denomination {denomination}")]
    FeeExceedsDenomination { fee: Amount, denomination: Amount },
    #[error("Cannot find your merkle root")]
    UnknownRoot,
    #[error("The note has been already spent")]
    AlreadySpent,
    #[error("Invalid withdraw proof")]
    InvalidProof,
    #[error("Withdrawal is {actual}, step requires {expected}")]
    OutOfOrder {
        expected: &'static str,
        actual: &'static str,
    },
}

impl RejectReason {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::FeeExceedsDenomination { .. } => "fee_exceeds_denomination",
            RejectReason::UnknownRoot => "unknown_root",
            RejectReason::AlreadySpent => "already_spent",
            RejectReason::InvalidProof => "invalid_proof",
            RejectReason::OutOfOrder { .. } => "out_of_order",
        }
    }
}
