//! Vault error taxonomy.
//!
//! Every operation failure is a typed value. Only initialization failures are
//! fatal: they keep a `Vault` from being constructed at all.

use crate::ledger::{LedgerError, Tokens};
use crate::membership::Principal;
use crate::proposals::ProposalId;
use crate::randomness::RandomnessError;
use serde::{Deserialize, Serialize};

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Coarse error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authorization,
    NotFound,
    StateConflict,
    ExternalFailure,
}

/// Vault operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("{0} is not a signer")]
    NotASigner(Principal),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(ProposalId),

    #[error("Proposal {0} is closed")]
    ProposalClosed(ProposalId),

    #[error("{voter} already voted on proposal {proposal}")]
    AlreadyVoted {
        proposal: ProposalId,
        voter: Principal,
    },

    #[error("Threshold {threshold} is invalid for {signer_count} signers")]
    ThresholdInvalid { threshold: u32, signer_count: u32 },

    #[error("Signer count {signer_count} would fall below threshold {threshold}")]
    SignerCountBelowThreshold { signer_count: u32, threshold: u32 },

    #[error("{open} transfer proposal(s) still open")]
    OpenTransfersExist { open: usize },

    #[error("{0} is already a signer")]
    SignerAlreadyExists(Principal),

    #[error("{0} is not in the signer set")]
    SignerNotFound(Principal),

    #[error("Transfer amount must be positive")]
    InvalidAmount,

    #[error("Vault balance {balance} does not cover {required}")]
    InsufficientBalance { balance: Tokens, required: Tokens },

    #[error("A transfer for proposal {0} is already in flight")]
    TransferInFlight(ProposalId),

    #[error("Proposal id {0} already exists")]
    DuplicateProposal(ProposalId),

    #[error("Randomness error: {0}")]
    Randomness(#[from] RandomnessError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl VaultError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotASigner(_) => ErrorCategory::Authorization,
            Self::ProposalNotFound(_) => ErrorCategory::NotFound,
            Self::ProposalClosed(_)
            | Self::AlreadyVoted { .. }
            | Self::ThresholdInvalid { .. }
            | Self::SignerCountBelowThreshold { .. }
            | Self::OpenTransfersExist { .. }
            | Self::SignerAlreadyExists(_)
            | Self::SignerNotFound(_)
            | Self::InvalidAmount
            | Self::InsufficientBalance { .. }
            | Self::TransferInFlight(_)
            | Self::DuplicateProposal(_) => ErrorCategory::StateConflict,
            Self::Randomness(_) | Self::Ledger(_) => ErrorCategory::ExternalFailure,
        }
    }
}

/// Initialization errors. A vault is never built from an invalid setup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    #[error("Threshold {threshold} is invalid for {signer_count} signers")]
    ThresholdInvalid { threshold: u32, signer_count: u32 },

    #[error("Duplicate signer: {0}")]
    DuplicateSigner(Principal),

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),
}
