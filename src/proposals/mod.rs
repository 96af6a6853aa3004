//! Proposal store and voting engine.
//!
//! - Three independently keyed collections (signer, threshold, transfer)
//! - One vote per signer, terminal proposals never reopen
//! - Pure decide step; mutation only through `ProposalStore::commit`

pub mod store;
pub mod types;
pub mod voting;

#[cfg(test)]
mod proptests;

pub use store::ProposalStore;
pub use types::{
    Payload, Proposal, ProposalId, ProposalKind, ProposalStatus, SignerChange, SignerProposal,
    ThresholdChange, ThresholdProposal, Transfer, TransferProposal, Vote,
};
pub use voting::{decide, Decision, Quorum, Tally, VoteOutcome};
