//! Proposal data model.
//!
//! A proposal's identity fields are immutable once created. Votes are
//! append-only and the terminal flags move false→true at most once; both are
//! only reachable through `Proposal::record`, which the store calls after
//! re-validating the proposal.

use super::voting::{Decision, Tally, VoteOutcome};
use crate::clock::Timestamp;
use crate::ledger::{AccountId, Tokens};
use crate::membership::{Membership, Principal};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Opaque proposal identifier derived from external randomness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ledger memo for transfers executed on behalf of this proposal: the
    /// leading 64 bits of the id, or 0 when the id is not hex.
    pub fn memo(&self) -> u64 {
        self.0
            .get(..16)
            .and_then(|prefix| u64::from_str_radix(prefix, 16).ok())
            .unwrap_or(0)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProposalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The three proposal collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    Signer,
    Threshold,
    Transfer,
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer => write!(f, "signer"),
            Self::Threshold => write!(f, "threshold"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// Lifecycle state derived from the terminal flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Adopted,
    Rejected,
}

/// One signer's vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: Principal,
    pub adopt: bool,
}

/// Kind-specific proposal payload.
pub trait Payload: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: ProposalKind;
}

/// Add or remove one signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerChange {
    pub signer: Principal,
    pub add: bool,
}

impl SignerChange {
    pub fn add(signer: Principal) -> Self {
        Self { signer, add: true }
    }

    pub fn remove(signer: Principal) -> Self {
        Self { signer, add: false }
    }
}

impl Payload for SignerChange {
    const KIND: ProposalKind = ProposalKind::Signer;
}

/// Replace the approval threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdChange {
    pub threshold: u32,
}

impl Payload for ThresholdChange {
    const KIND: ProposalKind = ProposalKind::Threshold;
}

/// Move funds out of the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: AccountId,
    pub amount: Tokens,
}

impl Payload for Transfer {
    const KIND: ProposalKind = ProposalKind::Transfer;
}

/// A proposal of payload kind `P`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal<P> {
    pub id: ProposalId,
    pub created_at: Timestamp,
    pub proposer: Principal,
    pub description: String,
    pub payload: P,
    votes: Vec<Vote>,
    adopted: bool,
    adopted_at: Option<Timestamp>,
    rejected: bool,
    rejected_at: Option<Timestamp>,
}

pub type SignerProposal = Proposal<SignerChange>;
pub type ThresholdProposal = Proposal<ThresholdChange>;
pub type TransferProposal = Proposal<Transfer>;

impl<P> Proposal<P> {
    /// A fresh Open proposal with no votes.
    pub fn new(
        id: ProposalId,
        created_at: Timestamp,
        proposer: Principal,
        description: String,
        payload: P,
    ) -> Self {
        Self {
            id,
            created_at,
            proposer,
            description,
            payload,
            votes: Vec::new(),
            adopted: false,
            adopted_at: None,
            rejected: false,
            rejected_at: None,
        }
    }

    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }

    pub fn is_adopted(&self) -> bool {
        self.adopted
    }

    pub fn adopted_at(&self) -> Option<Timestamp> {
        self.adopted_at
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    pub fn rejected_at(&self) -> Option<Timestamp> {
        self.rejected_at
    }

    pub fn is_open(&self) -> bool {
        !self.adopted && !self.rejected
    }

    pub fn status(&self) -> ProposalStatus {
        if self.adopted {
            ProposalStatus::Adopted
        } else if self.rejected {
            ProposalStatus::Rejected
        } else {
            ProposalStatus::Open
        }
    }

    pub fn has_voted(&self, voter: &Principal) -> bool {
        self.votes.iter().any(|vote| &vote.voter == voter)
    }

    /// Tally of every recorded vote.
    pub fn tally(&self) -> Tally {
        Tally::of(&self.votes)
    }

    /// Tally of the votes cast by current members of `members`.
    pub fn tally_among(&self, members: &Membership) -> Tally {
        Tally::of(self.votes.iter().filter(|vote| members.is_signer(&vote.voter)))
    }

    /// Append the outcome's vote and apply its terminal transition.
    ///
    /// Callers must have checked that the proposal is open and the voter has
    /// not voted.
    pub(crate) fn record(&mut self, outcome: &VoteOutcome, at: Timestamp) {
        debug_assert!(self.is_open());
        debug_assert!(!self.has_voted(&outcome.vote.voter));

        self.votes.push(outcome.vote.clone());
        match outcome.decision {
            Decision::Adopt => {
                self.adopted = true;
                self.adopted_at = Some(at);
            }
            Decision::Reject => {
                self.rejected = true;
                self.rejected_at = Some(at);
            }
            Decision::Voted => {}
        }
    }

    /// Structural consistency: exclusive terminal flags with matching
    /// timestamps and one vote per voter. Used when restoring snapshots.
    pub fn is_consistent(&self) -> bool {
        if self.adopted && self.rejected {
            return false;
        }
        if self.adopted != self.adopted_at.is_some() || self.rejected != self.rejected_at.is_some()
        {
            return false;
        }
        let mut seen = HashSet::new();
        self.votes.iter().all(|vote| seen.insert(&vote.voter))
    }
}
