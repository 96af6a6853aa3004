//! Voting engine.
//!
//! Pure decision step: given a proposal and one new vote, validate it, tally
//! the would-be vote list and decide whether the proposal adopts, rejects or
//! stays open. Nothing is written here; the caller commits the returned
//! `VoteOutcome` and applies the kind-specific side effect.
//!
//! Only votes of current signers are counted. Votes cast by signers removed
//! since stay in the vote list but no longer weigh on the decision.
//!
//! Decision rule, re-evaluated on every vote:
//! - Adopt when `adopt >= threshold`
//! - Reject when `reject > signer_count - threshold`, i.e. the signers that
//!   have not rejected can no longer reach the threshold
//! - Otherwise the vote is recorded and the proposal stays open

use super::types::{Proposal, Vote};
use crate::membership::{Membership, Principal};
use crate::vault::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};

/// Adopt/reject counts over a vote list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tally {
    pub adopt: u32,
    pub reject: u32,
}

impl Tally {
    pub fn of<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        votes.into_iter().fold(Tally::default(), |mut tally, vote| {
            if vote.adopt {
                tally.adopt += 1;
            } else {
                tally.reject += 1;
            }
            tally
        })
    }

    pub fn total(&self) -> u32 {
        self.adopt + self.reject
    }
}

/// Outcome of one vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Quorum reached; the proposal becomes Adopted.
    Adopt,
    /// Quorum can no longer be reached; the proposal becomes Rejected.
    Reject,
    /// Vote recorded, proposal stays Open.
    Voted,
}

/// Quorum parameters at the moment of the vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quorum {
    pub threshold: u32,
    pub signer_count: u32,
}

impl Quorum {
    pub fn new(threshold: u32, signer_count: u32) -> Self {
        Self {
            threshold,
            signer_count,
        }
    }

    /// Quorum of the current signer set.
    pub fn of(members: &Membership) -> Self {
        Self::new(members.threshold(), members.signer_count())
    }

    pub fn decide(&self, tally: Tally) -> Decision {
        if tally.adopt >= self.threshold {
            Decision::Adopt
        } else if tally.reject > self.signer_count.saturating_sub(self.threshold) {
            Decision::Reject
        } else {
            Decision::Voted
        }
    }
}

/// A validated, not yet committed vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub vote: Vote,
    pub decision: Decision,
    /// Tally of current signers' votes, including `vote`.
    pub tally: Tally,
}

/// Validate `voter`'s vote on `proposal` and decide the result against the
/// current signer set.
pub fn decide<P>(
    proposal: &Proposal<P>,
    voter: &Principal,
    adopt: bool,
    members: &Membership,
) -> VaultResult<VoteOutcome> {
    if !members.is_signer(voter) {
        return Err(VaultError::NotASigner(voter.clone()));
    }
    if !proposal.is_open() {
        return Err(VaultError::ProposalClosed(proposal.id.clone()));
    }
    if proposal.has_voted(voter) {
        return Err(VaultError::AlreadyVoted {
            proposal: proposal.id.clone(),
            voter: voter.clone(),
        });
    }

    let mut tally = proposal.tally_among(members);
    if adopt {
        tally.adopt += 1;
    } else {
        tally.reject += 1;
    }

    Ok(VoteOutcome {
        vote: Vote {
            voter: voter.clone(),
            adopt,
        },
        decision: Quorum::of(members).decide(tally),
        tally,
    })
}
