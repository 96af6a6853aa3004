//! Proposal store.
//!
//! One keyed collection per proposal kind. Inserting an existing id is an
//! error, and a missing id is `ProposalNotFound`. The only
//! write path after insertion is `commit`, which re-validates the proposal
//! immediately before applying a `VoteOutcome`.

use super::types::{Payload, Proposal, ProposalId};
use super::voting::VoteOutcome;
use crate::clock::Timestamp;
use crate::vault::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Proposals of one kind, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "P: Payload")]
pub struct ProposalStore<P> {
    proposals: BTreeMap<ProposalId, Proposal<P>>,
}

impl<P> Default for ProposalStore<P> {
    fn default() -> Self {
        Self {
            proposals: BTreeMap::new(),
        }
    }
}

impl<P: Payload> ProposalStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new proposal; fails if the id is taken.
    pub fn insert(&mut self, proposal: Proposal<P>) -> VaultResult<()> {
        if self.proposals.contains_key(&proposal.id) {
            return Err(VaultError::DuplicateProposal(proposal.id.clone()));
        }
        self.proposals.insert(proposal.id.clone(), proposal);
        Ok(())
    }

    /// The proposal stored under `id`, or `ProposalNotFound`.
    pub fn lookup(&self, id: &ProposalId) -> VaultResult<&Proposal<P>> {
        self.proposals
            .get(id)
            .ok_or_else(|| VaultError::ProposalNotFound(id.clone()))
    }

    /// Apply a decided vote after re-checking that the proposal is still open
    /// and the voter has not voted in the meantime.
    pub(crate) fn commit(
        &mut self,
        id: &ProposalId,
        outcome: &VoteOutcome,
        at: Timestamp,
    ) -> VaultResult<()> {
        let proposal = self
            .proposals
            .get_mut(id)
            .ok_or_else(|| VaultError::ProposalNotFound(id.clone()))?;
        if !proposal.is_open() {
            return Err(VaultError::ProposalClosed(id.clone()));
        }
        if proposal.has_voted(&outcome.vote.voter) {
            return Err(VaultError::AlreadyVoted {
                proposal: id.clone(),
                voter: outcome.vote.voter.clone(),
            });
        }
        proposal.record(outcome, at);
        Ok(())
    }

    /// All proposals, oldest first.
    pub fn list_all(&self) -> Vec<&Proposal<P>> {
        let mut all: Vec<_> = self.proposals.values().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    /// Open proposals, oldest first.
    pub fn list_open(&self) -> Vec<&Proposal<P>> {
        self.list_all()
            .into_iter()
            .filter(|proposal| proposal.is_open())
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.proposals.values().filter(|p| p.is_open()).count()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Stored entries with their keys.
    pub(crate) fn entries(&self) -> impl Iterator<Item = (&ProposalId, &Proposal<P>)> {
        self.proposals.iter()
    }
}
