//! Aggregate vault state.
//!
//! Signer set, threshold and the three proposal stores in one owned value.
//! Every method here is synchronous: it runs inside a single critical section
//! of the orchestrator and never spans a suspension point. Guards that depend
//! on shared state are evaluated in the same section that commits.

use crate::clock::Timestamp;
use crate::membership::{Membership, Principal};
use crate::proposals::{
    decide, Decision, Payload, Proposal, ProposalId, ProposalStore, SignerChange,
    ThresholdChange, Transfer, VoteOutcome,
};
use crate::vault::{VaultError, VaultResult};
use std::collections::HashSet;

/// Owned aggregate of all governance state.
#[derive(Debug, Clone, PartialEq)]
pub struct VaultState {
    pub(crate) membership: Membership,
    pub(crate) signer_proposals: ProposalStore<SignerChange>,
    pub(crate) threshold_proposals: ProposalStore<ThresholdChange>,
    pub(crate) transfer_proposals: ProposalStore<Transfer>,
    /// Transfer proposals whose adopting ledger call has not returned yet.
    /// Transient: never part of a snapshot.
    in_flight: HashSet<ProposalId>,
}

/// Result of the decide phase of a transfer vote.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TransferVote {
    /// Vote committed without a ledger call.
    Settled(Decision),
    /// Vote would adopt: run the transfer, then commit `outcome`.
    Execute {
        outcome: VoteOutcome,
        transfer: Transfer,
    },
}

/// Payload kinds the vault governs: where each one is stored and what makes
/// a proposal of that kind legal to create.
pub(crate) trait Governed: Payload {
    fn store(state: &VaultState) -> &ProposalStore<Self>;

    fn store_mut(state: &mut VaultState) -> &mut ProposalStore<Self>;

    /// Creation-time legality against current state.
    fn check_proposal(&self, state: &VaultState) -> VaultResult<()>;
}

impl Governed for SignerChange {
    fn store(state: &VaultState) -> &ProposalStore<Self> {
        &state.signer_proposals
    }

    fn store_mut(state: &mut VaultState) -> &mut ProposalStore<Self> {
        &mut state.signer_proposals
    }

    fn check_proposal(&self, state: &VaultState) -> VaultResult<()> {
        if self.add {
            state.membership.check_absent(&self.signer)
        } else {
            state.membership.check_present(&self.signer)
        }
    }
}

impl Governed for ThresholdChange {
    fn store(state: &VaultState) -> &ProposalStore<Self> {
        &state.threshold_proposals
    }

    fn store_mut(state: &mut VaultState) -> &mut ProposalStore<Self> {
        &mut state.threshold_proposals
    }

    fn check_proposal(&self, state: &VaultState) -> VaultResult<()> {
        state.membership.check_threshold(self.threshold)
    }
}

impl Governed for Transfer {
    fn store(state: &VaultState) -> &ProposalStore<Self> {
        &state.transfer_proposals
    }

    fn store_mut(state: &mut VaultState) -> &mut ProposalStore<Self> {
        &mut state.transfer_proposals
    }

    fn check_proposal(&self, _state: &VaultState) -> VaultResult<()> {
        if self.amount.e8s == 0 {
            return Err(VaultError::InvalidAmount);
        }
        Ok(())
    }
}

impl VaultState {
    pub(crate) fn new(membership: Membership) -> Self {
        Self::from_parts(
            membership,
            ProposalStore::new(),
            ProposalStore::new(),
            ProposalStore::new(),
        )
    }

    pub(crate) fn from_parts(
        membership: Membership,
        signer_proposals: ProposalStore<SignerChange>,
        threshold_proposals: ProposalStore<ThresholdChange>,
        transfer_proposals: ProposalStore<Transfer>,
    ) -> Self {
        Self {
            membership,
            signer_proposals,
            threshold_proposals,
            transfer_proposals,
            in_flight: HashSet::new(),
        }
    }

    pub fn membership(&self) -> &Membership {
        &self.membership
    }

    pub fn signer_proposals(&self) -> &ProposalStore<SignerChange> {
        &self.signer_proposals
    }

    pub fn threshold_proposals(&self) -> &ProposalStore<ThresholdChange> {
        &self.threshold_proposals
    }

    pub fn transfer_proposals(&self) -> &ProposalStore<Transfer> {
        &self.transfer_proposals
    }

    pub(crate) fn authorize(&self, caller: &Principal) -> VaultResult<()> {
        if !self.membership.is_signer(caller) {
            return Err(VaultError::NotASigner(caller.clone()));
        }
        Ok(())
    }

    /// Threshold changes and signer removals wait for open transfers.
    fn check_no_open_transfers(&self) -> VaultResult<()> {
        let open = self.transfer_proposals.open_count();
        if open > 0 {
            return Err(VaultError::OpenTransfersExist { open });
        }
        Ok(())
    }

    /// Caller may create a proposal with `payload` right now.
    pub(crate) fn check_proposal<P: Governed>(
        &self,
        caller: &Principal,
        payload: &P,
    ) -> VaultResult<()> {
        self.authorize(caller)?;
        payload.check_proposal(self)
    }

    /// Re-check and insert a freshly created proposal.
    pub(crate) fn insert_proposal<P: Governed>(&mut self, proposal: Proposal<P>) -> VaultResult<()> {
        self.check_proposal(&proposal.proposer, &proposal.payload)?;
        P::store_mut(self).insert(proposal)
    }

    fn check_signer_adoption(&self, change: &SignerChange) -> VaultResult<()> {
        if change.add {
            self.membership.check_absent(&change.signer)
        } else {
            self.check_no_open_transfers()?;
            self.membership.check_removal(&change.signer)
        }
    }

    fn check_threshold_adoption(&self, change: &ThresholdChange) -> VaultResult<()> {
        self.check_no_open_transfers()?;
        self.membership.check_threshold(change.threshold)
    }

    /// Decide, guard and commit a signer-change vote in one step.
    pub(crate) fn vote_on_signer_proposal(
        &mut self,
        caller: &Principal,
        id: &ProposalId,
        adopt: bool,
        now: Timestamp,
    ) -> VaultResult<Decision> {
        self.authorize(caller)?;
        let proposal = self.signer_proposals.lookup(id)?;
        let outcome = decide(proposal, caller, adopt, &self.membership)?;
        let change = proposal.payload.clone();

        if outcome.decision == Decision::Adopt {
            self.check_signer_adoption(&change)?;
        }
        self.signer_proposals.commit(id, &outcome, now)?;

        if outcome.decision == Decision::Adopt {
            if change.add {
                self.membership.add(change.signer);
            } else {
                self.membership.remove(&change.signer);
            }
        }
        Ok(outcome.decision)
    }

    /// Decide, guard and commit a threshold-change vote in one step.
    pub(crate) fn vote_on_threshold_proposal(
        &mut self,
        caller: &Principal,
        id: &ProposalId,
        adopt: bool,
        now: Timestamp,
    ) -> VaultResult<Decision> {
        self.authorize(caller)?;
        let proposal = self.threshold_proposals.lookup(id)?;
        let outcome = decide(proposal, caller, adopt, &self.membership)?;
        let change = proposal.payload;

        if outcome.decision == Decision::Adopt {
            self.check_threshold_adoption(&change)?;
        }
        self.threshold_proposals.commit(id, &outcome, now)?;

        if outcome.decision == Decision::Adopt {
            self.membership.set_threshold(change.threshold);
        }
        Ok(outcome.decision)
    }

    /// Decide phase of a transfer vote.
    ///
    /// Non-adopting votes commit immediately. An adopting vote commits
    /// nothing; it marks the proposal in flight and hands back the transfer
    /// to execute.
    pub(crate) fn prepare_transfer_vote(
        &mut self,
        caller: &Principal,
        id: &ProposalId,
        adopt: bool,
        now: Timestamp,
    ) -> VaultResult<TransferVote> {
        self.authorize(caller)?;
        let proposal = self.transfer_proposals.lookup(id)?;
        if self.in_flight.contains(id) {
            return Err(VaultError::TransferInFlight(id.clone()));
        }
        let outcome = decide(proposal, caller, adopt, &self.membership)?;

        if outcome.decision == Decision::Adopt {
            let transfer = proposal.payload;
            self.in_flight.insert(id.clone());
            return Ok(TransferVote::Execute { outcome, transfer });
        }

        self.transfer_proposals.commit(id, &outcome, now)?;
        Ok(TransferVote::Settled(outcome.decision))
    }

    /// Commit phase of an adopting transfer vote, after the ledger succeeded.
    pub(crate) fn commit_transfer_vote(
        &mut self,
        id: &ProposalId,
        outcome: &VoteOutcome,
        now: Timestamp,
    ) -> VaultResult<Decision> {
        self.transfer_proposals.commit(id, outcome, now)?;
        Ok(outcome.decision)
    }

    pub(crate) fn release_in_flight(&mut self, id: &ProposalId) {
        self.in_flight.remove(id);
    }

    pub fn is_in_flight(&self, id: &ProposalId) -> bool {
        self.in_flight.contains(id)
    }
}
