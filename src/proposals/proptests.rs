//! Property-based tests for voting and governance
//!
//! Tests for:
//! - Decision rule: adopt/reject boundaries for every (n, t)
//! - Vote sequences: one vote per signer, terminal states never change
//! - Governance: 1 <= threshold <= signer count under any operation sequence,
//!   and every Adopt/Reject is backed by votes of signers current at the time

use super::types::{Proposal, ProposalId, SignerChange, ThresholdChange, Transfer};
use super::voting::{decide, Decision, Quorum, Tally};
use crate::vault::VaultResult;
use crate::clock::Timestamp;
use crate::ledger::{AccountId, Tokens};
use crate::membership::{Membership, Principal};
use crate::vault::state::TransferVote;
use crate::vault::{VaultError, VaultState};
use proptest::prelude::*;
use std::collections::HashSet;

const POOL: [&str; 6] = ["alice", "bob", "carol", "dave", "erin", "frank"];

fn p(name: &str) -> Principal {
    Principal::new(name).unwrap()
}

/// Signer count and a valid threshold for it.
fn quorum_strategy() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=9).prop_flat_map(|n| (Just(n), 1..=n))
}

// ============================================================================
// DECISION RULE
// ============================================================================

proptest! {
    /// Property: Adopt exactly when adopt votes reach the threshold
    #[test]
    fn adopt_iff_threshold_reached(
        (n, t) in quorum_strategy(),
        adopt in 0u32..10,
        reject in 0u32..10,
    ) {
        let decision = Quorum::new(t, n).decide(Tally { adopt, reject });
        prop_assert_eq!(decision == Decision::Adopt, adopt >= t);
    }

    /// Property: Reject exactly when the remaining signers cannot reach the threshold
    #[test]
    fn reject_iff_threshold_unreachable(
        (n, t) in quorum_strategy(),
        adopt in 0u32..10,
        reject in 0u32..10,
    ) {
        prop_assume!(adopt < t);
        let decision = Quorum::new(t, n).decide(Tally { adopt, reject });
        prop_assert_eq!(decision == Decision::Reject, reject > n - t);
    }

    /// Property: Rejection short-circuits after n - t + 1 rejections
    #[test]
    fn rejection_short_circuits(
        (n, t) in quorum_strategy(),
    ) {
        let signers: Vec<Principal> = (0..n).map(|i| p(&format!("s{}", i))).collect();
        let members = Membership::new(signers.clone(), t).unwrap();
        let mut proposal = Proposal::new(
            ProposalId::new("r"),
            Timestamp(0),
            signers[0].clone(),
            String::new(),
            ThresholdChange { threshold: t },
        );

        let needed = n - t + 1;
        for (i, signer) in signers.iter().enumerate().take(needed as usize) {
            let outcome = decide(&proposal, signer, false, &members).unwrap();
            let expected = if i as u32 + 1 == needed { Decision::Reject } else { Decision::Voted };
            prop_assert_eq!(outcome.decision, expected);
            proposal.record(&outcome, Timestamp(i as u64 + 1));
        }
        prop_assert!(proposal.is_rejected());
        prop_assert_eq!(proposal.votes().len() as u32, needed);
    }
}

// ============================================================================
// VOTE SEQUENCES
// ============================================================================

proptest! {
    /// Property: Replaying arbitrary votes keeps one vote per voter,
    /// never exceeds n votes and never leaves a terminal state
    #[test]
    fn vote_sequences_respect_invariants(
        (n, t) in quorum_strategy(),
        votes in prop::collection::vec((0usize..9, any::<bool>()), 0..30),
    ) {
        let signers: Vec<Principal> = (0..n).map(|i| p(&format!("s{}", i))).collect();
        let members = Membership::new(signers.clone(), t).unwrap();
        let mut proposal = Proposal::new(
            ProposalId::new("v"),
            Timestamp(0),
            signers[0].clone(),
            String::new(),
            ThresholdChange { threshold: 1 },
        );
        let mut terminal_at: Option<usize> = None;

        for (step, (index, adopt)) in votes.into_iter().enumerate() {
            let voter = &signers[index % signers.len()];
            let before = proposal.clone();

            match decide(&proposal, voter, adopt, &members) {
                Ok(outcome) => {
                    prop_assert!(terminal_at.is_none());
                    if outcome.decision != Decision::Voted {
                        terminal_at = Some(step);
                    }
                    proposal.record(&outcome, Timestamp(step as u64));
                }
                Err(VaultError::ProposalClosed(_)) => {
                    prop_assert!(terminal_at.is_some());
                    prop_assert_eq!(&proposal, &before);
                }
                Err(VaultError::AlreadyVoted { .. }) => {
                    prop_assert!(before.has_voted(voter));
                    prop_assert_eq!(&proposal, &before);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }

            prop_assert!(!(proposal.is_adopted() && proposal.is_rejected()));
            prop_assert!(proposal.votes().len() as u32 <= n);
            prop_assert!(proposal.is_consistent());
        }

        let voters: HashSet<_> = proposal.votes().iter().map(|v| &v.voter).collect();
        prop_assert_eq!(voters.len(), proposal.votes().len());
    }
}

// ============================================================================
// GOVERNANCE
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    ProposeThreshold(u32),
    ProposeAdd(usize),
    ProposeRemove(usize),
    ProposeTransfer,
    VoteSigner { proposal: usize, voter: usize, adopt: bool },
    VoteThreshold { proposal: usize, voter: usize, adopt: bool },
    RejectTransfer { proposal: usize, voter: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..8).prop_map(Op::ProposeThreshold),
        (0usize..6).prop_map(Op::ProposeAdd),
        (0usize..6).prop_map(Op::ProposeRemove),
        Just(Op::ProposeTransfer),
        (0usize..8, 0usize..6, any::<bool>())
            .prop_map(|(proposal, voter, adopt)| Op::VoteSigner { proposal, voter, adopt }),
        (0usize..8, 0usize..6, any::<bool>())
            .prop_map(|(proposal, voter, adopt)| Op::VoteThreshold { proposal, voter, adopt }),
        (0usize..8, 0usize..6).prop_map(|(proposal, voter)| Op::RejectTransfer { proposal, voter }),
    ]
}

fn nth_id(ids: &[ProposalId], index: usize) -> Option<&ProposalId> {
    if ids.is_empty() {
        None
    } else {
        Some(&ids[index % ids.len()])
    }
}

/// A decision must follow from the votes of the signers current when it was
/// taken: Adopt needs `threshold` of their adopts, Reject needs the rest of
/// them to be unable to reach it.
fn check_decision<P>(
    proposal: &Proposal<P>,
    members: &Membership,
    result: &VaultResult<Decision>,
) -> Result<(), TestCaseError> {
    let tally = proposal.tally_among(members);
    match result {
        Ok(Decision::Adopt) => {
            prop_assert!(proposal.is_adopted());
            prop_assert!(tally.adopt >= members.threshold());
        }
        Ok(Decision::Reject) => {
            prop_assert!(proposal.is_rejected());
            prop_assert!(tally.adopt < members.threshold());
            prop_assert!(members.signer_count() - tally.reject < members.threshold());
        }
        _ => {}
    }
    Ok(())
}

proptest! {
    /// Property: Threshold stays within 1..=n and removals never drop n below t,
    /// whatever sequence of proposals and votes is applied
    #[test]
    fn membership_invariants_hold(
        initial in 1usize..=4,
        threshold_seed in any::<u32>(),
        ops in prop::collection::vec(op_strategy(), 0..60),
    ) {
        let signers: Vec<Principal> = POOL[..initial].iter().map(|s| p(s)).collect();
        let threshold = threshold_seed % initial as u32 + 1;
        let mut state = VaultState::new(Membership::new(signers, threshold).unwrap());

        let mut signer_ids = Vec::new();
        let mut threshold_ids = Vec::new();
        let mut transfer_ids = Vec::new();
        let mut next = 0u64;

        for op in ops {
            next += 1;
            let now = Timestamp(next);
            let id = ProposalId::new(format!("{:032x}", next));
            let proposer = state.membership().signers().next().cloned().unwrap();

            match op {
                Op::ProposeThreshold(t) => {
                    let proposal = Proposal::new(id.clone(), now, proposer, String::new(), ThresholdChange { threshold: t });
                    if state.insert_proposal(proposal).is_ok() {
                        threshold_ids.push(id);
                    }
                }
                Op::ProposeAdd(i) | Op::ProposeRemove(i) => {
                    let change = if matches!(op, Op::ProposeAdd(_)) {
                        SignerChange::add(p(POOL[i]))
                    } else {
                        SignerChange::remove(p(POOL[i]))
                    };
                    let proposal = Proposal::new(id.clone(), now, proposer, String::new(), change);
                    if state.insert_proposal(proposal).is_ok() {
                        signer_ids.push(id);
                    }
                }
                Op::ProposeTransfer => {
                    let transfer = Transfer { to: AccountId::from_bytes([4; 32]), amount: Tokens::from_e8s(1) };
                    let proposal = Proposal::new(id.clone(), now, proposer, String::new(), transfer);
                    if state.insert_proposal(proposal).is_ok() {
                        transfer_ids.push(id);
                    }
                }
                Op::VoteSigner { proposal, voter, adopt } => {
                    if let Some(id) = nth_id(&signer_ids, proposal) {
                        let members = state.membership().clone();
                        let result = state.vote_on_signer_proposal(&p(POOL[voter]), id, adopt, now);
                        check_decision(state.signer_proposals().lookup(id).unwrap(), &members, &result)?;
                    }
                }
                Op::VoteThreshold { proposal, voter, adopt } => {
                    if let Some(id) = nth_id(&threshold_ids, proposal) {
                        let members = state.membership().clone();
                        let before = members.threshold();
                        let open_transfers = state.transfer_proposals().open_count();
                        let result = state.vote_on_threshold_proposal(&p(POOL[voter]), id, adopt, now);
                        check_decision(state.threshold_proposals().lookup(id).unwrap(), &members, &result)?;
                        if open_transfers > 0 {
                            prop_assert_eq!(state.membership().threshold(), before);
                            prop_assert!(result != Ok(Decision::Adopt));
                        }
                    }
                }
                Op::RejectTransfer { proposal, voter } => {
                    if let Some(id) = nth_id(&transfer_ids, proposal) {
                        let members = state.membership().clone();
                        if let Ok(TransferVote::Settled(decision)) =
                            state.prepare_transfer_vote(&p(POOL[voter]), id, false, now)
                        {
                            let proposal = state.transfer_proposals().lookup(id).unwrap();
                            check_decision(proposal, &members, &Ok(decision))?;
                        }
                    }
                }
            }

            let membership = state.membership();
            prop_assert!(membership.threshold() >= 1);
            prop_assert!(membership.threshold() <= membership.signer_count());
        }
    }
}
