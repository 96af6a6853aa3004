// Integration tests for end-to-end proposal flows
//
// These tests verify:
// - Signer add/remove lifecycles through the public Vault API
// - Votes of removed signers stay recorded but stop counting
// - Threshold changes take effect for later votes
// - Transfers move funds exactly once and only after adoption
// - Open transfers block threshold changes and removals
// - Snapshots survive a CBOR round trip through restore

use sigvault::clock::{ManualClock, Timestamp};
use sigvault::ledger::{AccountId, MockLedger, Tokens};
use sigvault::proposals::{Decision, ProposalStatus, SignerChange};
use sigvault::randomness::MockRandomness;
use sigvault::vault::{ProposalFilter, VaultSnapshot};
use sigvault::{InitArgs, Principal, Vault, VaultError};
use std::sync::Arc;

const VAULT: AccountId = AccountId::from_bytes([0xAA; 32]);
const PAYEE: AccountId = AccountId::from_bytes([0xBB; 32]);
const FEE: Tokens = Tokens::from_e8s(10_000);

fn p(name: &str) -> Principal {
    Principal::new(name).unwrap()
}

fn setup(signers: &[&str], threshold: u32, balance: u64) -> (Vault<MockRandomness, MockLedger>, MockLedger) {
    let ledger = MockLedger::new(VAULT, FEE);
    ledger.deposit(VAULT, Tokens::from_e8s(balance));
    let args = InitArgs {
        signers: signers.iter().map(|s| p(s)).collect(),
        threshold,
        account: VAULT,
    };
    let vault = Vault::new(
        args,
        MockRandomness::new(42),
        ledger.clone(),
        Arc::new(ManualClock::new(Timestamp(1))),
    )
    .expect("valid init");
    (vault, ledger)
}

#[tokio::test]
async fn test_add_signer_then_new_signer_votes() {
    let (vault, _ledger) = setup(&["alice", "bob", "carol"], 2, 0);

    let add = vault
        .propose_signer_change(&p("alice"), "add dave", SignerChange::add(p("dave")))
        .await
        .unwrap();
    assert_eq!(vault.vote_on_signer_proposal(&p("alice"), &add, true), Ok(Decision::Voted));
    assert_eq!(vault.vote_on_signer_proposal(&p("bob"), &add, true), Ok(Decision::Adopt));
    assert_eq!(vault.signer_count(), 4);
    assert!(vault.is_signer(&p("dave")));

    // Dave can now propose and vote.
    let raise = vault.propose_threshold_change(&p("dave"), "", 3).await.unwrap();
    assert_eq!(vault.vote_on_threshold_proposal(&p("dave"), &raise, true), Ok(Decision::Voted));
}

#[tokio::test]
async fn test_remove_signer_and_removed_signer_loses_rights() {
    let (vault, _ledger) = setup(&["alice", "bob", "carol"], 2, 0);

    let removal = vault
        .propose_signer_change(&p("alice"), "remove carol", SignerChange::remove(p("carol")))
        .await
        .unwrap();
    vault.vote_on_signer_proposal(&p("alice"), &removal, true).unwrap();
    vault.vote_on_signer_proposal(&p("bob"), &removal, true).unwrap();

    assert_eq!(vault.signers(), vec![p("alice"), p("bob")]);
    assert_eq!(
        vault.propose_threshold_change(&p("carol"), "", 1).await,
        Err(VaultError::NotASigner(p("carol")))
    );
}

#[tokio::test]
async fn test_removed_signer_votes_stop_counting() {
    let (vault, _ledger) = setup(&["alice", "bob", "carol"], 2, 0);

    let add = vault
        .propose_signer_change(&p("alice"), "add mallory", SignerChange::add(p("mallory")))
        .await
        .unwrap();
    let lower = vault.propose_threshold_change(&p("alice"), "", 1).await.unwrap();
    let removal = vault
        .propose_signer_change(&p("bob"), "remove carol", SignerChange::remove(p("carol")))
        .await
        .unwrap();

    vault.vote_on_signer_proposal(&p("carol"), &add, true).unwrap();
    vault.vote_on_threshold_proposal(&p("carol"), &lower, false).unwrap();
    vault.vote_on_signer_proposal(&p("alice"), &removal, true).unwrap();
    assert_eq!(vault.vote_on_signer_proposal(&p("bob"), &removal, true), Ok(Decision::Adopt));
    assert_eq!(vault.signers(), vec![p("alice"), p("bob")]);

    // Carol's adopt no longer counts: one current adopt is short of t = 2.
    assert_eq!(vault.vote_on_signer_proposal(&p("alice"), &add, true), Ok(Decision::Voted));
    assert!(!vault.is_signer(&p("mallory")));

    // Carol's reject no longer counts either, so an adopt cannot reject.
    assert_eq!(vault.vote_on_threshold_proposal(&p("alice"), &lower, true), Ok(Decision::Voted));
    assert_eq!(vault.vote_on_threshold_proposal(&p("bob"), &lower, true), Ok(Decision::Adopt));
    assert_eq!(vault.threshold(), 1);

    let lowered = vault.threshold_proposal(&lower).unwrap();
    assert_eq!(lowered.votes().len(), 3);
    assert_eq!(lowered.status(), ProposalStatus::Adopted);
}

#[tokio::test]
async fn test_threshold_change_applies_to_later_votes() {
    let (vault, _ledger) = setup(&["alice", "bob", "carol"], 1, 0);

    let raise = vault.propose_threshold_change(&p("alice"), "", 3).await.unwrap();
    let pending = vault
        .propose_signer_change(&p("bob"), "", SignerChange::add(p("dave")))
        .await
        .unwrap();

    assert_eq!(vault.vote_on_threshold_proposal(&p("alice"), &raise, true), Ok(Decision::Adopt));
    assert_eq!(vault.threshold(), 3);

    // The pending proposal is now judged against t = 3.
    assert_eq!(vault.vote_on_signer_proposal(&p("alice"), &pending, true), Ok(Decision::Voted));
    assert_eq!(vault.vote_on_signer_proposal(&p("bob"), &pending, true), Ok(Decision::Voted));
    assert_eq!(vault.vote_on_signer_proposal(&p("carol"), &pending, true), Ok(Decision::Adopt));
}

#[tokio::test]
async fn test_transfer_executes_exactly_once() {
    let (vault, ledger) = setup(&["alice", "bob", "carol"], 2, 10_000_000);
    let amount = Tokens::from_e8s(1_000_000);

    let id = vault
        .propose_transfer(&p("alice"), "payroll", PAYEE, amount)
        .await
        .unwrap();
    assert_eq!(vault.vote_on_transfer_proposal(&p("alice"), &id, true).await, Ok(Decision::Voted));
    assert_eq!(vault.vote_on_transfer_proposal(&p("bob"), &id, true).await, Ok(Decision::Adopt));
    assert_eq!(
        vault.vote_on_transfer_proposal(&p("carol"), &id, true).await,
        Err(VaultError::ProposalClosed(id.clone()))
    );

    assert_eq!(ledger.transfers().len(), 1);
    assert_eq!(ledger.balance_of(&PAYEE), amount);
    assert_eq!(
        vault.balance().await.unwrap(),
        Tokens::from_e8s(10_000_000 - 1_000_000 - 10_000)
    );
    assert_eq!(
        vault.transfer_proposal(&id).unwrap().status(),
        ProposalStatus::Adopted
    );
}

#[tokio::test]
async fn test_open_transfer_blocks_governance_until_closed() {
    let (vault, _ledger) = setup(&["alice", "bob", "carol"], 2, 10_000_000);

    let lower = vault.propose_threshold_change(&p("alice"), "", 1).await.unwrap();
    let removal = vault
        .propose_signer_change(&p("alice"), "", SignerChange::remove(p("carol")))
        .await
        .unwrap();
    let transfer = vault
        .propose_transfer(&p("bob"), "", PAYEE, Tokens::from_e8s(5))
        .await
        .unwrap();

    vault.vote_on_threshold_proposal(&p("alice"), &lower, true).unwrap();
    assert_eq!(
        vault.vote_on_threshold_proposal(&p("bob"), &lower, true),
        Err(VaultError::OpenTransfersExist { open: 1 })
    );
    vault.vote_on_signer_proposal(&p("alice"), &removal, true).unwrap();
    assert_eq!(
        vault.vote_on_signer_proposal(&p("bob"), &removal, true),
        Err(VaultError::OpenTransfersExist { open: 1 })
    );

    // Reject the transfer; the blocked votes can now be cast again.
    vault.vote_on_transfer_proposal(&p("alice"), &transfer, false).await.unwrap();
    assert_eq!(
        vault.vote_on_transfer_proposal(&p("bob"), &transfer, false).await,
        Ok(Decision::Reject)
    );
    assert!(vault.transfer_proposals(ProposalFilter::Open).is_empty());

    assert_eq!(vault.vote_on_threshold_proposal(&p("bob"), &lower, true), Ok(Decision::Adopt));
    assert_eq!(vault.threshold(), 1);
    assert_eq!(vault.vote_on_signer_proposal(&p("bob"), &removal, true), Ok(Decision::Adopt));
    assert_eq!(vault.signer_count(), 2);
}

#[tokio::test]
async fn test_double_vote_and_closed_proposal_are_refused() {
    let (vault, _ledger) = setup(&["alice", "bob", "carol"], 2, 0);
    let id = vault.propose_threshold_change(&p("alice"), "", 3).await.unwrap();

    vault.vote_on_threshold_proposal(&p("alice"), &id, false).unwrap();
    assert_eq!(
        vault.vote_on_threshold_proposal(&p("alice"), &id, true),
        Err(VaultError::AlreadyVoted {
            proposal: id.clone(),
            voter: p("alice"),
        })
    );
    assert_eq!(vault.vote_on_threshold_proposal(&p("bob"), &id, false), Ok(Decision::Reject));
    assert_eq!(
        vault.vote_on_threshold_proposal(&p("carol"), &id, true),
        Err(VaultError::ProposalClosed(id.clone()))
    );

    let proposal = vault.threshold_proposal(&id).unwrap();
    assert!(proposal.is_rejected());
    assert_eq!(proposal.votes().len(), 2);
    assert_eq!(vault.threshold(), 2);
}

#[tokio::test]
async fn test_listing_orders_and_filters() {
    let (vault, _ledger) = setup(&["alice", "bob"], 1, 0);
    let first = vault.propose_threshold_change(&p("alice"), "one", 2).await.unwrap();
    let second = vault.propose_threshold_change(&p("bob"), "two", 1).await.unwrap();

    vault.vote_on_threshold_proposal(&p("alice"), &first, true).unwrap();

    let all = vault.threshold_proposals(ProposalFilter::All);
    assert_eq!(all.len(), 2);
    let open = vault.threshold_proposals(ProposalFilter::Open);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, second);
    assert!(matches!(
        vault.signer_proposal(&first),
        Err(VaultError::ProposalNotFound(_))
    ));
}

#[tokio::test]
async fn test_snapshot_survives_cbor_round_trip() {
    let (vault, ledger) = setup(&["alice", "bob", "carol"], 2, 1_000_000);
    let transfer = vault
        .propose_transfer(&p("alice"), "", PAYEE, Tokens::from_e8s(100))
        .await
        .unwrap();
    vault.vote_on_transfer_proposal(&p("bob"), &transfer, true).await.unwrap();

    let bytes = vault.snapshot().to_bytes().unwrap();
    let snapshot = VaultSnapshot::from_bytes(&bytes).unwrap();
    let restored = Vault::restore(
        snapshot,
        MockRandomness::new(7),
        ledger.clone(),
        Arc::new(ManualClock::new(Timestamp(99))),
    )
    .unwrap();

    assert_eq!(restored.signers(), vault.signers());
    // The pending vote carries over: one more adopt completes the transfer.
    assert_eq!(
        restored.vote_on_transfer_proposal(&p("carol"), &transfer, true).await,
        Ok(Decision::Adopt)
    );
    assert_eq!(ledger.balance_of(&PAYEE), Tokens::from_e8s(100));
}
