//! Proposal orchestrator.
//!
//! Public entry points of the vault. Each operation follows the same shape:
//!
//! 1. Synchronous checks against current state (caller is a signer, payload is
//!    legal). These run before any external call, so a non-signer can never
//!    trigger one.
//! 2. External calls (randomness, ledger). Other operations may interleave
//!    here; no lock is held.
//! 3. Re-validation and commit in a single synchronous section.
//!
//! Nothing is committed before an external result is known, so a failed call
//! leaves state untouched and the operation can be resubmitted.

use super::error::{InitError, VaultError, VaultResult};
use super::snapshot::VaultSnapshot;
use super::state::{Governed, TransferVote, VaultState};
use crate::clock::Clock;
use crate::ledger::{AccountId, Ledger, LedgerGateway, Tokens};
use crate::membership::{Membership, Principal};
use crate::proposals::{
    Decision, Payload, Proposal, ProposalId, SignerChange, SignerProposal, ThresholdChange,
    ThresholdProposal, Transfer, TransferProposal,
};
use crate::randomness::{derive_proposal_id, RandomnessSource};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Initial vault setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitArgs {
    pub signers: Vec<Principal>,
    pub threshold: u32,
    /// The ledger account the vault controls.
    pub account: AccountId,
}

/// Which proposals a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalFilter {
    #[default]
    All,
    Open,
}

/// Multi-signature vault.
pub struct Vault<R, L> {
    state: Mutex<VaultState>,
    randomness: R,
    ledger: LedgerGateway<L>,
    clock: Arc<dyn Clock>,
}

/// Clears a transfer's in-flight marker when dropped, whatever the outcome of
/// the ledger call.
struct InFlight<'a> {
    state: &'a Mutex<VaultState>,
    id: ProposalId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.release_in_flight(&self.id);
    }
}

impl<R: RandomnessSource, L: Ledger> Vault<R, L> {
    /// Build a vault from its initial signers and threshold.
    ///
    /// Fails if the threshold is zero, exceeds the signer count, or a signer is
    /// listed twice. No vault exists after a failure.
    pub fn new(
        args: InitArgs,
        randomness: R,
        ledger: L,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, InitError> {
        let membership = Membership::new(args.signers, args.threshold)?;
        tracing::info!(
            signers = membership.signer_count(),
            threshold = membership.threshold(),
            account = %args.account,
            "vault initialized"
        );
        Ok(Self::from_state(
            VaultState::new(membership),
            args.account,
            randomness,
            ledger,
            clock,
        ))
    }

    /// Rebuild a vault from a snapshot.
    pub fn restore(
        snapshot: VaultSnapshot,
        randomness: R,
        ledger: L,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, InitError> {
        let account = snapshot.account;
        let state = snapshot.into_state()?;
        tracing::info!(
            signers = state.membership().signer_count(),
            threshold = state.membership().threshold(),
            "vault restored from snapshot"
        );
        Ok(Self::from_state(state, account, randomness, ledger, clock))
    }

    fn from_state(
        state: VaultState,
        account: AccountId,
        randomness: R,
        ledger: L,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            randomness,
            ledger: LedgerGateway::new(ledger, account),
            clock,
        }
    }

    /// Run `f` in one synchronous critical section.
    fn with_state<T>(&self, f: impl FnOnce(&mut VaultState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        let account = self.ledger.vault_account();
        self.with_state(|state| VaultSnapshot::capture(state, account))
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn signers(&self) -> Vec<Principal> {
        self.with_state(|state| state.membership().signers().cloned().collect())
    }

    pub fn is_signer(&self, principal: &Principal) -> bool {
        self.with_state(|state| state.membership().is_signer(principal))
    }

    pub fn signer_count(&self) -> u32 {
        self.with_state(|state| state.membership().signer_count())
    }

    pub fn threshold(&self) -> u32 {
        self.with_state(|state| state.membership().threshold())
    }

    pub fn account(&self) -> AccountId {
        self.ledger.vault_account()
    }

    pub fn signer_proposals(&self, filter: ProposalFilter) -> Vec<SignerProposal> {
        self.list::<SignerChange>(filter)
    }

    pub fn threshold_proposals(&self, filter: ProposalFilter) -> Vec<ThresholdProposal> {
        self.list::<ThresholdChange>(filter)
    }

    pub fn transfer_proposals(&self, filter: ProposalFilter) -> Vec<TransferProposal> {
        self.list::<Transfer>(filter)
    }

    pub fn signer_proposal(&self, id: &ProposalId) -> VaultResult<SignerProposal> {
        self.get::<SignerChange>(id)
    }

    pub fn threshold_proposal(&self, id: &ProposalId) -> VaultResult<ThresholdProposal> {
        self.get::<ThresholdChange>(id)
    }

    pub fn transfer_proposal(&self, id: &ProposalId) -> VaultResult<TransferProposal> {
        self.get::<Transfer>(id)
    }

    /// Vault balance on the ledger (suspension point).
    pub async fn balance(&self) -> VaultResult<Tokens> {
        Ok(self.ledger.balance().await?)
    }

    fn list<P: Governed>(&self, filter: ProposalFilter) -> Vec<Proposal<P>> {
        self.with_state(|state| {
            let store = P::store(state);
            let proposals = match filter {
                ProposalFilter::All => store.list_all(),
                ProposalFilter::Open => store.list_open(),
            };
            proposals.into_iter().cloned().collect()
        })
    }

    fn get<P: Governed>(&self, id: &ProposalId) -> VaultResult<Proposal<P>> {
        self.with_state(|state| P::store(state).lookup(id).cloned())
    }

    // ---------------------------------------------------------------------
    // Proposals
    // ---------------------------------------------------------------------

    /// Propose adding or removing a signer.
    pub async fn propose_signer_change(
        &self,
        caller: &Principal,
        description: impl Into<String>,
        change: SignerChange,
    ) -> VaultResult<ProposalId> {
        self.with_state(|state| state.check_proposal(caller, &change))?;
        self.create(caller, description.into(), change).await
    }

    /// Propose a new approval threshold.
    pub async fn propose_threshold_change(
        &self,
        caller: &Principal,
        description: impl Into<String>,
        threshold: u32,
    ) -> VaultResult<ProposalId> {
        let change = ThresholdChange { threshold };
        self.with_state(|state| state.check_proposal(caller, &change))?;
        self.create(caller, description.into(), change).await
    }

    /// Propose moving `amount` out of the vault to `to`.
    ///
    /// After the signer check, fee and balance are looked up so a transfer the
    /// vault cannot cover is refused up front.
    pub async fn propose_transfer(
        &self,
        caller: &Principal,
        description: impl Into<String>,
        to: AccountId,
        amount: Tokens,
    ) -> VaultResult<ProposalId> {
        let transfer = Transfer { to, amount };
        self.with_state(|state| state.check_proposal(caller, &transfer))?;

        let fee = self.ledger.fee().await?;
        let balance = self.ledger.balance().await?;
        let required = amount
            .checked_add(fee)
            .ok_or(VaultError::InsufficientBalance {
                balance,
                required: Tokens::from_e8s(u64::MAX),
            })?;
        if balance < required {
            tracing::warn!(%caller, %balance, %required, "transfer proposal exceeds vault balance");
            return Err(VaultError::InsufficientBalance { balance, required });
        }

        self.create(caller, description.into(), transfer).await
    }

    /// Fetch randomness, derive the id, then re-check and insert.
    async fn create<P: Governed>(
        &self,
        caller: &Principal,
        description: String,
        payload: P,
    ) -> VaultResult<ProposalId> {
        let bytes = self.randomness.raw_random_bytes().await?;
        let id = derive_proposal_id(&bytes)?;

        let kind = P::KIND;
        let proposal = Proposal::new(
            id.clone(),
            self.clock.now(),
            caller.clone(),
            description,
            payload,
        );
        if let Err(err) = self.with_state(|state| state.insert_proposal(proposal)) {
            tracing::warn!(%kind, %caller, error = %err, "proposal refused after randomness");
            return Err(err);
        }

        tracing::info!(%kind, proposal_id = %id, proposer = %caller, "proposal created");
        Ok(id)
    }

    // ---------------------------------------------------------------------
    // Votes
    // ---------------------------------------------------------------------

    /// Vote on a signer-change proposal. Adoption applies the change.
    pub fn vote_on_signer_proposal(
        &self,
        caller: &Principal,
        id: &ProposalId,
        adopt: bool,
    ) -> VaultResult<Decision> {
        let now = self.clock.now();
        let result = self.with_state(|state| state.vote_on_signer_proposal(caller, id, adopt, now));
        log_vote(SignerChange::KIND, id, caller, adopt, &result);
        result
    }

    /// Vote on a threshold-change proposal. Adoption sets the new threshold.
    pub fn vote_on_threshold_proposal(
        &self,
        caller: &Principal,
        id: &ProposalId,
        adopt: bool,
    ) -> VaultResult<Decision> {
        let now = self.clock.now();
        let result =
            self.with_state(|state| state.vote_on_threshold_proposal(caller, id, adopt, now));
        log_vote(ThresholdChange::KIND, id, caller, adopt, &result);
        result
    }

    /// Vote on a transfer proposal.
    ///
    /// An adopting vote executes the transfer first and is committed only once
    /// the ledger confirms it. On a ledger failure the proposal stays open and
    /// the vote is not recorded; the voter may vote again.
    pub async fn vote_on_transfer_proposal(
        &self,
        caller: &Principal,
        id: &ProposalId,
        adopt: bool,
    ) -> VaultResult<Decision> {
        let now = self.clock.now();
        let planned = self.with_state(|state| state.prepare_transfer_vote(caller, id, adopt, now));
        let (outcome, transfer) = match planned {
            Ok(TransferVote::Execute { outcome, transfer }) => (outcome, transfer),
            Ok(TransferVote::Settled(decision)) => {
                let result = Ok(decision);
                log_vote(Transfer::KIND, id, caller, adopt, &result);
                return result;
            }
            Err(err) => {
                let result = Err(err);
                log_vote(Transfer::KIND, id, caller, adopt, &result);
                return result;
            }
        };

        let _in_flight = InFlight {
            state: &self.state,
            id: id.clone(),
        };

        let receipt = match self
            .ledger
            .execute_transfer(transfer.to, transfer.amount, id.memo(), now)
            .await
        {
            Ok(receipt) => receipt,
            Err(err) => {
                tracing::warn!(proposal_id = %id, voter = %caller, error = %err, "transfer failed, vote not recorded");
                return Err(VaultError::Ledger(err));
            }
        };

        let adopted_at = self.clock.now();
        let result = self.with_state(|state| state.commit_transfer_vote(id, &outcome, adopted_at));
        match &result {
            Ok(_) => tracing::info!(
                proposal_id = %id,
                voter = %caller,
                block_index = receipt.block_index,
                amount = %transfer.amount,
                "transfer proposal adopted"
            ),
            Err(err) => tracing::error!(
                proposal_id = %id,
                voter = %caller,
                block_index = receipt.block_index,
                error = %err,
                "ledger transfer completed but adoption could not be committed"
            ),
        }
        result
    }
}

fn log_vote(
    kind: crate::proposals::ProposalKind,
    id: &ProposalId,
    voter: &Principal,
    adopt: bool,
    result: &VaultResult<Decision>,
) {
    match result {
        Ok(Decision::Adopt) => {
            tracing::info!(%kind, proposal_id = %id, %voter, "proposal adopted")
        }
        Ok(Decision::Reject) => {
            tracing::info!(%kind, proposal_id = %id, %voter, "proposal rejected")
        }
        Ok(Decision::Voted) => {
            tracing::debug!(%kind, proposal_id = %id, %voter, adopt, "vote recorded")
        }
        Err(err) => {
            tracing::warn!(%kind, proposal_id = %id, %voter, adopt, error = %err, "vote refused")
        }
    }
}
