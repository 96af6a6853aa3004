//! State snapshots.
//!
//! Exports the aggregate state (minus transient in-flight markers) for
//! persistence across restarts. Restoring re-validates everything a running
//! vault relies on.

use super::error::InitError;
use super::state::VaultState;
use crate::ledger::AccountId;
use crate::membership::Membership;
use crate::proposals::{Payload, ProposalStore, SignerChange, ThresholdChange, Transfer};
use crate::serialization::{from_cbor, to_cbor, SerializationError};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable image of a vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub version: u32,
    pub account: AccountId,
    pub membership: Membership,
    #[serde(default)]
    pub signer_proposals: ProposalStore<SignerChange>,
    #[serde(default)]
    pub threshold_proposals: ProposalStore<ThresholdChange>,
    #[serde(default)]
    pub transfer_proposals: ProposalStore<Transfer>,
}

impl VaultSnapshot {
    pub(crate) fn capture(state: &VaultState, account: AccountId) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            account,
            membership: state.membership().clone(),
            signer_proposals: state.signer_proposals().clone(),
            threshold_proposals: state.threshold_proposals().clone(),
            transfer_proposals: state.transfer_proposals().clone(),
        }
    }

    /// Validate and rebuild the state.
    pub(crate) fn into_state(self) -> Result<VaultState, InitError> {
        if self.version > SNAPSHOT_VERSION {
            return Err(InitError::CorruptSnapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        self.membership.validate()?;
        check_store(&self.signer_proposals)?;
        check_store(&self.threshold_proposals)?;
        check_store(&self.transfer_proposals)?;

        Ok(VaultState::from_parts(
            self.membership,
            self.signer_proposals,
            self.threshold_proposals,
            self.transfer_proposals,
        ))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        from_cbor(bytes)
    }
}

fn check_store<P: Payload>(store: &ProposalStore<P>) -> Result<(), InitError> {
    for (key, proposal) in store.entries() {
        if *key != proposal.id {
            return Err(InitError::CorruptSnapshot(format!(
                "{} proposal stored under {} reports id {}",
                P::KIND,
                key,
                proposal.id
            )));
        }
        if !proposal.is_consistent() {
            return Err(InitError::CorruptSnapshot(format!(
                "{} proposal {} has inconsistent votes or flags",
                P::KIND,
                proposal.id
            )));
        }
    }
    Ok(())
}
