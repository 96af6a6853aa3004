//! Proposal id derivation.

use super::traits::{RandomnessError, RandomnessResult};
use crate::proposals::ProposalId;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest (128 bits).
const ID_HEX_LEN: usize = 32;

/// Derive a proposal id: SHA-256 over the random bytes, hex-encoded and
/// truncated to 128 bits.
pub fn derive_proposal_id(bytes: &[u8]) -> RandomnessResult<ProposalId> {
    if bytes.is_empty() {
        return Err(RandomnessError::Empty);
    }
    let digest = Sha256::digest(bytes);
    let mut text = hex::encode(digest);
    text.truncate(ID_HEX_LEN);
    Ok(ProposalId::new(text))
}
