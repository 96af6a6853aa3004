//! Identity & membership.
//!
//! Tracks the signer set and the approval threshold, and answers whether a
//! given membership change is currently legal. All reads are side-effect free;
//! mutation happens only through an adopted proposal (see `vault::state`).

use crate::vault::{InitError, VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

/// Principal parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrincipalError {
    #[error("Principal must not be empty")]
    Empty,

    #[error("Principal contains whitespace: {0:?}")]
    Whitespace(String),
}

impl Principal {
    /// Parse a textual principal. Surrounding whitespace is trimmed.
    pub fn new(text: impl AsRef<str>) -> Result<Self, PrincipalError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(PrincipalError::Empty);
        }
        if text.chars().any(char::is_whitespace) {
            return Err(PrincipalError::Whitespace(text.to_string()));
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Principal {
    type Err = PrincipalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = PrincipalError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(value: Principal) -> Self {
        value.0
    }
}

/// Signer set plus quorum threshold.
///
/// Invariant: `0 < threshold <= signers.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    signers: BTreeSet<Principal>,
    threshold: u32,
}

impl Membership {
    /// Build the initial membership.
    ///
    /// Fails on duplicate signers, a zero threshold, or a threshold above the
    /// signer count.
    pub fn new(signers: Vec<Principal>, threshold: u32) -> Result<Self, InitError> {
        let mut set = BTreeSet::new();
        for signer in signers {
            if set.contains(&signer) {
                return Err(InitError::DuplicateSigner(signer));
            }
            set.insert(signer);
        }

        let membership = Self {
            signers: set,
            threshold,
        };
        membership.validate()?;
        Ok(membership)
    }

    /// Check the threshold invariant against the current signer set.
    pub(crate) fn validate(&self) -> Result<(), InitError> {
        if self.threshold == 0 || self.threshold > self.signer_count() {
            return Err(InitError::ThresholdInvalid {
                threshold: self.threshold,
                signer_count: self.signer_count(),
            });
        }
        Ok(())
    }

    pub fn is_signer(&self, principal: &Principal) -> bool {
        self.signers.contains(principal)
    }

    pub fn signer_count(&self) -> u32 {
        self.signers.len() as u32
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Signers in sorted order.
    pub fn signers(&self) -> impl Iterator<Item = &Principal> {
        self.signers.iter()
    }

    /// Adding `principal` is legal only if it is not already a signer.
    pub fn check_absent(&self, principal: &Principal) -> VaultResult<()> {
        if self.is_signer(principal) {
            return Err(VaultError::SignerAlreadyExists(principal.clone()));
        }
        Ok(())
    }

    pub fn check_present(&self, principal: &Principal) -> VaultResult<()> {
        if !self.is_signer(principal) {
            return Err(VaultError::SignerNotFound(principal.clone()));
        }
        Ok(())
    }

    /// Removing `principal` must leave at least `threshold` signers.
    pub fn check_removal(&self, principal: &Principal) -> VaultResult<()> {
        self.check_present(principal)?;
        let remaining = self.signer_count() - 1;
        if remaining < self.threshold {
            return Err(VaultError::SignerCountBelowThreshold {
                signer_count: remaining,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    /// A threshold is legal when `0 < threshold <= signer_count`.
    pub fn check_threshold(&self, threshold: u32) -> VaultResult<()> {
        if threshold == 0 || threshold > self.signer_count() {
            return Err(VaultError::ThresholdInvalid {
                threshold,
                signer_count: self.signer_count(),
            });
        }
        Ok(())
    }

    pub(crate) fn add(&mut self, principal: Principal) {
        self.signers.insert(principal);
    }

    pub(crate) fn remove(&mut self, principal: &Principal) {
        self.signers.remove(principal);
    }

    pub(crate) fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }
}
