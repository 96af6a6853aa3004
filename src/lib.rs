//! Sigvault - Multi-Signature Vault Engine
//!
//! Guards a ledger account and its own governance parameters (signer set,
//! approval threshold) behind proposal-and-vote rounds.
//!
//! Key principles:
//! - Every change is a proposal; nothing mutates without a quorum of signers
//! - One vote per signer per proposal, terminal proposals stay terminal
//! - External calls (randomness, ledger) never hold state across a suspension
//!   point: check, call, then re-validate and commit

pub mod clock;
pub mod gate;
pub mod ledger;
pub mod membership;
pub mod proposals;
pub mod randomness;
pub mod serialization;
pub mod vault;

pub use membership::{Membership, Principal};
pub use vault::{InitArgs, Vault, VaultError, VaultResult};
