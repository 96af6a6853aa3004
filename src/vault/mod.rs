//! Vault orchestrator.
//!
//! - `state`: owned aggregate and the synchronous decide/guard/commit steps
//! - `orchestrator`: public operations composing state with external calls
//! - `snapshot`: persistence image and restore validation
//! - `error`: operation and initialization errors

pub mod error;
pub mod orchestrator;
pub mod snapshot;
pub mod state;

pub use error::{ErrorCategory, InitError, VaultError, VaultResult};
pub use orchestrator::{InitArgs, ProposalFilter, Vault};
pub use snapshot::{VaultSnapshot, SNAPSHOT_VERSION};
pub use state::VaultState;
