//! Ledger gateway and call contract.
//!
//! - `traits`: the external ledger's narrow interface and its types
//! - `gateway`: vault-side transfer execution (fee lookup, error translation)
//! - `mock`: in-memory ledger for tests and the simulator

pub mod gateway;
pub mod mock;
pub mod traits;

pub use gateway::{LedgerGateway, TransferReceipt};
pub use mock::MockLedger;
pub use traits::{
    AccountId, AccountIdError, BlockIndex, Ledger, LedgerError, LedgerResult, Tokens,
    TransferArgs, TransferError,
};
