//! Ledger call contract.
//!
//! The ledger is an external service; these types mirror its narrow
//! interface (balance, fee, transfer) and nothing more.

use crate::clock::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// e8s per whole token.
pub const E8S_PER_TOKEN: u64 = 100_000_000;

/// Ledger block height.
pub type BlockIndex = u64;

/// Token amount in e8s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Tokens {
    pub e8s: u64,
}

impl Tokens {
    pub const ZERO: Tokens = Tokens { e8s: 0 };

    pub const fn from_e8s(e8s: u64) -> Self {
        Self { e8s }
    }

    pub fn checked_add(self, other: Tokens) -> Option<Tokens> {
        self.e8s.checked_add(other.e8s).map(Tokens::from_e8s)
    }

    pub fn checked_sub(self, other: Tokens) -> Option<Tokens> {
        self.e8s.checked_sub(other.e8s).map(Tokens::from_e8s)
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:08} ICP",
            self.e8s / E8S_PER_TOKEN,
            self.e8s % E8S_PER_TOKEN
        )
    }
}

/// 32-byte ledger account identifier, hex on the wire.
///
/// Derivation from a principal is the ledger's business; this type only
/// carries an already-derived identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId([u8; 32]);

/// Account identifier parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountIdError {
    #[error("Account id is not valid hex: {0}")]
    InvalidHex(String),

    #[error("Account id must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl AccountId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = AccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim()).map_err(|e| AccountIdError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AccountIdError::InvalidLength(bytes.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Arguments of a ledger transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferArgs {
    pub memo: u64,
    pub amount: Tokens,
    pub fee: Tokens,
    pub from_subaccount: Option<[u8; 32]>,
    pub to: AccountId,
    pub created_at_time: Option<Timestamp>,
}

/// Transfer refusals reported by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TransferError {
    #[error("bad fee, expected {expected_fee}")]
    BadFee { expected_fee: Tokens },

    #[error("insufficient funds, balance is {balance}")]
    InsufficientFunds { balance: Tokens },

    #[error("transaction too old, allowed window is {allowed_window_nanos}ns")]
    TxTooOld { allowed_window_nanos: u64 },

    #[error("transaction created in the future")]
    TxCreatedInFuture,

    #[error("duplicate of transaction in block {duplicate_of}")]
    TxDuplicate { duplicate_of: BlockIndex },

    #[error("ledger temporarily unavailable")]
    TemporarilyUnavailable,

    #[error("ledger error {error_code}: {message}")]
    GenericError { error_code: u64, message: String },
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger errors: either the call itself failed or the ledger refused it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum LedgerError {
    #[error("Ledger call failed: {0}")]
    Call(String),

    #[error("Transfer rejected: {0}")]
    Transfer(#[from] TransferError),
}

/// Trait abstraction for the external ledger.
///
/// Every method is a suspension point.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Balance held by `account`.
    async fn account_balance(&self, account: &AccountId) -> LedgerResult<Tokens>;

    /// Current transfer fee.
    async fn transfer_fee(&self) -> LedgerResult<Tokens>;

    /// Move funds out of the caller's account.
    async fn transfer(&self, args: TransferArgs) -> LedgerResult<BlockIndex>;
}
