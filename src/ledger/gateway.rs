//! Ledger gateway.
//!
//! Executes vault transfers against the external ledger: fee lookup, the
//! transfer itself, and translation of ledger refusals into `LedgerError`.
//! Nothing here retries. A funds-moving call that failed is reported to the
//! caller as-is.

use super::traits::{AccountId, BlockIndex, Ledger, LedgerResult, Tokens, TransferArgs};
use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};

/// Receipt of a completed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub block_index: BlockIndex,
    pub fee: Tokens,
}

/// Ledger access bound to the vault's own account.
pub struct LedgerGateway<L> {
    ledger: L,
    vault_account: AccountId,
}

impl<L: Ledger> LedgerGateway<L> {
    pub fn new(ledger: L, vault_account: AccountId) -> Self {
        Self {
            ledger,
            vault_account,
        }
    }

    pub fn vault_account(&self) -> AccountId {
        self.vault_account
    }

    /// Balance of the vault account.
    pub async fn balance(&self) -> LedgerResult<Tokens> {
        self.ledger.account_balance(&self.vault_account).await
    }

    pub async fn fee(&self) -> LedgerResult<Tokens> {
        self.ledger.transfer_fee().await
    }

    /// Submit one transfer from the vault account with an explicit fee.
    pub async fn transfer(
        &self,
        to: AccountId,
        amount: Tokens,
        fee: Tokens,
        memo: u64,
        created_at: Timestamp,
    ) -> LedgerResult<BlockIndex> {
        let args = TransferArgs {
            memo,
            amount,
            fee,
            from_subaccount: None,
            to,
            created_at_time: Some(created_at),
        };
        match self.ledger.transfer(args).await {
            Ok(block_index) => {
                tracing::info!(%to, %amount, %fee, block_index, "ledger transfer completed");
                Ok(block_index)
            }
            Err(err) => {
                tracing::warn!(%to, %amount, error = %err, "ledger transfer failed");
                Err(err)
            }
        }
    }

    /// Look up the current fee, then transfer with it.
    ///
    /// Two suspension points: the fee lookup and the transfer.
    pub async fn execute_transfer(
        &self,
        to: AccountId,
        amount: Tokens,
        memo: u64,
        created_at: Timestamp,
    ) -> LedgerResult<TransferReceipt> {
        let fee = self.fee().await?;
        let block_index = self.transfer(to, amount, fee, memo, created_at).await?;
        Ok(TransferReceipt { block_index, fee })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::mock::MockLedger;
    use crate::ledger::traits::{LedgerError, TransferError};

    const VAULT: AccountId = AccountId::from_bytes([1; 32]);
    const DEST: AccountId = AccountId::from_bytes([2; 32]);

    fn gateway(balance: u64) -> (LedgerGateway<MockLedger>, MockLedger) {
        let ledger = MockLedger::new(VAULT, Tokens::from_e8s(10));
        ledger.deposit(VAULT, Tokens::from_e8s(balance));
        (LedgerGateway::new(ledger.clone(), VAULT), ledger)
    }

    #[tokio::test]
    async fn test_execute_transfer_uses_current_fee() {
        let (gateway, ledger) = gateway(1_000);

        let receipt = gateway
            .execute_transfer(DEST, Tokens::from_e8s(100), 7, Timestamp(5))
            .await
            .unwrap();

        assert_eq!(receipt.fee, Tokens::from_e8s(10));
        assert_eq!(receipt.block_index, 0);
        assert_eq!(ledger.balance_of(&VAULT), Tokens::from_e8s(890));
        assert_eq!(ledger.balance_of(&DEST), Tokens::from_e8s(100));

        let sent = ledger.transfers();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].memo, 7);
        assert_eq!(sent[0].created_at_time, Some(Timestamp(5)));
    }

    #[tokio::test]
    async fn test_transfer_errors_surface_verbatim() {
        let (gateway, ledger) = gateway(50);

        let err = gateway
            .execute_transfer(DEST, Tokens::from_e8s(100), 0, Timestamp(1))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::Transfer(TransferError::InsufficientFunds {
                balance: Tokens::from_e8s(50)
            })
        );
        assert_eq!(ledger.transfer_calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_ledger_is_not_retried() {
        let (gateway, ledger) = gateway(1_000);
        ledger.fail_next_transfer(TransferError::TemporarilyUnavailable.into());

        let err = gateway
            .execute_transfer(DEST, Tokens::from_e8s(1), 0, Timestamp(1))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::Transfer(TransferError::TemporarilyUnavailable)
        );
        assert_eq!(ledger.transfer_calls(), 1);
        assert_eq!(ledger.balance_of(&VAULT), Tokens::from_e8s(1_000));
    }

    #[tokio::test]
    async fn test_fee_failure_skips_transfer() {
        let (gateway, ledger) = gateway(1_000);
        ledger.fail_next_fee(LedgerError::Call("unreachable".to_string()));

        let err = gateway
            .execute_transfer(DEST, Tokens::from_e8s(1), 0, Timestamp(1))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Call(_)));
        assert_eq!(ledger.transfer_calls(), 0);
    }

    #[tokio::test]
    async fn test_balance_reads_vault_account() {
        let (gateway, _ledger) = gateway(321);
        assert_eq!(gateway.balance().await.unwrap(), Tokens::from_e8s(321));
        assert_eq!(gateway.vault_account(), VAULT);
    }
}
