//! In-memory mock ledger.
//!
//! Keeps balances, enforces the fee and deduplicates identical transfers the
//! way the real ledger does. Failures can be scripted per call kind, and a
//! transfer can be held at its suspension point for interleaving tests.
//! Also backs the CLI simulator.

use super::traits::*;
use crate::gate::CallGate;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock ledger; clones share state.
#[derive(Clone)]
pub struct MockLedger {
    state: Arc<Mutex<MockState>>,
    owner: AccountId,
}

#[derive(Default)]
struct MockState {
    balances: HashMap<AccountId, Tokens>,
    fee: Tokens,
    blocks: Vec<TransferArgs>,
    fail_balance: Option<LedgerError>,
    fail_fee: Option<LedgerError>,
    fail_transfer: Option<LedgerError>,
    held_transfer: Option<Arc<CallGate>>,
    balance_calls: usize,
    fee_calls: usize,
    transfer_calls: usize,
}

impl MockLedger {
    /// Ledger whose transfers debit `owner`, charging `fee`.
    pub fn new(owner: AccountId, fee: Tokens) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                fee,
                ..MockState::default()
            })),
            owner,
        }
    }

    /// Credit `amount` to `account` (test setup).
    pub fn deposit(&self, account: AccountId, amount: Tokens) {
        let mut state = self.state.lock().unwrap();
        let balance = state.balances.entry(account).or_default();
        balance.e8s = balance.e8s.saturating_add(amount.e8s);
    }

    pub fn balance_of(&self, account: &AccountId) -> Tokens {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_fee(&self, fee: Tokens) {
        self.state.lock().unwrap().fee = fee;
    }

    /// Accepted transfers, in block order.
    pub fn transfers(&self) -> Vec<TransferArgs> {
        self.state.lock().unwrap().blocks.clone()
    }

    pub fn fail_next_balance(&self, err: LedgerError) {
        self.state.lock().unwrap().fail_balance = Some(err);
    }

    pub fn fail_next_fee(&self, err: LedgerError) {
        self.state.lock().unwrap().fail_fee = Some(err);
    }

    pub fn fail_next_transfer(&self, err: LedgerError) {
        self.state.lock().unwrap().fail_transfer = Some(err);
    }

    /// Park the next transfer at its await point until the gate is released.
    pub fn hold_next_transfer(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::new());
        self.state.lock().unwrap().held_transfer = Some(gate.clone());
        gate
    }

    pub fn balance_calls(&self) -> usize {
        self.state.lock().unwrap().balance_calls
    }

    pub fn fee_calls(&self) -> usize {
        self.state.lock().unwrap().fee_calls
    }

    pub fn transfer_calls(&self) -> usize {
        self.state.lock().unwrap().transfer_calls
    }

    /// Total ledger calls of any kind.
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.balance_calls + state.fee_calls + state.transfer_calls
    }
}

impl MockState {
    fn apply_transfer(&mut self, owner: AccountId, args: TransferArgs) -> LedgerResult<BlockIndex> {
        if args.fee != self.fee {
            return Err(TransferError::BadFee {
                expected_fee: self.fee,
            }
            .into());
        }

        if args.created_at_time.is_some() {
            if let Some(index) = self.blocks.iter().position(|block| *block == args) {
                return Err(TransferError::TxDuplicate {
                    duplicate_of: index as BlockIndex,
                }
                .into());
            }
        }

        let balance = self.balances.get(&owner).copied().unwrap_or_default();
        let remaining = args
            .amount
            .checked_add(args.fee)
            .and_then(|total| balance.checked_sub(total))
            .ok_or(TransferError::InsufficientFunds { balance })?;

        self.balances.insert(owner, remaining);
        let credited = self.balances.entry(args.to).or_default();
        credited.e8s = credited.e8s.saturating_add(args.amount.e8s);

        self.blocks.push(args);
        Ok((self.blocks.len() - 1) as BlockIndex)
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn account_balance(&self, account: &AccountId) -> LedgerResult<Tokens> {
        let mut state = self.state.lock().unwrap();
        state.balance_calls += 1;
        if let Some(err) = state.fail_balance.take() {
            return Err(err);
        }
        Ok(state.balances.get(account).copied().unwrap_or_default())
    }

    async fn transfer_fee(&self) -> LedgerResult<Tokens> {
        let mut state = self.state.lock().unwrap();
        state.fee_calls += 1;
        if let Some(err) = state.fail_fee.take() {
            return Err(err);
        }
        Ok(state.fee)
    }

    async fn transfer(&self, args: TransferArgs) -> LedgerResult<BlockIndex> {
        let held = {
            let mut state = self.state.lock().unwrap();
            state.transfer_calls += 1;
            state.held_transfer.take()
        };
        if let Some(gate) = held {
            gate.pass().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_transfer.take() {
            return Err(err);
        }
        state.apply_transfer(self.owner, args)
    }
}
