//! Mock randomness source for testing.
//!
//! Seeded and deterministic, with scripted failures and an optional gate to
//! hold a call at its suspension point.

use super::traits::*;
use crate::gate::CallGate;
use async_trait::async_trait;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock randomness source.
#[derive(Clone)]
pub struct MockRandomness {
    state: Arc<Mutex<MockState>>,
}

struct MockState {
    rng: StdRng,
    scripted: VecDeque<RandomnessResult<Vec<u8>>>,
    held: Option<Arc<CallGate>>,
    calls: usize,
}

impl MockRandomness {
    /// Create a mock seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                rng: StdRng::seed_from_u64(seed),
                scripted: VecDeque::new(),
                held: None,
                calls: 0,
            })),
        }
    }

    /// Return `bytes` from the next unscripted call.
    pub fn push_bytes(&self, bytes: Vec<u8>) {
        self.state.lock().unwrap().scripted.push_back(Ok(bytes));
    }

    /// Fail the next unscripted call with `err`.
    pub fn fail_next(&self, err: RandomnessError) {
        self.state.lock().unwrap().scripted.push_back(Err(err));
    }

    /// Park the next call at its await point until the returned gate is released.
    pub fn hold_next_call(&self) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::new());
        self.state.lock().unwrap().held = Some(gate.clone());
        gate
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl RandomnessSource for MockRandomness {
    async fn raw_random_bytes(&self) -> RandomnessResult<Vec<u8>> {
        let held = {
            let mut state = self.state.lock().unwrap();
            state.calls += 1;
            state.held.take()
        };
        if let Some(gate) = held {
            gate.pass().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(scripted) = state.scripted.pop_front() {
            return scripted;
        }
        let mut bytes = vec![0u8; 32];
        state.rng.fill_bytes(&mut bytes);
        Ok(bytes)
    }
}
