//! Suspension-point gate for mock gateways.
//!
//! A `CallGate` parks one external call at its await point until the test
//! releases it, so other operations can be interleaved deterministically.

use tokio::sync::Notify;

/// One-shot gate shared between a mock and a test.
#[derive(Debug, Default)]
pub struct CallGate {
    entered: Notify,
    released: Notify,
}

impl CallGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the held call has reached the gate.
    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held call continue.
    pub fn release(&self) {
        self.released.notify_one();
    }

    /// Called by the mock: signal arrival, then park until released.
    pub async fn pass(&self) {
        self.entered.notify_one();
        self.released.notified().await;
    }
}
