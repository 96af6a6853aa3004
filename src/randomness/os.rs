//! Operating-system randomness via `ring`.

use super::traits::{RandomnessError, RandomnessResult, RandomnessSource};
use async_trait::async_trait;
use ring::rand::{SecureRandom, SystemRandom};

/// Bytes drawn per call.
const RANDOM_BYTES: usize = 32;

/// Randomness backed by the OS CSPRNG.
pub struct OsRandomness {
    rng: SystemRandom,
}

impl OsRandomness {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for OsRandomness {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RandomnessSource for OsRandomness {
    async fn raw_random_bytes(&self) -> RandomnessResult<Vec<u8>> {
        let mut bytes = vec![0u8; RANDOM_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| RandomnessError::Unavailable("system random fill failed".to_string()))?;
        Ok(bytes)
    }
}
