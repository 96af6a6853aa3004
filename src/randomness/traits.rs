//! Trait abstraction for the randomness source.

use async_trait::async_trait;

/// Result type for randomness operations.
pub type RandomnessResult<T> = Result<T, RandomnessError>;

/// Randomness source errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RandomnessError {
    #[error("Randomness source unavailable: {0}")]
    Unavailable(String),

    #[error("Randomness source returned no bytes")]
    Empty,
}

/// External source of unpredictable bytes.
///
/// Each call is a suspension point: other vault operations may run before it
/// resolves.
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    async fn raw_random_bytes(&self) -> RandomnessResult<Vec<u8>>;
}
