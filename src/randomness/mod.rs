//! Randomness gateway.
//!
//! Boundary adapter over an external source of unpredictable bytes. Each
//! proposal creation makes exactly one call and derives its id from the
//! returned bytes.

pub mod id;
pub mod mock;
pub mod os;
pub mod traits;

pub use id::derive_proposal_id;
pub use mock::MockRandomness;
pub use os::OsRandomness;
pub use traits::{RandomnessError, RandomnessResult, RandomnessSource};
