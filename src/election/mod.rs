//! Election roles composing the cryptographic pipeline.

mod authority;
mod center;
mod tally;
mod voter;

pub use authority::{Authority, ElectionPhase};
pub use center::VotingCenter;
pub use tally::TallyingCenter;
pub use voter::Voter;

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::crypto_tools::{elgamal::Ciphertext, zkp::disjunctive::Proof};

/// A ballot bundle: ciphertext, validity proof and the voter's token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedVote {
    pub voter_id: String,
    pub token: String,
    pub ciphertext: Ciphertext,
    pub proof: Proof,
}

/// Snapshot of the voting centre's bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VotingStats {
    pub total_votes: usize,
    pub valid_votes: usize,
    pub rejected_votes: usize,
    pub registered_voters: usize,
    /// Valid ballots per registered voter, in percent.
    pub participation_rate: f64,
}

/// The core is single-threaded; a poisoned lock only means a sibling
/// panicked mid-operation. Recover the guard.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
