//! Proof-of-work: a linear search over the nonce space.
//!
//! The search starts at nonce 0 and stops at the first nonce whose hash meets
//! the difficulty. It is CPU-bound and never yields; callers that need to stay
//! responsive run it on a blocking worker and stop it through the cancel flag.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::block::Candidate;
use crate::error::PowError;
use crate::hasher::ContentHasher;
use crate::types::Difficulty;

/// Attempts between checks of the cancel flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// A winning nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub hash: String,
    /// Hash evaluations performed, the winning one included.
    pub attempts: u64,
}

/// Search for a nonce that makes `candidate`'s hash meet `difficulty`.
///
/// On success the candidate holds the winning nonce and hash. On error the
/// candidate's nonce is unspecified.
pub fn solve(
    candidate: &mut Candidate,
    difficulty: Difficulty,
    hasher: &dyn ContentHasher,
    cancel: &AtomicBool,
) -> Result<Solution, PowError> {
    let template = candidate.nonce_template();
    let mut buf = Vec::new();
    let mut nonce: u64 = 0;
    let mut attempts: u64 = 0;

    loop {
        if attempts % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
            return Err(PowError::Cancelled { attempts });
        }

        template.write_with_nonce(nonce, &mut buf);
        let hash = hasher.digest_hex(&buf);
        attempts += 1;

        if difficulty.is_met_by(&hash) {
            candidate.set_solution(nonce, hash.clone());
            return Ok(Solution {
                nonce,
                hash,
                attempts,
            });
        }

        nonce = nonce.checked_add(1).ok_or(PowError::NonceSpaceExhausted)?;
    }
}
