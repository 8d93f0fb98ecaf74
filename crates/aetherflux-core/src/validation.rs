//! Block validation: chain linkage, proof-of-work, and hash integrity.

use crate::block::{Block, GENESIS_PREVIOUS_HASH};
use crate::error::{IntegrityViolation, ValidationError};
use crate::hasher::ContentHasher;
use crate::types::Difficulty;

/// Validate a candidate block against the current tip.
///
/// Checks, in order:
/// 1. `previous_hash` matches the tip's hash
/// 2. `proof` carries the difficulty's zero prefix
/// 3. `proof` equals the candidate's recomputed hash
/// 4. the candidate sits directly after the tip
///
/// A proof that equals the recomputed hash but lacks the prefix fails at (2).
pub fn validate_append(
    tip: &Block,
    candidate: &Block,
    proof: &str,
    difficulty: Difficulty,
    hasher: &dyn ContentHasher,
) -> Result<(), IntegrityViolation> {
    // 1. Linkage
    if candidate.previous_hash() != tip.hash() {
        return Err(IntegrityViolation::StaleTip {
            expected: tip.hash().to_string(),
            got: candidate.previous_hash().to_string(),
        });
    }

    // 2. Work
    if !difficulty.is_met_by(proof) {
        return Err(IntegrityViolation::InsufficientWork {
            difficulty: difficulty.zeros(),
            proof: proof.to_string(),
        });
    }

    // 3. Integrity
    let computed = candidate.compute_hash(hasher);
    if computed != proof {
        return Err(IntegrityViolation::HashMismatch {
            proof: proof.to_string(),
            computed,
        });
    }

    // 4. Position
    if tip.index().checked_add(1) != Some(candidate.index()) {
        return Err(IntegrityViolation::IndexMismatch {
            expected: tip.index().saturating_add(1),
            got: candidate.index(),
        });
    }

    Ok(())
}

/// Validate a genesis block's structure and stored hash.
///
/// Genesis carries no proof-of-work.
pub fn validate_genesis(
    genesis: &Block,
    hasher: &dyn ContentHasher,
) -> Result<(), IntegrityViolation> {
    if genesis.index() != 0 {
        return Err(IntegrityViolation::IndexMismatch {
            expected: 0,
            got: genesis.index(),
        });
    }

    if genesis.previous_hash() != GENESIS_PREVIOUS_HASH {
        return Err(IntegrityViolation::MalformedGenesis(format!(
            "previous_hash is {:?}",
            genesis.previous_hash()
        )));
    }

    let computed = genesis.compute_hash(hasher);
    if computed != genesis.hash() {
        return Err(IntegrityViolation::HashMismatch {
            proof: genesis.hash().to_string(),
            computed,
        });
    }

    Ok(())
}

/// Check that every link points at a block that already exists.
pub fn validate_links(links: &[u64], chain_len: u64) -> Result<(), ValidationError> {
    match links.iter().find(|&&link| link >= chain_len) {
        Some(&link) => Err(ValidationError::DanglingLink { link, chain_len }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockBuilder;
    use crate::hasher::Sha256Hasher;
    use crate::pow::solve;
    use std::sync::atomic::AtomicBool;

    fn difficulty(zeros: u32) -> Difficulty {
        Difficulty::new(zeros).unwrap()
    }

    fn genesis() -> Block {
        Block::genesis(1_700_000_000.0, &Sha256Hasher)
    }

    fn mined_after(tip: &Block, d: Difficulty) -> (Block, String) {
        let mut candidate = BlockBuilder::new(tip.index() + 1, tip.hash())
            .timestamp(1_700_000_100.0)
            .topic("T")
            .content("C")
            .build(&Sha256Hasher);
        let solution = solve(&mut candidate, d, &Sha256Hasher, &AtomicBool::new(false)).unwrap();
        (candidate.seal(), solution.hash)
    }

    #[test]
    fn test_valid_append() {
        let tip = genesis();
        let (block, proof) = mined_after(&tip, difficulty(2));
        assert!(validate_append(&tip, &block, &proof, difficulty(2), &Sha256Hasher).is_ok());
    }

    #[test]
    fn test_stale_tip_rejected_regardless_of_proof() {
        let tip = genesis();
        let other_tip = Block::genesis(1_600_000_000.0, &Sha256Hasher);
        let (block, proof) = mined_after(&other_tip, difficulty(2));
        assert!(matches!(
            validate_append(&tip, &block, &proof, difficulty(2), &Sha256Hasher),
            Err(IntegrityViolation::StaleTip { .. })
        ));
    }

    #[test]
    fn test_insufficient_work_rejected_even_if_hash_matches() {
        let tip = genesis();
        // Nonce 0; no real digest is all zeros.
        let block = BlockBuilder::new(1, tip.hash())
            .timestamp(1_700_000_100.0)
            .topic("T")
            .seal(&Sha256Hasher);
        let proof = block.compute_hash(&Sha256Hasher);
        assert!(matches!(
            validate_append(&tip, &block, &proof, difficulty(64), &Sha256Hasher),
            Err(IntegrityViolation::InsufficientWork { difficulty: 64, .. })
        ));
    }

    #[test]
    fn test_hash_mismatch_rejected() {
        let tip = genesis();
        let (block, _) = mined_after(&tip, difficulty(1));
        let forged = format!("0{}", "f".repeat(63));
        assert!(matches!(
            validate_append(&tip, &block, &forged, difficulty(1), &Sha256Hasher),
            Err(IntegrityViolation::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_index_mismatch_rejected() {
        let tip = genesis();
        let mut candidate = BlockBuilder::new(5, tip.hash())
            .timestamp(1_700_000_100.0)
            .build(&Sha256Hasher);
        let solution =
            solve(&mut candidate, difficulty(1), &Sha256Hasher, &AtomicBool::new(false)).unwrap();
        assert_eq!(
            validate_append(&tip, &candidate.seal(), &solution.hash, difficulty(1), &Sha256Hasher),
            Err(IntegrityViolation::IndexMismatch { expected: 1, got: 5 })
        );
    }

    #[test]
    fn test_index_after_max_tip_rejected() {
        let tip = BlockBuilder::new(u64::MAX, "00ab")
            .timestamp(1_700_000_000.0)
            .seal(&Sha256Hasher);
        let mut candidate = BlockBuilder::new(0, tip.hash())
            .timestamp(1_700_000_100.0)
            .build(&Sha256Hasher);
        let solution =
            solve(&mut candidate, difficulty(1), &Sha256Hasher, &AtomicBool::new(false)).unwrap();
        assert!(matches!(
            validate_append(&tip, &candidate.seal(), &solution.hash, difficulty(1), &Sha256Hasher),
            Err(IntegrityViolation::IndexMismatch { got: 0, .. })
        ));
    }

    #[test]
    fn test_validate_genesis() {
        assert!(validate_genesis(&genesis(), &Sha256Hasher).is_ok());

        let not_genesis = BlockBuilder::new(0, "abc").timestamp(1.0).seal(&Sha256Hasher);
        assert!(matches!(
            validate_genesis(&not_genesis, &Sha256Hasher),
            Err(IntegrityViolation::MalformedGenesis(_))
        ));
    }

    #[test]
    fn test_validate_links() {
        assert!(validate_links(&[], 0).is_ok());
        assert!(validate_links(&[0, 1], 2).is_ok());
        assert_eq!(
            validate_links(&[0, 2], 2),
            Err(ValidationError::DanglingLink { link: 2, chain_len: 2 })
        );
    }
}
