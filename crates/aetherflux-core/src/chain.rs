//! The chain: a non-empty, hash-linked sequence of blocks.

use thiserror::Error;

use crate::block::Block;
use crate::error::{CoreError, IntegrityViolation};
use crate::hasher::ContentHasher;
use crate::types::Difficulty;
use crate::validation::{validate_append, validate_genesis};

/// The first block of a chain that fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("block {index}: {violation}")]
pub struct ChainFault {
    pub index: u64,
    pub violation: IntegrityViolation,
}

/// An ordered, hash-linked list of blocks.
///
/// Never empty: the first block is always the genesis block.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Start a chain from its genesis block.
    pub fn from_genesis(genesis: Block) -> Self {
        Self {
            blocks: vec![genesis],
        }
    }

    /// Wrap blocks loaded from storage.
    ///
    /// Only emptiness is checked here; call [`Chain::verify`] for the rest.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, CoreError> {
        if blocks.is_empty() {
            return Err(CoreError::EmptyChain);
        }
        Ok(Self { blocks })
    }

    /// The most recently appended block.
    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false; present for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get the block at `index`.
    pub fn get(&self, index: u64) -> Option<&Block> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Blocks whose links include `index`, in chain order.
    pub fn backlinks(&self, index: u64) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.references(index))
    }

    /// Validate `block` against the tip and append it.
    ///
    /// The chain is unchanged on error.
    pub fn append(
        &mut self,
        block: Block,
        proof: &str,
        difficulty: Difficulty,
        hasher: &dyn ContentHasher,
    ) -> Result<(), IntegrityViolation> {
        validate_append(self.tip(), &block, proof, difficulty, hasher)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Re-run every check over the whole chain, using each block's stored
    /// hash as its proof.
    pub fn verify(
        &self,
        difficulty: Difficulty,
        hasher: &dyn ContentHasher,
    ) -> Result<(), ChainFault> {
        validate_genesis(self.genesis(), hasher).map_err(|violation| ChainFault {
            index: 0,
            violation,
        })?;

        for pair in self.blocks.windows(2) {
            let (prev, block) = (&pair[0], &pair[1]);
            validate_append(prev, block, block.hash(), difficulty, hasher).map_err(
                |violation| ChainFault {
                    index: block.index(),
                    violation,
                },
            )?;
        }

        Ok(())
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }
}
