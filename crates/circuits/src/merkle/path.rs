//! Membership path: the witness a prover needs to recompute a root.

use ark_bn254::Fr;
use ark_ff::Zero;

use super::MerkleError;
use crate::hasher::FieldHasher;

/// Siblings and direction bits from the leaf level up to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MembershipPath {
    /// Index of the leaf this path belongs to
    leaf_index: u64,

    /// Sibling hashes from leaf level (0) to the level below the root
    siblings: Vec<Fr>,

    /// Direction at each level: true = current node is the right child
    path_bits: Vec<bool>,
}

impl MembershipPath {
    /// Create a new membership path; one direction bit per sibling.
    pub fn new(
        leaf_index: u64,
        siblings: Vec<Fr>,
        path_bits: Vec<bool>,
    ) -> Result<Self, MerkleError> {
        if siblings.len() != path_bits.len() {
            return Err(MerkleError::PathLength {
                siblings: siblings.len(),
                bits: path_bits.len(),
            });
        }
        Ok(Self {
            leaf_index,
            siblings,
            path_bits,
        })
    }

    /// A placeholder path of the given height, used for circuit setup.
    pub fn empty(height: u32) -> Self {
        Self {
            leaf_index: 0,
            siblings: vec![Fr::zero(); height as usize],
            path_bits: vec![false; height as usize],
        }
    }

    /// Get the leaf index.
    pub fn leaf_index(&self) -> u64 {
        self.leaf_index
    }

    /// Get the sibling hashes.
    pub fn siblings(&self) -> &[Fr] {
        &self.siblings
    }

    /// Get the direction bits.
    pub fn path_bits(&self) -> &[bool] {
        &self.path_bits
    }

    /// Direction bits as the 0/1 integers circuits usually take.
    pub fn path_indices(&self) -> Vec<u8> {
        self.path_bits.iter().map(|&bit| bit as u8).collect()
    }

    /// Get the path height.
    pub fn height(&self) -> usize {
        self.siblings.len()
    }

    /// Recompute the root reached from `leaf` along this path.
    pub fn compute_root<H: FieldHasher>(&self, leaf: Fr, hasher: &H) -> Fr {
        let mut current = leaf;

        for (sibling, &is_right) in self.siblings.iter().zip(self.path_bits.iter()) {
            current = if is_right {
                hasher.hash_two(*sibling, current)
            } else {
                hasher.hash_two(current, *sibling)
            };
        }

        current
    }

    /// Check that `leaf` sits under `root` along this path.
    pub fn verify<H: FieldHasher>(&self, leaf: Fr, root: Fr, hasher: &H) -> bool {
        self.compute_root(leaf, hasher) == root
    }
}
