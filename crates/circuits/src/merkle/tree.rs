//! Append-only Merkle accumulator.
//!
//! Leaves are placed left to right in insertion order. A node whose right
//! sibling has not been populated yet is paired with the zero value of that
//! level, where `zeros[0] = 0` and `zeros[i] = H(zeros[i-1], zeros[i-1])`.
//! Pairs are always hashed as `H(left, right)` by position; the numeric
//! order of the two hashes never matters.

use ark_bn254::Fr;
use ark_ff::Zero;
use rayon::prelude::*;

use super::path::MembershipPath;
use super::MerkleError;
use crate::hasher::{FieldHasher, PoseidonHasher};

/// Default tree height (20 levels = 1,048,576 deposits)
pub const DEFAULT_HEIGHT: u32 = 20;

/// Largest supported height; leaf indices are `u64`.
pub const MAX_HEIGHT: u32 = 32;

/// Compute the per-level padding values for an empty subtree.
///
/// Returns `height + 1` values; the last one is the empty-tree root.
pub fn zero_values<H: FieldHasher>(hasher: &H, height: u32) -> Vec<Fr> {
    let mut zeros = Vec::with_capacity(height as usize + 1);
    let mut current = Fr::zero();
    zeros.push(current);

    for _ in 0..height {
        current = hasher.hash_two(current, current);
        zeros.push(current);
    }

    zeros
}

/// Fixed-height Merkle accumulator.
#[derive(Clone, Debug)]
pub struct MerkleAccumulator<H: FieldHasher = PoseidonHasher> {
    hasher: H,

    /// Tree height (number of levels between the leaves and the root)
    height: u32,

    /// Populated nodes per level: `layers[0]` are the leaves,
    /// `layers[height]` holds the root once anything is inserted.
    layers: Vec<Vec<Fr>>,

    /// Padding value for an empty subtree at each level
    zeros: Vec<Fr>,
}

impl MerkleAccumulator<PoseidonHasher> {
    /// Create an empty Poseidon accumulator.
    pub fn new(height: u32) -> Result<Self, MerkleError> {
        Self::with_hasher(height, PoseidonHasher)
    }
}

impl<H: FieldHasher> MerkleAccumulator<H> {
    /// Create an empty accumulator with an explicit hasher.
    pub fn with_hasher(height: u32, hasher: H) -> Result<Self, MerkleError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MerkleError::InvalidHeight(height));
        }

        let zeros = zero_values(&hasher, height);
        let layers = vec![Vec::new(); height as usize + 1];

        Ok(Self {
            hasher,
            height,
            layers,
            zeros,
        })
    }

    /// Build an accumulator by inserting `leaves` in order.
    pub fn from_leaves(height: u32, hasher: H, leaves: &[Fr]) -> Result<Self, MerkleError> {
        let mut tree = Self::with_hasher(height, hasher)?;
        for &leaf in leaves {
            tree.insert(leaf)?;
        }
        Ok(tree)
    }

    /// Append a leaf at the next free index.
    ///
    /// Returns the leaf's index and the new root. Only the path from the new
    /// leaf to the root is rehashed.
    pub fn insert(&mut self, leaf: Fr) -> Result<(u64, Fr), MerkleError> {
        let index = self.len();
        if index >= self.capacity() {
            return Err(MerkleError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        self.layers[0].push(leaf);

        let mut node_index = index as usize;
        let mut current = leaf;

        for level in 0..self.height as usize {
            current = if node_index & 1 == 1 {
                // Right child: the left sibling is always populated.
                self.hasher.hash_two(self.layers[level][node_index - 1], current)
            } else {
                // Left child: appends are sequential, so nothing sits to the right yet.
                self.hasher.hash_two(current, self.zeros[level])
            };

            node_index >>= 1;
            let parents = &mut self.layers[level + 1];
            if node_index < parents.len() {
                parents[node_index] = current;
            } else {
                parents.push(current);
            }
        }

        Ok((index, current))
    }

    /// Get the current root.
    pub fn root(&self) -> Fr {
        self.layers[self.height as usize]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.height as usize])
    }

    /// Root of the empty tree of this height.
    pub fn empty_root(&self) -> Fr {
        self.zeros[self.height as usize]
    }

    /// Derive the witness for the leaf at `index`: one sibling and one
    /// direction bit per level, leaf level first.
    pub fn membership_path(&self, index: u64) -> Result<MembershipPath, MerkleError> {
        if index >= self.len() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }

        let mut siblings = Vec::with_capacity(self.height as usize);
        let mut path_bits = Vec::with_capacity(self.height as usize);

        let mut node_index = index as usize;
        for level in 0..self.height as usize {
            let sibling = self.layers[level]
                .get(node_index ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            siblings.push(sibling);
            path_bits.push(node_index & 1 == 1);
            node_index >>= 1;
        }

        MembershipPath::new(index, siblings, path_bits)
    }

    /// Recompute a root from scratch over an ordered leaf list.
    ///
    /// This is the reference algorithm every other implementation must agree
    /// with. Each level is hashed in parallel.
    pub fn compute_root(hasher: &H, height: u32, leaves: &[Fr]) -> Result<Fr, MerkleError> {
        if height == 0 || height > MAX_HEIGHT {
            return Err(MerkleError::InvalidHeight(height));
        }
        let capacity = 1u64 << height;
        if leaves.len() as u64 > capacity {
            return Err(MerkleError::CapacityExceeded { capacity });
        }

        let zeros = zero_values(hasher, height);
        if leaves.is_empty() {
            return Ok(zeros[height as usize]);
        }

        let mut level_nodes = leaves.to_vec();
        for zero in zeros.iter().take(height as usize) {
            level_nodes = level_nodes
                .par_chunks(2)
                .map(|pair| hasher.hash_two(pair[0], pair.get(1).copied().unwrap_or(*zero)))
                .collect();
        }

        Ok(level_nodes[0])
    }

    /// Look up a leaf by index.
    pub fn leaf(&self, index: u64) -> Option<Fr> {
        self.layers[0].get(index as usize).copied()
    }

    /// All leaves in insertion order.
    pub fn leaves(&self) -> &[Fr] {
        &self.layers[0]
    }

    /// Padding value for an empty subtree at `level`.
    pub fn zero_at_level(&self, level: u32) -> Fr {
        self.zeros[level as usize]
    }

    /// Get the hasher.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Get the tree height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Maximum number of leaves (`2^height`).
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    /// Number of inserted leaves; also the next free index.
    pub fn len(&self) -> u64 {
        self.layers[0].len() as u64
    }

    /// Check if no leaf has been inserted.
    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Check if every slot is taken.
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}
