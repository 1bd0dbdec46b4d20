//! Fixed-height, append-only binary Merkle accumulator over commitments.
//!
//! This module provides:
//! - Native accumulator operations (insert, root, membership path)
//! - A reference root computation from an ordered leaf list
//! - In-circuit path verification gadgets

mod gadgets;
mod path;
mod tree;

#[cfg(test)]
mod tests;

use thiserror::Error;

pub use gadgets::{compute_root_from_path, verify_membership, MembershipPathVar};
pub use path::MembershipPath;
pub use tree::{zero_values, MerkleAccumulator, DEFAULT_HEIGHT, MAX_HEIGHT};

/// Errors from accumulator operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    #[error("Merkle tree is full ({capacity} leaves)")]
    CapacityExceeded { capacity: u64 },
    #[error("Leaf index {index} out of range (tree holds {len} leaves)")]
    IndexOutOfRange { index: u64, len: u64 },
    #[error("Tree height {0} is outside 1..={max}", max = MAX_HEIGHT)]
    InvalidHeight(u32),
    #[error("Path has {siblings} siblings but {bits} direction bits")]
    PathLength { siblings: usize, bits: usize },
}
