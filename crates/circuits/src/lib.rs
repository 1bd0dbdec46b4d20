//! ZK circuits for the mixer pool.
//!
//! This crate provides:
//! - `PoseidonHasher`: the two-to-one hash behind commitments and tree nodes
//! - `MerkleAccumulator`: the append-only commitment tree
//! - `WithdrawCircuit`: prove a note is in the tree without revealing which

pub mod commitment;
pub mod hasher;
pub mod merkle;
pub mod poseidon;
pub mod signal;
pub mod withdraw;


pub use commitment::{note_commitment, nullifier_hash, ChainId};
pub use hasher::{FieldHasher, HasherError, PoseidonHasher};
#[cfg(any(test, feature = "test-utils"))]
pub use hasher::AdditionHasher;
pub use merkle::{
    zero_values, MembershipPath, MerkleAccumulator, MerkleError, DEFAULT_HEIGHT, MAX_HEIGHT,
};
pub use signal::{Amount, PublicSignals, NUM_PUBLIC_SIGNALS};
pub use withdraw::WithdrawCircuit;

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;
