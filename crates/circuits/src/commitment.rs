//! Note commitment and nullifier-hash scheme.
//!
//! - `commitment = H(nullifier, secret)`
//! - `nullifier_hash = H(nullifier, chain_id)`
//!
//! The recipient is deliberately absent from the nullifier hash: one note maps
//! to exactly one nullifier hash per chain, whoever it is withdrawn to.

use ark_bn254::Fr;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::hasher::{FieldHasher, PoseidonHasher};
use crate::poseidon::poseidon_hash_two_var;

/// Identifier of the chain a pool is deployed on.
pub type ChainId = u64;

/// Compute the leaf commitment for a note.
pub fn note_commitment(nullifier: Fr, secret: Fr) -> Fr {
    PoseidonHasher.hash_two(nullifier, secret)
}

/// Compute the public nullifier hash for a note on a chain.
pub fn nullifier_hash(nullifier: Fr, chain_id: ChainId) -> Fr {
    PoseidonHasher.hash_two(nullifier, Fr::from(chain_id))
}

/// Compute the commitment in-circuit.
pub fn note_commitment_var(
    cs: ConstraintSystemRef<Fr>,
    nullifier: &FpVar<Fr>,
    secret: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    poseidon_hash_two_var(cs, nullifier, secret)
}

/// Compute the nullifier hash in-circuit with `chain_id` as a constant.
pub fn nullifier_hash_var(
    cs: ConstraintSystemRef<Fr>,
    nullifier: &FpVar<Fr>,
    chain_id: ChainId,
) -> Result<FpVar<Fr>, SynthesisError> {
    let chain_var = FpVar::Constant(Fr::from(chain_id));
    poseidon_hash_two_var(cs, nullifier, &chain_var)
}
