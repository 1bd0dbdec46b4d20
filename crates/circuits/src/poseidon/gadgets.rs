//! In-circuit Poseidon over the mixer's single width-3 parameter set.
//!
//! Every tree node on a membership path, the commitment and the nullifier
//! hash go through [`poseidon_hash_two_var`]. Inputs are absorbed in the
//! order given; callers pass `(left, right)` for tree nodes.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::config::poseidon_config;

fn absorb_and_squeeze<'a>(
    cs: ConstraintSystemRef<Fr>,
    inputs: impl IntoIterator<Item = &'a FpVar<Fr>>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, poseidon_config());
    for input in inputs {
        sponge.absorb(input)?;
    }
    let mut out = sponge.squeeze_field_elements(1)?;
    out.pop().ok_or(SynthesisError::Unsatisfiable)
}

/// `H(a, b)` in-circuit; must agree with `poseidon_hash_two`.
pub fn poseidon_hash_two_var(
    cs: ConstraintSystemRef<Fr>,
    a: &FpVar<Fr>,
    b: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    absorb_and_squeeze(cs, [a, b])
}

pub fn poseidon_hash_many_var(
    cs: ConstraintSystemRef<Fr>,
    inputs: &[FpVar<Fr>],
) -> Result<FpVar<Fr>, SynthesisError> {
    absorb_and_squeeze(cs, inputs)
}
