//! In-circuit membership path verification using Poseidon.

use ark_bn254::Fr;
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use super::path::MembershipPath;
use crate::poseidon::poseidon_hash_two_var;

/// Circuit variable representation of a membership path.
#[derive(Clone)]
pub struct MembershipPathVar {
    /// Sibling hashes as circuit variables
    siblings: Vec<FpVar<Fr>>,

    /// Direction booleans as circuit variables
    path_bits: Vec<Boolean<Fr>>,
}

impl MembershipPathVar {
    /// Allocate a membership path as witness variables.
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        path: &MembershipPath,
    ) -> Result<Self, SynthesisError> {
        let siblings = path
            .siblings()
            .iter()
            .map(|h| FpVar::new_witness(cs.clone(), || Ok(*h)))
            .collect::<Result<Vec<_>, _>>()?;

        let path_bits = path
            .path_bits()
            .iter()
            .map(|&b| Boolean::new_witness(cs.clone(), || Ok(b)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            siblings,
            path_bits,
        })
    }

    /// Get the sibling variables.
    pub fn siblings(&self) -> &[FpVar<Fr>] {
        &self.siblings
    }

    /// Get the direction variables.
    pub fn path_bits(&self) -> &[Boolean<Fr>] {
        &self.path_bits
    }

    /// Get the path height.
    pub fn height(&self) -> usize {
        self.siblings.len()
    }
}

/// Compute the root from a leaf and membership path in-circuit.
pub fn compute_root_from_path(
    cs: ConstraintSystemRef<Fr>,
    leaf: &FpVar<Fr>,
    path: &MembershipPathVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in path.siblings.iter().zip(path.path_bits.iter()) {
        // If is_right: H(sibling, current), else H(current, sibling)
        let left = is_right.select(sibling, &current)?;
        let right = is_right.select(&current, sibling)?;

        current = poseidon_hash_two_var(cs.clone(), &left, &right)?;
    }

    Ok(current)
}

/// Constrain `leaf` to sit under `expected_root` along `path`.
pub fn verify_membership(
    cs: ConstraintSystemRef<Fr>,
    expected_root: &FpVar<Fr>,
    leaf: &FpVar<Fr>,
    path: &MembershipPathVar,
) -> Result<(), SynthesisError> {
    let computed_root = compute_root_from_path(cs, leaf, path)?;
    computed_root.enforce_equal(expected_root)
}
