//! Two-to-one field hasher used for commitments, nullifier hashes and tree
//! nodes.
//!
//! The accumulator, the indexer and the pool are generic over
//! [`FieldHasher`]; production code uses [`PoseidonHasher`], whose parameters
//! are pinned by [`PoseidonHasher::self_check`].

use ark_bn254::Fr;
use ark_ff::MontFp;
use thiserror::Error;

use crate::merkle::zero_values;
use crate::poseidon::{poseidon_hash_many, poseidon_hash_two};

/// Errors raised when the hasher does not match its pinned parameterization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HasherError {
    #[error("Hash test vector `{name}` mismatch: expected {expected}, got {actual}")]
    VectorMismatch {
        name: &'static str,
        expected: String,
        actual: String,
    },
}

/// A deterministic hash from field elements to a single field element.
pub trait FieldHasher: Clone + Send + Sync + 'static {
    /// Hash an arbitrary-arity input.
    fn hash(&self, inputs: &[Fr]) -> Fr;

    /// Hash an ordered pair. `left` and `right` are positional, never sorted.
    fn hash_two(&self, left: Fr, right: Fr) -> Fr {
        self.hash(&[left, right])
    }
}

/// Poseidon over BN254, matching the in-circuit gadget bit for bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoseidonHasher;

impl FieldHasher for PoseidonHasher {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        poseidon_hash_many(inputs)
    }

    fn hash_two(&self, left: Fr, right: Fr) -> Fr {
        poseidon_hash_two(left, right)
    }
}

/// `H(0, 0)` under the pinned parameters.
pub const POSEIDON_ZERO_ZERO: Fr =
    MontFp!("15858722437969634021277434863330806311022733977152536287645663373535522924562");

/// `H(1, 2)` under the pinned parameters.
pub const POSEIDON_ONE_TWO: Fr =
    MontFp!("13628096841998704624838090622412275379873655132427263500056616005452201631747");

/// Root of an empty height-20 tree under the pinned parameters.
pub const POSEIDON_EMPTY_ROOT_20: Fr =
    MontFp!("15557437646823134688198018919152291618088300916357219802827704743262136303104");

impl PoseidonHasher {
    /// Check the hasher against fixed test vectors.
    ///
    /// Run at startup by anything that writes roots or nullifier hashes; a
    /// mismatch means roots computed here will never match a circuit built
    /// with the reference constants.
    pub fn self_check(&self) -> Result<(), HasherError> {
        let vectors = [
            ("H(0,0)", Fr::from(0u64), Fr::from(0u64), POSEIDON_ZERO_ZERO),
            ("H(1,2)", Fr::from(1u64), Fr::from(2u64), POSEIDON_ONE_TWO),
        ];

        for (name, left, right, expected) in vectors {
            let actual = self.hash_two(left, right);
            if actual != expected {
                return Err(HasherError::VectorMismatch {
                    name,
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        let empty_root = zero_values(self, 20)[20];
        if empty_root != POSEIDON_EMPTY_ROOT_20 {
            return Err(HasherError::VectorMismatch {
                name: "empty root (height 20)",
                expected: POSEIDON_EMPTY_ROOT_20.to_string(),
                actual: empty_root.to_string(),
            });
        }

        Ok(())
    }
}

/// Integer addition. Not collision resistant; for deterministic tests only.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct AdditionHasher;

#[cfg(any(test, feature = "test-utils"))]
impl FieldHasher for AdditionHasher {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        inputs.iter().copied().sum()
    }
}
