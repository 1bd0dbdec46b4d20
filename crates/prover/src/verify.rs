//! Groth16 verification of withdrawal proofs.

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;
use ark_snark::SNARK;
use thiserror::Error;

use mixer_circuits::PublicSignals;

/// Errors during verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Malformed proof: {0}")]
    MalformedProof(String),
    #[error("Verification failed: {0}")]
    Verification(String),
}

/// Checks a serialized proof against a public-signal tuple.
///
/// Implementations are pure: they never touch pool state.
pub trait ProofVerifier: Send + Sync + 'static {
    fn verify(&self, signals: &PublicSignals, proof: &[u8]) -> Result<bool, VerifyError>;
}

/// Verifier holding a processed Groth16 verifying key.
#[derive(Clone)]
pub struct Groth16Verifier {
    pvk: PreparedVerifyingKey<Bn254>,
}

impl Groth16Verifier {
    pub fn new(vk: &VerifyingKey<Bn254>) -> Result<Self, VerifyError> {
        let pvk = Groth16::<Bn254>::process_vk(vk)
            .map_err(|e| VerifyError::Verification(e.to_string()))?;
        Ok(Self { pvk })
    }
}

impl ProofVerifier for Groth16Verifier {
    fn verify(&self, signals: &PublicSignals, proof: &[u8]) -> Result<bool, VerifyError> {
        let proof = Proof::<Bn254>::deserialize_compressed(proof)
            .map_err(|e| VerifyError::MalformedProof(e.to_string()))?;

        Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, &signals.to_field_elements(), &proof)
            .map_err(|e| VerifyError::Verification(e.to_string()))
    }
}

/// Verify a withdrawal proof against an unprocessed key.
pub fn verify_withdrawal(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    signals: &PublicSignals,
) -> Result<bool, VerifyError> {
    Groth16::<Bn254>::verify(vk, &signals.to_field_elements(), proof)
        .map_err(|e| VerifyError::Verification(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::NoteCodec;
    use crate::prove::{prove_withdrawal_with_rng, WithdrawTarget};
    use crate::setup::{setup_withdraw, CircuitKeys, KeyParams};
    use ark_bn254::Fr;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use mixer_circuits::MerkleAccumulator;

    #[test]
    fn test_verify_withdrawal() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = CircuitKeys {
            params: KeyParams {
                tree_height: 3,
                chain_id: 1,
            },
            withdraw: setup_withdraw(&mut rng, 3, 1).unwrap(),
        };
        let verifier = Groth16Verifier::new(&keys.withdraw.verifying_key).unwrap();

        let codec = NoteCodec::default();
        let mut tree = MerkleAccumulator::new(3).unwrap();
        let (other, _) = codec.generate_with_rng(&mut rng, 1);
        tree.insert(other.commitment()).unwrap();
        let (note, _) = codec.generate_with_rng(&mut rng, 1);
        let (index, _) = tree.insert(note.commitment()).unwrap();

        let target = WithdrawTarget {
            recipient: Fr::from(0xaaaau64),
            relayer: Fr::from(0xbbbbu64),
            fee: 1_000,
            refund: 0,
        };
        let result = prove_withdrawal_with_rng(
            &keys,
            &note,
            tree.membership_path(index).unwrap(),
            target,
            &mut rng,
        )
        .unwrap();
        let bytes = result.serialize_proof().unwrap();

        assert!(verify_withdrawal(&keys.withdraw.verifying_key, &result.proof, &result.signals).unwrap());
        assert!(verifier.verify(&result.signals, &bytes).unwrap());

        // Same proof, different recipient
        let mut stolen = result.signals;
        stolen.recipient = Fr::from(0xccccu64);
        assert!(!verifier.verify(&stolen, &bytes).unwrap());
    }

    #[test]
    fn test_garbage_proof_is_error() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_withdraw(&mut rng, 2, 1).unwrap();
        let verifier = Groth16Verifier::new(&keys.verifying_key).unwrap();

        let signals = PublicSignals {
            root: Fr::from(1u64),
            nullifier_hash: Fr::from(2u64),
            recipient: Fr::from(3u64),
            relayer: Fr::from(4u64),
            fee: 0,
            refund: 0,
        };

        assert!(matches!(
            verifier.verify(&signals, &[0u8; 5]),
            Err(VerifyError::MalformedProof(_))
        ));
        assert!(verifier.verify(&signals, &[0xffu8; 128]).is_err());
    }
}
