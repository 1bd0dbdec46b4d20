//! Proof generation for the withdrawal circuit.

use ark_bn254::{Bn254, Fr};
use ark_groth16::{Groth16, Proof};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use thiserror::Error;

use mixer_circuits::{Amount, MembershipPath, PoseidonHasher, PublicSignals, WithdrawCircuit};

use crate::note::Note;
use crate::setup::CircuitKeys;

/// Errors during proof generation
#[derive(Error, Debug)]
pub enum ProveError {
    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),
    #[error("Invalid withdrawal witness: {0}")]
    InvalidWitness(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

/// Withdrawal parameters that end up as public signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WithdrawTarget {
    pub recipient: Fr,
    pub relayer: Fr,
    pub fee: Amount,
    pub refund: Amount,
}

/// A proof with its public signals
#[derive(Clone)]
pub struct ProofWithSignals {
    pub proof: Proof<Bn254>,
    pub signals: PublicSignals,
}

impl ProofWithSignals {
    /// Serialize proof to bytes
    pub fn serialize_proof(&self) -> Result<Vec<u8>, ProveError> {
        let mut bytes = Vec::new();
        self.proof
            .serialize_compressed(&mut bytes)
            .map_err(|e| ProveError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proof from bytes
    pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ProveError> {
        Proof::deserialize_compressed(bytes).map_err(|e| ProveError::Serialization(e.to_string()))
    }
}

/// Generate a withdrawal proof for `note` along `path`.
pub fn prove_withdrawal(
    keys: &CircuitKeys,
    note: &Note,
    path: MembershipPath,
    target: WithdrawTarget,
) -> Result<ProofWithSignals, ProveError> {
    let mut rng = StdRng::from_entropy();
    prove_withdrawal_with_rng(keys, note, path, target, &mut rng)
}

/// Generate a withdrawal proof with caller-supplied randomness.
pub fn prove_withdrawal_with_rng<R: RngCore + CryptoRng>(
    keys: &CircuitKeys,
    note: &Note,
    path: MembershipPath,
    target: WithdrawTarget,
    rng: &mut R,
) -> Result<ProofWithSignals, ProveError> {
    if target.fee > note.denomination() {
        return Err(ProveError::InvalidWitness(format!(
            "fee {} exceeds denomination {}",
            target.fee,
            note.denomination()
        )));
    }
    if note.chain_id() != keys.params.chain_id {
        return Err(ProveError::InvalidWitness(format!(
            "note is for chain {}, keys for chain {}",
            note.chain_id(),
            keys.params.chain_id
        )));
    }
    if path.height() != keys.params.tree_height as usize {
        return Err(ProveError::InvalidWitness(format!(
            "path height {} does not match key height {}",
            path.height(),
            keys.params.tree_height
        )));
    }

    let circuit = WithdrawCircuit::new(
        note.chain_id(),
        note.nullifier(),
        note.secret(),
        path,
        target.recipient,
        target.relayer,
        target.fee,
        target.refund,
    );
    let signals = circuit
        .public_signals()
        .ok_or_else(|| ProveError::InvalidWitness("missing public input".to_string()))?;

    let proof = Groth16::<Bn254>::prove(&keys.withdraw.proving_key, circuit, rng)
        .map_err(|e| ProveError::ProofGeneration(e.to_string()))?;

    Ok(ProofWithSignals { proof, signals })
}

/// The root a membership path leads to for `note`.
pub fn path_root(note: &Note, path: &MembershipPath) -> Fr {
    path.compute_root(note.commitment(), &PoseidonHasher)
}
