//! Withdrawal circuit.
//!
//! Proves knowledge of a note `(nullifier, secret)` whose commitment is a leaf
//! under `root`, and that `nullifier_hash` was derived from the same
//! nullifier, without revealing which leaf.
//!
//! Public inputs (see [`PublicSignals`]):
//! - root, nullifier_hash, recipient, relayer, fee, refund
//!
//! Witnesses:
//! - nullifier, secret
//! - membership path (siblings and direction bits)
//!
//! `chain_id` is compiled into the constraint system, so a key pair is only
//! valid for the chain it was set up for.

use ark_bn254::Fr;
use ark_ff::Zero;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use crate::commitment::{
    note_commitment, note_commitment_var, nullifier_hash, nullifier_hash_var, ChainId,
};
use crate::hasher::PoseidonHasher;
use crate::merkle::{verify_membership, MembershipPath, MembershipPathVar};
use crate::signal::{Amount, PublicSignals};

/// Withdrawal circuit.
#[derive(Clone)]
pub struct WithdrawCircuit {
    /// Tree height the circuit is built for
    pub height: u32,
    /// Chain the nullifier hash is bound to
    pub chain_id: ChainId,

    // Public inputs
    pub root: Option<Fr>,
    pub nullifier_hash: Option<Fr>,
    pub recipient: Option<Fr>,
    pub relayer: Option<Fr>,
    pub fee: Option<Amount>,
    pub refund: Option<Amount>,

    // Witnesses
    pub nullifier: Option<Fr>,
    pub secret: Option<Fr>,
    pub path: Option<MembershipPath>,
}

impl WithdrawCircuit {
    /// Create a new empty circuit for setup.
    /// Uses dummy values that produce valid constraint structure.
    pub fn empty(height: u32, chain_id: ChainId) -> Self {
        Self {
            height,
            chain_id,
            root: Some(Fr::zero()),
            nullifier_hash: Some(Fr::zero()),
            recipient: Some(Fr::zero()),
            relayer: Some(Fr::zero()),
            fee: Some(0),
            refund: Some(0),
            nullifier: Some(Fr::zero()),
            secret: Some(Fr::zero()),
            path: Some(MembershipPath::empty(height)),
        }
    }

    /// Create a circuit with all witnesses.
    ///
    /// `root` and `nullifier_hash` are derived from the note and path, so the
    /// circuit is satisfiable whenever the path is a real path for the note.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: ChainId,
        nullifier: Fr,
        secret: Fr,
        path: MembershipPath,
        recipient: Fr,
        relayer: Fr,
        fee: Amount,
        refund: Amount,
    ) -> Self {
        let leaf = note_commitment(nullifier, secret);
        let root = path.compute_root(leaf, &PoseidonHasher);

        Self {
            height: path.height() as u32,
            chain_id,
            root: Some(root),
            nullifier_hash: Some(nullifier_hash(nullifier, chain_id)),
            recipient: Some(recipient),
            relayer: Some(relayer),
            fee: Some(fee),
            refund: Some(refund),
            nullifier: Some(nullifier),
            secret: Some(secret),
            path: Some(path),
        }
    }

    /// The public inputs this circuit will be verified against.
    pub fn public_signals(&self) -> Option<PublicSignals> {
        Some(PublicSignals {
            root: self.root?,
            nullifier_hash: self.nullifier_hash?,
            recipient: self.recipient?,
            relayer: self.relayer?,
            fee: self.fee?,
            refund: self.refund?,
        })
    }
}

impl ConstraintSynthesizer<Fr> for WithdrawCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // === Allocate public inputs ===
        // Order matters: root, nullifier_hash, recipient, relayer, fee, refund
        let root_var = FpVar::new_input(cs.clone(), || {
            self.root.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nullifier_hash_var_in = FpVar::new_input(cs.clone(), || {
            self.nullifier_hash.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let recipient_var = FpVar::new_input(cs.clone(), || {
            self.recipient.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let relayer_var = FpVar::new_input(cs.clone(), || {
            self.relayer.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let fee_var = FpVar::new_input(cs.clone(), || {
            self.fee.map(Fr::from).ok_or(SynthesisError::AssignmentMissing)
        })?;
        let refund_var = FpVar::new_input(cs.clone(), || {
            self.refund.map(Fr::from).ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Allocate witnesses ===
        let nullifier_var = FpVar::new_witness(cs.clone(), || {
            self.nullifier.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let secret_var = FpVar::new_witness(cs.clone(), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let path = self.path.as_ref().ok_or(SynthesisError::AssignmentMissing)?;
        if path.height() != self.height as usize {
            return Err(SynthesisError::Unsatisfiable);
        }
        let path_var = MembershipPathVar::new_witness(cs.clone(), path)?;

        // === Constraint 1: commitment is a leaf under root ===
        let commitment_var = note_commitment_var(cs.clone(), &nullifier_var, &secret_var)?;
        verify_membership(cs.clone(), &root_var, &commitment_var, &path_var)?;

        // === Constraint 2: nullifier hash derives from the same nullifier ===
        let computed_hash = nullifier_hash_var(cs.clone(), &nullifier_var, self.chain_id)?;
        computed_hash.enforce_equal(&nullifier_hash_var_in)?;

        // === Constraint 3: bind the remaining public inputs ===
        // Without a constraint touching them, these inputs could be swapped
        // after proving.
        for input in [&recipient_var, &relayer_var, &fee_var, &refund_var] {
            let _square = input.square()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::MerkleAccumulator;
    use ark_relations::r1cs::ConstraintSystem;

    const CHAIN: ChainId = 1;

    fn deposit_note(tree: &mut MerkleAccumulator, nullifier: u64, secret: u64) -> (Fr, Fr, u64) {
        let n = Fr::from(nullifier);
        let s = Fr::from(secret);
        let (index, _) = tree.insert(note_commitment(n, s)).unwrap();
        (n, s, index)
    }

    fn build(tree: &MerkleAccumulator, n: Fr, s: Fr, index: u64) -> WithdrawCircuit {
        WithdrawCircuit::new(
            CHAIN,
            n,
            s,
            tree.membership_path(index).unwrap(),
            Fr::from(0xabcdu64),
            Fr::from(0x1234u64),
            10,
            0,
        )
    }

    #[test]
    fn test_withdraw_satisfied() {
        let mut tree = MerkleAccumulator::new(4).unwrap();
        deposit_note(&mut tree, 1, 2);
        let (n, s, index) = deposit_note(&mut tree, 3, 4);
        deposit_note(&mut tree, 5, 6);

        let circuit = build(&tree, n, s, index);
        assert_eq!(circuit.root, Some(tree.root()));

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();

        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_instance_variables(), 7); // 1 + 6 public inputs
        println!("Withdraw constraints (height 4): {}", cs.num_constraints());
    }

    #[test]
    fn test_withdraw_wrong_secret_fails() {
        let mut tree = MerkleAccumulator::new(4).unwrap();
        let (n, s, index) = deposit_note(&mut tree, 3, 4);

        let mut circuit = build(&tree, n, s, index);
        circuit.secret = Some(Fr::from(5u64));

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_withdraw_wrong_nullifier_hash_fails() {
        let mut tree = MerkleAccumulator::new(4).unwrap();
        let (n, s, index) = deposit_note(&mut tree, 3, 4);

        let mut circuit = build(&tree, n, s, index);
        // Nullifier hash for another chain
        circuit.nullifier_hash = Some(nullifier_hash(n, CHAIN + 1));

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_withdraw_wrong_root_fails() {
        let mut tree = MerkleAccumulator::new(4).unwrap();
        let (n, s, index) = deposit_note(&mut tree, 3, 4);

        let mut circuit = build(&tree, n, s, index);
        circuit.root = Some(tree.empty_root());

        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();

        assert!(!cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_withdraw_path_height_mismatch() {
        let mut circuit = WithdrawCircuit::empty(4, CHAIN);
        circuit.path = Some(MembershipPath::empty(3));

        let cs = ConstraintSystem::<Fr>::new_ref();
        assert!(circuit.generate_constraints(cs).is_err());
    }
}
