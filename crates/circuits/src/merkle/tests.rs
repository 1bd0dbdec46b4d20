//! Integration tests for the Merkle module.

use super::*;
use crate::hasher::{FieldHasher, PoseidonHasher};
use ark_bn254::Fr;
use ark_ff::MontFp;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::ConstraintSystem;

fn leaves(n: u64) -> Vec<Fr> {
    (1..=n).map(|i| Fr::from(i * 1000 + 7)).collect()
}

#[test]
fn test_incremental_root_matches_reference() {
    let mut tree = MerkleAccumulator::new(5).unwrap();
    let inserted = leaves(13);

    for (i, leaf) in inserted.iter().enumerate() {
        let (index, root) = tree.insert(*leaf).unwrap();
        assert_eq!(index, i as u64);

        let reference =
            MerkleAccumulator::compute_root(&PoseidonHasher, 5, &inserted[..=i]).unwrap();
        assert_eq!(root, reference, "root diverged after leaf {}", i);
    }
}

#[test]
fn test_every_path_reproduces_root() {
    let tree = MerkleAccumulator::from_leaves(4, PoseidonHasher, &leaves(11)).unwrap();
    let root = tree.root();

    for index in 0..tree.len() {
        let path = tree.membership_path(index).unwrap();
        let leaf = tree.leaf(index).unwrap();
        assert!(path.verify(leaf, root, tree.hasher()));
        assert_eq!(path.leaf_index(), index);
    }
}

#[test]
fn test_independent_instances_agree() {
    let mut a = MerkleAccumulator::new(8).unwrap();
    let mut b = MerkleAccumulator::new(8).unwrap();

    for leaf in leaves(20) {
        a.insert(leaf).unwrap();
    }
    let c = MerkleAccumulator::from_leaves(8, PoseidonHasher, &leaves(20)).unwrap();
    for leaf in leaves(20) {
        b.insert(leaf).unwrap();
    }

    assert_eq!(a.root(), b.root());
    assert_eq!(a.root(), c.root());
}

#[test]
fn test_insertion_order_matters() {
    let mut forward = MerkleAccumulator::new(3).unwrap();
    let mut reversed = MerkleAccumulator::new(3).unwrap();

    let items = leaves(4);
    for leaf in &items {
        forward.insert(*leaf).unwrap();
    }
    for leaf in items.iter().rev() {
        reversed.insert(*leaf).unwrap();
    }

    assert_ne!(forward.root(), reversed.root());
}

#[test]
fn test_positional_not_sorted_pairs() {
    // A larger value on the left must still hash as H(left, right).
    let hasher = PoseidonHasher;
    let big = Fr::from(999u64);
    let small = Fr::from(1u64);

    let mut tree = MerkleAccumulator::new(1).unwrap();
    tree.insert(big).unwrap();
    tree.insert(small).unwrap();

    assert_eq!(tree.root(), hasher.hash_two(big, small));
    assert_ne!(tree.root(), hasher.hash_two(small, big));
}

#[test]
fn test_default_height_empty_root_vector() {
    let tree = MerkleAccumulator::new(DEFAULT_HEIGHT).unwrap();
    let expected: Fr = MontFp!(
        "15557437646823134688198018919152291618088300916357219802827704743262136303104"
    );
    assert_eq!(tree.root(), expected);
    assert_eq!(tree.empty_root(), expected);
}

#[test]
fn test_stale_path_still_proves_old_root() {
    let mut tree = MerkleAccumulator::new(4).unwrap();
    tree.insert(Fr::from(5u64)).unwrap();
    tree.insert(Fr::from(6u64)).unwrap();

    let old_root = tree.root();
    let old_path = tree.membership_path(0).unwrap();

    tree.insert(Fr::from(7u64)).unwrap();
    tree.insert(Fr::from(8u64)).unwrap();

    assert!(old_path.verify(Fr::from(5u64), old_root, tree.hasher()));
    assert!(!old_path.verify(Fr::from(5u64), tree.root(), tree.hasher()));

    let fresh = tree.membership_path(0).unwrap();
    assert!(fresh.verify(Fr::from(5u64), tree.root(), tree.hasher()));
}

#[test]
fn test_circuit_membership_after_many_inserts() {
    let tree = MerkleAccumulator::from_leaves(5, PoseidonHasher, &leaves(9)).unwrap();
    let root = tree.root();
    let index = 6;
    let path = tree.membership_path(index).unwrap();
    let leaf = tree.leaf(index).unwrap();

    let cs = ConstraintSystem::<Fr>::new_ref();
    let root_var = FpVar::new_input(cs.clone(), || Ok(root)).unwrap();
    let leaf_var = FpVar::new_witness(cs.clone(), || Ok(leaf)).unwrap();
    let path_var = MembershipPathVar::new_witness(cs.clone(), &path).unwrap();

    verify_membership(cs.clone(), &root_var, &leaf_var, &path_var).unwrap();

    assert!(cs.is_satisfied().unwrap());
    println!("Membership constraints (height 5): {}", cs.num_constraints());
}

#[test]
fn test_circuit_rejects_root_from_other_tree() {
    let tree = MerkleAccumulator::from_leaves(5, PoseidonHasher, &leaves(9)).unwrap();
    let other = MerkleAccumulator::from_leaves(5, PoseidonHasher, &leaves(10)).unwrap();
    let path = tree.membership_path(2).unwrap();
    let leaf = tree.leaf(2).unwrap();

    let cs = ConstraintSystem::<Fr>::new_ref();
    let root_var = FpVar::new_input(cs.clone(), || Ok(other.root())).unwrap();
    let leaf_var = FpVar::new_witness(cs.clone(), || Ok(leaf)).unwrap();
    let path_var = MembershipPathVar::new_witness(cs.clone(), &path).unwrap();

    verify_membership(cs.clone(), &root_var, &leaf_var, &path_var).unwrap();

    assert!(!cs.is_satisfied().unwrap());
}
