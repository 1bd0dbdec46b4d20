//! Cross-checks between native and in-circuit Poseidon, plus pinned vectors.

use super::*;
use ark_bn254::Fr;
use ark_ff::MontFp;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::ConstraintSystem;

#[test]
fn test_pinned_vectors() {
    let zero_zero: Fr =
        MontFp!("15858722437969634021277434863330806311022733977152536287645663373535522924562");
    let one_two: Fr =
        MontFp!("13628096841998704624838090622412275379873655132427263500056616005452201631747");

    assert_eq!(poseidon_hash_two(Fr::from(0u64), Fr::from(0u64)), zero_zero);
    assert_eq!(poseidon_hash_two(Fr::from(1u64), Fr::from(2u64)), one_two);
}

#[test]
fn test_hash_two_consistency() {
    let cs = ConstraintSystem::<Fr>::new_ref();

    let a = Fr::from(123u64);
    let b = Fr::from(456u64);
    let native_result = poseidon_hash_two(a, b);

    let a_var = FpVar::new_witness(cs.clone(), || Ok(a)).unwrap();
    let b_var = FpVar::new_witness(cs.clone(), || Ok(b)).unwrap();
    let gadget_result = poseidon_hash_two_var(cs.clone(), &a_var, &b_var).unwrap();
    let expected_var = FpVar::new_input(cs.clone(), || Ok(native_result)).unwrap();
    gadget_result.enforce_equal(&expected_var).unwrap();

    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_hash_many_consistency() {
    let cs = ConstraintSystem::<Fr>::new_ref();

    let inputs = vec![Fr::from(1u64), Fr::from(2u64), Fr::from(3u64), Fr::from(4u64)];
    let native_result = poseidon_hash_many(&inputs);

    let input_vars: Vec<FpVar<Fr>> = inputs
        .iter()
        .map(|x| FpVar::new_witness(cs.clone(), || Ok(*x)).unwrap())
        .collect();
    let gadget_result = poseidon_hash_many_var(cs.clone(), &input_vars).unwrap();
    let expected_var = FpVar::new_input(cs.clone(), || Ok(native_result)).unwrap();
    gadget_result.enforce_equal(&expected_var).unwrap();

    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_constant_input_matches_native() {
    // The withdrawal circuit hashes the chain id as a constant, not a witness.
    let cs = ConstraintSystem::<Fr>::new_ref();

    let nullifier = Fr::from(77u64);
    let chain_id = Fr::from(11155111u64);
    let native_result = poseidon_hash_two(nullifier, chain_id);

    let nullifier_var = FpVar::new_witness(cs.clone(), || Ok(nullifier)).unwrap();
    let chain_var = FpVar::Constant(chain_id);
    let gadget_result = poseidon_hash_two_var(cs.clone(), &nullifier_var, &chain_var).unwrap();
    let expected_var = FpVar::new_input(cs.clone(), || Ok(native_result)).unwrap();
    gadget_result.enforce_equal(&expected_var).unwrap();

    assert!(cs.is_satisfied().unwrap());
}

#[test]
fn test_wrong_expectation_unsatisfied() {
    let cs = ConstraintSystem::<Fr>::new_ref();

    let a_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(10u64))).unwrap();
    let b_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(20u64))).unwrap();
    let gadget_result = poseidon_hash_two_var(cs.clone(), &a_var, &b_var).unwrap();

    // Swapped order natively must not satisfy the positional gadget.
    let swapped = poseidon_hash_two(Fr::from(20u64), Fr::from(10u64));
    let expected_var = FpVar::new_input(cs.clone(), || Ok(swapped)).unwrap();
    gadget_result.enforce_equal(&expected_var).unwrap();

    assert!(!cs.is_satisfied().unwrap());
}
