//! Standalone end-to-end check: note, deposit, proof, verification.
//!
//! Usage:
//!   cargo run --release --bin test-prove -- [keys_dir]

use std::path::PathBuf;
use std::time::Instant;

use ark_bn254::Fr;
use mixer_circuits::MerkleAccumulator;
use mixer_prover::prove::{prove_withdrawal, WithdrawTarget};
use mixer_prover::setup::CircuitKeys;
use mixer_prover::verify::{Groth16Verifier, ProofVerifier};
use mixer_prover::NoteCodec;

fn main() {
    let keys_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "keys".to_string()));

    println!("Loading keys from {:?}...", keys_dir);
    let start = Instant::now();
    let keys = CircuitKeys::load_from_directory(&keys_dir).expect("Failed to load keys");
    println!(
        "Keys loaded in {:?} (height {}, chain {})",
        start.elapsed(),
        keys.params.tree_height,
        keys.params.chain_id
    );

    let codec = NoteCodec::default();
    let (note, token) = codec.generate(keys.params.chain_id);
    println!("\nGenerated note: {}", token);

    let parsed = codec.parse(&token).expect("Failed to parse generated note");
    assert_eq!(parsed, note, "note did not round-trip");

    let mut tree = MerkleAccumulator::new(keys.params.tree_height).expect("Invalid tree height");
    for i in 0..3u64 {
        tree.insert(Fr::from(i + 1)).expect("Insert failed");
    }
    let (index, root) = tree.insert(note.commitment()).expect("Insert failed");
    println!("Deposited at index {}", index);

    let path = tree.membership_path(index).expect("Path failed");
    let target = WithdrawTarget {
        recipient: Fr::from(0xc0ffeeu64),
        relayer: Fr::from(0xbeefu64),
        fee: note.denomination() / 100,
        refund: 0,
    };

    println!("\nStarting proof generation...");
    let start = Instant::now();
    let result = prove_withdrawal(&keys, &note, path, target);
    println!("Proof generation completed in {:?}", start.elapsed());

    let result = match result {
        Ok(proof) => proof,
        Err(e) => {
            eprintln!("Withdraw proof generation failed: {}", e);
            std::process::exit(1);
        }
    };
    assert_eq!(result.signals.root, root);

    let verifier =
        Groth16Verifier::new(&keys.withdraw.verifying_key).expect("Failed to process VK");
    let bytes = result.serialize_proof().expect("Failed to serialize proof");

    match verifier.verify(&result.signals, &bytes) {
        Ok(true) => println!("Withdraw proof verified ({} bytes)", bytes.len()),
        Ok(false) => {
            eprintln!("Withdraw proof did not verify");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Verification error: {}", e);
            std::process::exit(1);
        }
    }

    let mut redirected = result.signals;
    redirected.recipient = Fr::from(0xbadu64);
    if verifier.verify(&redirected, &bytes).unwrap_or(false) {
        eprintln!("Proof verified for a different recipient");
        std::process::exit(1);
    }

    println!("\nEnd-to-end withdrawal check passed!");
}
