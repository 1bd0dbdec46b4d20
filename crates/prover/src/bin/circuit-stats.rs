//! Circuit statistics utility - reports constraint counts and proof timing
//!
//! Usage:
//!   cargo run --release --bin circuit-stats           # Just constraint counts
//!   cargo run --release --bin circuit-stats -- --time # Include proof timing at height 20

use std::time::Instant;

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};

use mixer_circuits::{MerkleAccumulator, WithdrawCircuit, DEFAULT_HEIGHT};
use mixer_prover::prove::{prove_withdrawal, WithdrawTarget};
use mixer_prover::setup::{run_setup, KeyParams};
use mixer_prover::NoteCodec;

fn count_constraints<C: ConstraintSynthesizer<Fr>>(circuit: C, name: &str) -> usize {
    let cs = ConstraintSystem::<Fr>::new_ref();
    circuit.generate_constraints(cs.clone()).unwrap();
    let count = cs.num_constraints();
    // Note: empty circuits use dummy values so they may not satisfy all constraints
    // The constraint count is still accurate
    println!("{:25} {:>8} constraints", name, count);
    count
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let include_timing = args.iter().any(|a| a == "--time");

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                 MIXER CIRCUIT STATS                      ║");
    println!("╚══════════════════════════════════════════════════════════╝\n");

    println!("Default tree height: {}", DEFAULT_HEIGHT);
    println!("Max deposits:        {}\n", 1u64 << DEFAULT_HEIGHT);

    println!("─────────────────────────────────────────────────────────────");
    println!("CIRCUIT CONSTRAINTS:");
    println!("─────────────────────────────────────────────────────────────\n");

    let mut previous = None;
    for height in [4u32, 8, 16, DEFAULT_HEIGHT] {
        let count = count_constraints(
            WithdrawCircuit::empty(height, 1),
            &format!("Withdraw (height {})", height),
        );
        if let Some((prev_height, prev_count)) = previous {
            let per_level = (count - prev_count) / (height - prev_height) as usize;
            println!("{:25} {:>8} per level", "", per_level);
        }
        previous = Some((height, count));
    }

    if include_timing {
        run_timing_benchmarks(DEFAULT_HEIGHT);
    } else {
        println!("\n(Run with --time to include proof generation timing)");
    }
}

fn run_timing_benchmarks(height: u32) {
    println!("\n─────────────────────────────────────────────────────────────");
    println!("PROOF TIMING:");
    println!("─────────────────────────────────────────────────────────────\n");

    let start = Instant::now();
    let keys = match run_setup(KeyParams {
        tree_height: height,
        chain_id: 1,
    }) {
        Ok(k) => k,
        Err(e) => {
            println!("Setup failed: {}", e);
            return;
        }
    };
    println!("Setup completed in {:?}\n", start.elapsed());

    let codec = NoteCodec::default();
    let (note, _) = codec.generate(1);
    let mut tree = match MerkleAccumulator::new(height) {
        Ok(t) => t,
        Err(e) => {
            println!("Tree creation failed: {}", e);
            return;
        }
    };
    let index = match tree.insert(note.commitment()) {
        Ok((index, _)) => index,
        Err(e) => {
            println!("Insert failed: {}", e);
            return;
        }
    };

    const RUNS: usize = 3;
    let target = WithdrawTarget {
        recipient: Fr::from(1u64),
        relayer: Fr::from(0u64),
        fee: 0,
        refund: 0,
    };

    let mut times = Vec::new();
    for _ in 0..RUNS {
        let path = match tree.membership_path(index) {
            Ok(p) => p,
            Err(e) => {
                println!("Path failed: {}", e);
                return;
            }
        };
        let start = Instant::now();
        if let Err(e) = prove_withdrawal(&keys, &note, path, target) {
            println!("Proof generation failed: {}", e);
            return;
        }
        times.push(start.elapsed().as_micros());
    }

    let avg_us = times.iter().sum::<u128>() / RUNS as u128;
    println!("Withdraw (height {})    avg {:>6}ms over {} runs", height, avg_us / 1000, RUNS);
}
