//! Export the withdrawal verifying key.
//!
//! Loads keys from the keys directory (or runs setup if there are none) and
//! prints the verifying key as hex, writing a JSON copy next to the keys.
//!
//! Usage:
//!   cargo run --release --bin export-vks -- [keys_dir] [tree_height] [chain_id]

use std::path::PathBuf;

use mixer_circuits::DEFAULT_HEIGHT;
use mixer_prover::setup::{CircuitKeys, KeyParams};

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let keys_dir = PathBuf::from(args.first().map(String::as_str).unwrap_or("keys"));
    let tree_height = args
        .get(1)
        .map(|h| h.parse().expect("tree_height must be an integer"))
        .unwrap_or(DEFAULT_HEIGHT);
    let chain_id = args
        .get(2)
        .map(|c| c.parse().expect("chain_id must be an integer"))
        .unwrap_or(1);
    let params = KeyParams {
        tree_height,
        chain_id,
    };

    println!("Loading or generating circuit keys...");

    let keys = if CircuitKeys::exists_in(&keys_dir) {
        println!("Loading existing keys from {:?}", keys_dir);
        CircuitKeys::load_from_directory(&keys_dir).expect("Failed to load keys")
    } else {
        println!("Running trusted setup (this may take a while)...");
        let keys = CircuitKeys::load_or_setup(&keys_dir, params).expect("Failed to setup circuit");
        println!("Keys saved to {:?}", keys_dir);
        keys
    };

    if keys.params != params {
        println!(
            "Note: keys on disk are for height {} / chain {}",
            keys.params.tree_height, keys.params.chain_id
        );
    }

    let withdraw_vk = keys.withdraw.serialize_vk().expect("Failed to serialize VK");

    println!("\n=== Withdraw Verifying Key ===\n");
    println!("Tree height: {}", keys.params.tree_height);
    println!("Chain id:    {}", keys.params.chain_id);
    println!("VK ({} bytes):", withdraw_vk.len());
    println!("0x{}\n", hex::encode(&withdraw_vk));

    // Also export as JSON for scripting
    let json = serde_json::json!({
        "tree_height": keys.params.tree_height,
        "chain_id": keys.params.chain_id,
        "public_inputs": ["root", "nullifier_hash", "recipient", "relayer", "fee", "refund"],
        "withdraw_vk": format!("0x{}", hex::encode(&withdraw_vk)),
    });

    let json_path = keys_dir.join("verifying_key.json");
    std::fs::write(
        &json_path,
        serde_json::to_string_pretty(&json).expect("Failed to encode JSON"),
    )
    .expect("Failed to write JSON");
    println!("JSON exported to {:?}", json_path);
}
