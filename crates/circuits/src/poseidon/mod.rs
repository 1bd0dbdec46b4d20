//! Poseidon hash function for BN254.
//!
//! Native and in-circuit versions share one parameter set, so a value hashed
//! off-circuit always matches the value the withdrawal circuit recomputes.

mod config;
mod gadgets;
mod native;

#[cfg(test)]
mod tests;

pub use config::{poseidon_config, ALPHA, CAPACITY, FULL_ROUNDS, PARTIAL_ROUNDS, RATE};
pub use gadgets::{poseidon_hash_many_var, poseidon_hash_two_var};
pub use native::{poseidon_hash_many, poseidon_hash_two};
