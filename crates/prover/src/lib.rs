//! Proof generation library for the mixer pool.
//!
//! This crate provides utilities for:
//! - Generating, encoding and parsing deposit notes
//! - Trusted setup (generating proving and verifying keys)
//! - Withdrawal proof generation
//! - Groth16 verification behind the [`ProofVerifier`] trait

pub mod codec;
pub mod note;
pub mod prove;
pub mod setup;
pub mod verify;

pub use codec::{fr_from_hex, fr_to_hex, CodecError};
pub use note::{DecodeError, Note, NoteCodec};
pub use prove::{prove_withdrawal, ProofWithSignals, ProveError, WithdrawTarget};
pub use setup::{run_setup, setup_withdraw, CircuitKeyPair, CircuitKeys, KeyParams, SetupError};
pub use verify::{verify_withdrawal, Groth16Verifier, ProofVerifier, VerifyError};

use ark_bn254::Fr;

/// Common field type for all operations
pub type ConstraintF = Fr;
