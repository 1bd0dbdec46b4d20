//! Trusted setup utilities for generating proving and verifying keys.

use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mixer_circuits::{ChainId, WithdrawCircuit};

const PK_FILE: &str = "withdraw.pk";
const VK_FILE: &str = "withdraw.vk";
const PARAMS_FILE: &str = "params.json";

/// Errors that can occur during setup
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Circuit setup failed: {0}")]
    CircuitSetup(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error("Deserialization failed: {0}")]
    Deserialization(String),
    #[error("Keys were generated for {found:?}, expected {expected:?}")]
    ParamsMismatch {
        expected: KeyParams,
        found: KeyParams,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The circuit shape a key pair was generated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParams {
    pub tree_height: u32,
    pub chain_id: ChainId,
}

/// Keys for a single circuit
#[derive(Clone)]
pub struct CircuitKeyPair {
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
}

impl CircuitKeyPair {
    /// Serialize proving key to bytes
    pub fn serialize_pk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.proving_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Serialize verifying key to bytes
    pub fn serialize_vk(&self) -> Result<Vec<u8>, SetupError> {
        let mut bytes = Vec::new();
        self.verifying_key
            .serialize_compressed(&mut bytes)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        Ok(bytes)
    }

    /// Deserialize proving key from bytes
    pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, SetupError> {
        ProvingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }

    /// Deserialize verifying key from bytes
    pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, SetupError> {
        VerifyingKey::deserialize_compressed(bytes)
            .map_err(|e| SetupError::Deserialization(e.to_string()))
    }
}

/// Withdrawal keys plus the parameters they are valid for.
#[derive(Clone)]
pub struct CircuitKeys {
    pub params: KeyParams,
    pub withdraw: CircuitKeyPair,
}

impl CircuitKeys {
    /// Save keys to a directory
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), SetupError> {
        std::fs::create_dir_all(dir)?;

        std::fs::write(dir.join(PK_FILE), self.withdraw.serialize_pk()?)?;
        std::fs::write(dir.join(VK_FILE), self.withdraw.serialize_vk()?)?;

        let params = serde_json::to_string_pretty(&self.params)
            .map_err(|e| SetupError::Serialization(e.to_string()))?;
        std::fs::write(dir.join(PARAMS_FILE), params)?;

        Ok(())
    }

    /// Load keys from a directory
    pub fn load_from_directory(dir: &Path) -> Result<Self, SetupError> {
        let params: KeyParams = serde_json::from_slice(&std::fs::read(dir.join(PARAMS_FILE))?)
            .map_err(|e| SetupError::Deserialization(e.to_string()))?;

        let withdraw = CircuitKeyPair {
            proving_key: CircuitKeyPair::deserialize_pk(&std::fs::read(dir.join(PK_FILE))?)?,
            verifying_key: CircuitKeyPair::deserialize_vk(&std::fs::read(dir.join(VK_FILE))?)?,
        };

        Ok(Self { params, withdraw })
    }

    /// Whether `dir` holds a complete key set.
    pub fn exists_in(dir: &Path) -> bool {
        [PK_FILE, VK_FILE, PARAMS_FILE]
            .iter()
            .all(|file| dir.join(file).is_file())
    }

    /// Load keys from `dir`, or run setup and save them there.
    ///
    /// Existing keys built for other parameters are an error, never silently
    /// replaced.
    pub fn load_or_setup(dir: &Path, params: KeyParams) -> Result<Self, SetupError> {
        if Self::exists_in(dir) {
            let keys = Self::load_from_directory(dir)?;
            if keys.params != params {
                return Err(SetupError::ParamsMismatch {
                    expected: params,
                    found: keys.params,
                });
            }
            return Ok(keys);
        }

        let keys = run_setup(params)?;
        keys.save_to_directory(dir)?;
        Ok(keys)
    }
}

/// Run trusted setup with fresh OS entropy.
pub fn run_setup(params: KeyParams) -> Result<CircuitKeys, SetupError> {
    let mut rng = StdRng::from_entropy();

    println!(
        "Setting up WithdrawCircuit (height {}, chain {})...",
        params.tree_height, params.chain_id
    );
    let withdraw = setup_withdraw(&mut rng, params.tree_height, params.chain_id)?;

    Ok(CircuitKeys { params, withdraw })
}

/// Setup WithdrawCircuit
pub fn setup_withdraw<R: RngCore + CryptoRng>(
    rng: &mut R,
    tree_height: u32,
    chain_id: ChainId,
) -> Result<CircuitKeyPair, SetupError> {
    let circuit = WithdrawCircuit::empty(tree_height, chain_id);
    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit, rng)
        .map_err(|e| SetupError::CircuitSetup(e.to_string()))?;

    Ok(CircuitKeyPair {
        proving_key: pk,
        verifying_key: vk,
    })
}
