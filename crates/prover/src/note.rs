//! Deposit notes and their transportable token form.
//!
//! A note is the only thing a depositor must keep. Its token looks like
//!
//! ```text
//! zkmixer-v1-eth-0.1-1-<base64(nullifierHex:secretHex)>
//! ```
//!
//! Both values are 31 random bytes, so they are always below the BN254 scalar
//! modulus and map to a field element without reduction.

use std::fmt;

use ark_bn254::Fr;
use ark_ff::PrimeField;
use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use mixer_circuits::{note_commitment, nullifier_hash, Amount, ChainId};

/// Bytes per note value.
pub const NOTE_FIELD_BYTES: usize = 31;

/// Hex digits per note value.
pub const NOTE_FIELD_HEX_LEN: usize = NOTE_FIELD_BYTES * 2;

const TOKEN_PREFIX: &str = "zkmixer";
const TOKEN_VERSION: &str = "v1";
const TOKEN_SEGMENTS: usize = 6;

/// Why a token could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed note header: {0}")]
    MalformedPrefix(String),
    #[error("Note must have {expected} '-' separated segments, found {found}")]
    WrongSegmentCount { expected: usize, found: usize },
    #[error("Note payload is not valid base64: {0}")]
    Base64Error(String),
    #[error("Malformed note payload: {0}")]
    MalformedPayload(String),
    #[error("Note field must be {expected} hex digits, found {found}")]
    WrongFieldWidth { expected: usize, found: usize },
}

/// A deposit note.
#[derive(Clone, PartialEq, Eq)]
pub struct Note {
    nullifier_bytes: [u8; NOTE_FIELD_BYTES],
    secret_bytes: [u8; NOTE_FIELD_BYTES],
    nullifier: Fr,
    secret: Fr,
    denomination: Amount,
    chain_id: ChainId,
}

impl Note {
    /// Build a note from its raw big-endian values.
    pub fn from_bytes(
        nullifier_bytes: [u8; NOTE_FIELD_BYTES],
        secret_bytes: [u8; NOTE_FIELD_BYTES],
        denomination: Amount,
        chain_id: ChainId,
    ) -> Self {
        Self {
            nullifier: Fr::from_be_bytes_mod_order(&nullifier_bytes),
            secret: Fr::from_be_bytes_mod_order(&secret_bytes),
            nullifier_bytes,
            secret_bytes,
            denomination,
            chain_id,
        }
    }

    pub fn nullifier(&self) -> Fr {
        self.nullifier
    }

    pub fn secret(&self) -> Fr {
        self.secret
    }

    pub fn denomination(&self) -> Amount {
        self.denomination
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    /// The tree leaf this note deposits.
    pub fn commitment(&self) -> Fr {
        note_commitment(self.nullifier, self.secret)
    }

    /// The value published when this note is withdrawn.
    pub fn nullifier_hash(&self) -> Fr {
        nullifier_hash(self.nullifier, self.chain_id)
    }
}

// Never print the secret values.
impl fmt::Debug for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Note")
            .field("commitment", &self.commitment().to_string())
            .field("denomination", &self.denomination)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// Encodes and parses note tokens for one pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteCodec {
    pub asset: String,
    /// Human readable denomination, e.g. `0.1`
    pub denomination_label: String,
    /// Denomination in base units
    pub denomination: Amount,
}

impl Default for NoteCodec {
    fn default() -> Self {
        Self {
            asset: "eth".to_string(),
            denomination_label: "0.1".to_string(),
            denomination: 100_000_000_000_000_000,
        }
    }
}

impl NoteCodec {
    pub fn new(asset: &str, denomination_label: &str, denomination: Amount) -> Self {
        Self {
            asset: asset.to_string(),
            denomination_label: denomination_label.to_string(),
            denomination,
        }
    }

    /// Draw a fresh note from the OS random source.
    pub fn generate(&self, chain_id: ChainId) -> (Note, String) {
        self.generate_with_rng(&mut OsRng, chain_id)
    }

    /// Draw a fresh note from `rng`.
    pub fn generate_with_rng<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        chain_id: ChainId,
    ) -> (Note, String) {
        let mut nullifier = [0u8; NOTE_FIELD_BYTES];
        let mut secret = [0u8; NOTE_FIELD_BYTES];
        rng.fill_bytes(&mut nullifier);
        rng.fill_bytes(&mut secret);

        let note = Note::from_bytes(nullifier, secret, self.denomination, chain_id);
        let token = self.encode(&note);
        (note, token)
    }

    /// Serialize a note to its token.
    pub fn encode(&self, note: &Note) -> String {
        let payload = format!(
            "{}:{}",
            hex::encode(note.nullifier_bytes),
            hex::encode(note.secret_bytes)
        );

        format!(
            "{}-{}-{}-{}-{}-{}",
            TOKEN_PREFIX,
            TOKEN_VERSION,
            self.asset,
            self.denomination_label,
            note.chain_id,
            general_purpose::STANDARD.encode(payload)
        )
    }

    /// Parse a token produced by [`NoteCodec::encode`].
    pub fn parse(&self, token: &str) -> Result<Note, DecodeError> {
        let segments: Vec<&str> = token.trim().split('-').collect();
        if segments.len() != TOKEN_SEGMENTS {
            return Err(DecodeError::WrongSegmentCount {
                expected: TOKEN_SEGMENTS,
                found: segments.len(),
            });
        }

        let expected = [
            (TOKEN_PREFIX, "prefix"),
            (TOKEN_VERSION, "version"),
            (self.asset.as_str(), "asset"),
            (self.denomination_label.as_str(), "denomination"),
        ];
        for (segment, (literal, name)) in segments.iter().zip(expected) {
            if *segment != literal {
                return Err(DecodeError::MalformedPrefix(format!(
                    "expected {} `{}`, found `{}`",
                    name, literal, segment
                )));
            }
        }

        let chain_id: ChainId = segments[4].parse().map_err(|_| {
            DecodeError::MalformedPrefix(format!("invalid chain id `{}`", segments[4]))
        })?;

        let decoded = general_purpose::STANDARD
            .decode(segments[5])
            .map_err(|e| DecodeError::Base64Error(e.to_string()))?;
        let payload = String::from_utf8(decoded)
            .map_err(|_| DecodeError::MalformedPayload("payload is not UTF-8".to_string()))?;

        let (nullifier_hex, secret_hex) = payload
            .split_once(':')
            .ok_or_else(|| DecodeError::MalformedPayload("missing ':' separator".to_string()))?;
        if secret_hex.contains(':') {
            return Err(DecodeError::MalformedPayload(
                "more than one ':' separator".to_string(),
            ));
        }

        let nullifier = decode_field(nullifier_hex)?;
        let secret = decode_field(secret_hex)?;

        Ok(Note::from_bytes(nullifier, secret, self.denomination, chain_id))
    }
}

fn decode_field(hex_str: &str) -> Result<[u8; NOTE_FIELD_BYTES], DecodeError> {
    if hex_str.len() != NOTE_FIELD_HEX_LEN {
        return Err(DecodeError::WrongFieldWidth {
            expected: NOTE_FIELD_HEX_LEN,
            found: hex_str.len(),
        });
    }

    let mut bytes = [0u8; NOTE_FIELD_BYTES];
    hex::decode_to_slice(hex_str, &mut bytes)
        .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    Ok(bytes)
}
