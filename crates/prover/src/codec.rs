//! Field elements as `0x`-prefixed big-endian hex.

use ark_bn254::Fr;
use ark_ff::{BigInt, BigInteger, PrimeField};
use thiserror::Error;

/// Hex digits in a full-width field element.
pub const FIELD_HEX_LEN: usize = 64;

/// Errors decoding a field element from hex.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Field element must start with 0x")]
    MissingPrefix,
    #[error("Field element has {0} hex digits, at most 64 allowed")]
    TooLong(usize),
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
    #[error("Value is not below the field modulus")]
    NonCanonical,
}

/// Encode as `0x` followed by 64 lowercase hex digits.
pub fn fr_to_hex(value: &Fr) -> String {
    format!("0x{}", hex::encode(value.into_bigint().to_bytes_be()))
}

/// Decode `0x`-prefixed big-endian hex.
///
/// Shorter inputs are left-padded with zeros. Values at or above the modulus
/// are rejected instead of being reduced.
pub fn fr_from_hex(s: &str) -> Result<Fr, CodecError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(CodecError::MissingPrefix)?;
    if digits.len() > FIELD_HEX_LEN {
        return Err(CodecError::TooLong(digits.len()));
    }

    let padded = format!("{:0>width$}", digits, width = FIELD_HEX_LEN);
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(&padded, &mut bytes).map_err(|e| CodecError::InvalidHex(e.to_string()))?;

    let mut limbs = [0u64; 4];
    for (i, chunk) in bytes.rchunks(8).enumerate() {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        limbs[i] = u64::from_be_bytes(word);
    }

    Fr::from_bigint(BigInt::new(limbs)).ok_or(CodecError::NonCanonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Field;

    #[test]
    fn test_small_values() {
        assert_eq!(fr_to_hex(&Fr::from(0u64)), format!("0x{}", "0".repeat(64)));
        assert_eq!(
            fr_to_hex(&Fr::from(0x1234u64)),
            format!("0x{}1234", "0".repeat(60))
        );
        assert_eq!(fr_from_hex("0x1234").unwrap(), Fr::from(0x1234u64));
        assert_eq!(fr_from_hex("0x").unwrap(), Fr::from(0u64));
    }

    #[test]
    fn test_large_value() {
        let value = Fr::from(u64::MAX).square() + Fr::from(17u64);
        let encoded = fr_to_hex(&value);
        assert_eq!(encoded.len(), 66);
        assert_eq!(fr_from_hex(&encoded).unwrap(), value);
    }

    #[test]
    fn test_rejects_modulus() {
        let modulus = format!("0x{}", hex::encode(Fr::MODULUS.to_bytes_be()));
        assert_eq!(fr_from_hex(&modulus), Err(CodecError::NonCanonical));

        let max = format!("0x{}", "f".repeat(64));
        assert_eq!(fr_from_hex(&max), Err(CodecError::NonCanonical));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(fr_from_hex("1234"), Err(CodecError::MissingPrefix));
        assert_eq!(
            fr_from_hex(&format!("0x{}", "0".repeat(65))),
            Err(CodecError::TooLong(65))
        );
        assert!(matches!(fr_from_hex("0xzz"), Err(CodecError::InvalidHex(_))));
    }
}
