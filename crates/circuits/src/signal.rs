//! Public signals of the withdrawal proof.
//!
//! The verifier receives exactly these six field elements, in this order:
//!
//! 1. `root` - accumulator root the membership path leads to
//! 2. `nullifier_hash` - `H(nullifier, chain_id)`
//! 3. `recipient` - address receiving `denomination - fee`
//! 4. `relayer` - address receiving `fee`
//! 5. `fee`
//! 6. `refund`
//!
//! A proof verifies only against the tuple it was built for, so a third party
//! cannot replay it with a different recipient, relayer or fee.

use ark_bn254::Fr;

/// Token amount in base units.
pub type Amount = u128;

/// Number of public inputs of the withdrawal circuit.
pub const NUM_PUBLIC_SIGNALS: usize = 6;

/// The public-signal tuple bound into a withdrawal proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicSignals {
    pub root: Fr,
    pub nullifier_hash: Fr,
    /// Recipient address as a field element
    pub recipient: Fr,
    /// Relayer address as a field element (zero when self-relayed)
    pub relayer: Fr,
    pub fee: Amount,
    pub refund: Amount,
}

impl PublicSignals {
    /// Field elements in the circuit's public-input order.
    pub fn to_field_elements(&self) -> [Fr; NUM_PUBLIC_SIGNALS] {
        [
            self.root,
            self.nullifier_hash,
            self.recipient,
            self.relayer,
            Fr::from(self.fee),
            Fr::from(self.refund),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order() {
        let signals = PublicSignals {
            root: Fr::from(1u64),
            nullifier_hash: Fr::from(2u64),
            recipient: Fr::from(3u64),
            relayer: Fr::from(4u64),
            fee: 5,
            refund: 6,
        };

        let fields = signals.to_field_elements();
        let expected: Vec<Fr> = (1..=6u64).map(Fr::from).collect();
        assert_eq!(fields.to_vec(), expected);
    }

    #[test]
    fn test_large_amounts() {
        let signals = PublicSignals {
            root: Fr::from(0u64),
            nullifier_hash: Fr::from(0u64),
            recipient: Fr::from(0u64),
            relayer: Fr::from(0u64),
            fee: u128::MAX,
            refund: 0,
        };
        assert_eq!(signals.to_field_elements()[4], Fr::from(u128::MAX));
    }
}
