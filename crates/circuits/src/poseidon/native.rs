//! Native Poseidon hash functions (outside circuits).

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;

use super::config::poseidon_config;

/// Hash two field elements.
pub fn poseidon_hash_two(a: Fr, b: Fr) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    sponge.absorb(&a);
    sponge.absorb(&b);
    sponge.squeeze_field_elements(1)[0]
}

/// Hash any number of field elements.
pub fn poseidon_hash_many(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(poseidon_config());
    for input in inputs {
        sponge.absorb(input);
    }
    sponge.squeeze_field_elements(1)[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        let a = Fr::from(42u64);
        let b = Fr::from(123u64);

        let h1 = poseidon_hash_two(a, b);
        let h2 = poseidon_hash_two(a, b);
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_hash_different_inputs() {
        let h1 = poseidon_hash_two(Fr::from(1u64), Fr::from(2u64));
        let h2 = poseidon_hash_two(Fr::from(1u64), Fr::from(3u64));
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_is_positional() {
        let h1 = poseidon_hash_two(Fr::from(1u64), Fr::from(2u64));
        let h2 = poseidon_hash_two(Fr::from(2u64), Fr::from(1u64));
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_two_matches_many() {
        let a = Fr::from(7u64);
        let b = Fr::from(9u64);
        assert_eq!(poseidon_hash_two(a, b), poseidon_hash_many(&[a, b]));
    }

    #[test]
    fn test_arity_matters() {
        let two = poseidon_hash_many(&[Fr::from(1u64), Fr::from(2u64)]);
        let three = poseidon_hash_many(&[Fr::from(1u64), Fr::from(2u64), Fr::from(0u64)]);
        assert_ne!(two, three);
    }
}
