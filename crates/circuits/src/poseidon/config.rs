//! Poseidon configuration for BN254.
//!
//! The parameter set is built exactly once per process and shared by the
//! native hasher and the R1CS gadgets. Any other implementation that feeds
//! roots or commitments into this pool (a JS prover, a contract, a relayer)
//! must use these exact constants.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonConfig;
use ark_ff::MontFp;
use lazy_static::lazy_static;

/// Number of full rounds (beginning + end)
pub const FULL_ROUNDS: usize = 8;

/// Number of partial rounds
pub const PARTIAL_ROUNDS: usize = 57;

/// S-box exponent
pub const ALPHA: u64 = 5;

/// Sponge rate (field elements absorbed per permutation)
pub const RATE: usize = 2;

/// Sponge capacity
pub const CAPACITY: usize = 1;

/// Seed for round-constant generation ("POSEIDON" in ASCII).
const ROUND_CONSTANT_SEED: u64 = 0x504f534549444f4e;

lazy_static! {
    static ref POSEIDON_CONFIG: PoseidonConfig<Fr> = build_config();
}

/// Get the process-wide Poseidon configuration for the BN254 scalar field.
///
/// Parameters:
/// - Rate: 2 (absorb 2 field elements at a time)
/// - Capacity: 1
/// - Full rounds: 8 (4 at start, 4 at end)
/// - Partial rounds: 57
/// - Alpha: 5 (x^5 S-box)
pub fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    &POSEIDON_CONFIG
}

fn build_config() -> PoseidonConfig<Fr> {
    // MDS matrix (3x3 for rate=2, capacity=1)
    let mds = vec![
        vec![
            MontFp!("7511745149465107256748700652201246547602992235352608707588321460060273774987"),
            MontFp!("10370080108974718697676803824769673834027675643658433702224577712625900127200"),
            MontFp!("19705173408229649878903981084052839426532978878058043055305024233888854471533"),
        ],
        vec![
            MontFp!("18732019378264290557468133440468564866454307626475683536618613112504878618481"),
            MontFp!("20870176810702568768751421378473869562658540583882454726129544628203806653987"),
            MontFp!("7266061498423634438932006217945904744987532209093972706694887950396501989428"),
        ],
        vec![
            MontFp!("9131299761947733513298312097611845208338517739621853568979632113419485819303"),
            MontFp!("10595341252162738537912664445405114076324478519622938027420701542910180337937"),
            MontFp!("11597556804922396090267472882856054602429588299176362916247939723151043581408"),
        ],
    ];

    PoseidonConfig {
        full_rounds: FULL_ROUNDS,
        partial_rounds: PARTIAL_ROUNDS,
        alpha: ALPHA,
        ark: generate_round_constants(),
        mds,
        rate: RATE,
        capacity: CAPACITY,
    }
}

/// Round constants: iterate `s <- s^2 + 7` from the seed, one value per
/// state element per round.
fn generate_round_constants() -> Vec<Vec<Fr>> {
    let num_rounds = FULL_ROUNDS + PARTIAL_ROUNDS;
    let width = RATE + CAPACITY;

    let mut ark = Vec::with_capacity(num_rounds);
    let mut state = Fr::from(ROUND_CONSTANT_SEED);

    for _ in 0..num_rounds {
        let mut round_constants = Vec::with_capacity(width);
        for _ in 0..width {
            state = state * state + Fr::from(7u64);
            round_constants.push(state);
        }
        ark.push(round_constants);
    }

    ark
}
