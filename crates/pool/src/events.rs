//! State transitions published for external replication.

use ark_bn254::Fr;

use mixer_circuits::Amount;

/// One event per pool mutation, in mutation order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolEvent {
    /// A commitment was appended to the accumulator.
    Inserted { index: u64, leaf: Fr, root: Fr },
    /// A withdrawal settled and its nullifier hash was spent.
    Spent {
        nullifier_hash: Fr,
        recipient: Fr,
        relayer: Fr,
        fee: Amount,
    },
}

/// Capacity of the event channel before slow subscribers start lagging.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
