//! Pool state owned by a single writer.
//!
//! Every mutation takes `&mut self`; [`crate::MixerService`] puts the state
//! behind a lock so deposits and settlements are serialized.

use std::collections::HashMap;

use ark_bn254::Fr;
use ark_ff::Zero;
use tokio::sync::broadcast;
use tracing::{info, warn};

use mixer_circuits::{
    Amount, FieldHasher, MembershipPath, MerkleAccumulator, MerkleError, PoseidonHasher,
};
use mixer_prover::ProofVerifier;

use crate::config::{ConfigError, PoolConfig};
use crate::error::{DepositError, RejectReason};
use crate::events::{PoolEvent, EVENT_CHANNEL_CAPACITY};
use crate::gate::{Payout, Withdrawal, WithdrawalRequest};
use crate::nullifiers::NullifierRegistry;
use crate::root_history::RootHistory;

/// Result of a successful deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositReceipt {
    pub leaf_index: u64,
    pub root: Fr,
}

/// Accumulator, root history and nullifier registry of one pool.
pub struct MixerState<H: FieldHasher = PoseidonHasher> {
    config: PoolConfig,
    tree: MerkleAccumulator<H>,
    roots: RootHistory,
    nullifiers: NullifierRegistry,
    /// Leaf index of every deposited commitment
    commitments: HashMap<Fr, u64>,
    /// Value held by the pool in base units
    custody: Amount,
    events: broadcast::Sender<PoolEvent>,
}

impl MixerState<PoseidonHasher> {
    pub fn new(config: PoolConfig) -> Result<Self, ConfigError> {
        Self::with_hasher(config, PoseidonHasher)
    }
}

impl<H: FieldHasher> MixerState<H> {
    /// Create an empty pool. The empty-tree root is the first history entry.
    pub fn with_hasher(config: PoolConfig, hasher: H) -> Result<Self, ConfigError> {
        config.validate()?;

        let tree = MerkleAccumulator::with_hasher(config.tree_height, hasher)
            .map_err(|_| ConfigError::TreeHeight(config.tree_height))?;
        let mut roots = RootHistory::new(config.root_history_size)?;
        roots.record(tree.root());

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config,
            tree,
            roots,
            nullifiers: NullifierRegistry::new(),
            commitments: HashMap::new(),
            custody: 0,
            events,
        })
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events.subscribe()
    }

    /// Append a commitment backed by exactly one denomination.
    pub fn deposit(&mut self, commitment: Fr, amount: Amount) -> Result<DepositReceipt, DepositError> {
        if commitment.is_zero() {
            return Err(DepositError::ZeroCommitment);
        }
        if amount != self.config.denomination {
            return Err(DepositError::WrongDenomination {
                expected: self.config.denomination,
                got: amount,
            });
        }
        if self.commitments.contains_key(&commitment) {
            return Err(DepositError::DuplicateCommitment);
        }

        let custody = self
            .custody
            .checked_add(amount)
            .ok_or(DepositError::CustodyOverflow)?;

        let capacity = self.tree.capacity();
        let (leaf_index, root) = self
            .tree
            .insert(commitment)
            .map_err(|_| DepositError::CapacityExceeded { capacity })?;

        self.roots.record(root);
        self.commitments.insert(commitment, leaf_index);
        self.custody = custody;

        info!(leaf_index, root = %root, "deposit accepted");
        self.publish(PoolEvent::Inserted {
            index: leaf_index,
            leaf: commitment,
            root,
        });

        Ok(DepositReceipt { leaf_index, root })
    }

    /// Run the gate up to (not including) proof verification.
    pub fn precheck(&self, request: WithdrawalRequest) -> Withdrawal {
        let mut withdrawal = Withdrawal::receive(request, self.config.denomination);
        // A failed step is recorded in the withdrawal's state
        if withdrawal.check_root(&self.roots).is_ok() {
            let _ = withdrawal.check_nullifier(&self.nullifiers);
        }
        withdrawal
    }

    /// Settle a withdrawal whose proof has been verified.
    pub fn settle(&mut self, mut withdrawal: Withdrawal) -> Result<Payout, RejectReason> {
        let payout = withdrawal
            .settle(&self.roots, &mut self.nullifiers)
            .map_err(|reason| {
                warn!(reason = reason.code(), "withdrawal rejected at settlement");
                reason
            })?;

        self.custody = self.custody.saturating_sub(self.config.denomination);

        let request = withdrawal.request();
        info!(
            nullifier_hash = %request.nullifier_hash,
            fee = payout.fee,
            "withdrawal settled"
        );
        self.publish(PoolEvent::Spent {
            nullifier_hash: request.nullifier_hash,
            recipient: payout.recipient,
            relayer: payout.relayer,
            fee: payout.fee,
        });

        Ok(payout)
    }

    /// Run the whole gate while holding exclusive access.
    pub fn withdraw<V: ProofVerifier + ?Sized>(
        &mut self,
        request: WithdrawalRequest,
        verifier: &V,
    ) -> Result<Payout, RejectReason> {
        let mut withdrawal = self.precheck(request);
        if let Some(reason) = withdrawal.rejection() {
            warn!(reason = reason.code(), "withdrawal rejected");
            return Err(reason.clone());
        }

        if let Err(reason) = withdrawal.verify_proof(verifier) {
            warn!(reason = reason.code(), "withdrawal rejected");
            return Err(reason);
        }

        self.settle(withdrawal)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn current_root(&self) -> Fr {
        self.tree.root()
    }

    pub fn is_known_root(&self, root: &Fr) -> bool {
        self.roots.is_valid(root)
    }

    pub fn is_spent(&self, nullifier_hash: &Fr) -> bool {
        self.nullifiers.is_spent(nullifier_hash)
    }

    pub fn root_history(&self) -> &RootHistory {
        &self.roots
    }

    pub fn membership_path(&self, index: u64) -> Result<MembershipPath, MerkleError> {
        self.tree.membership_path(index)
    }

    pub fn leaf_index(&self, commitment: &Fr) -> Option<u64> {
        self.commitments.get(commitment).copied()
    }

    pub fn num_deposits(&self) -> u64 {
        self.tree.len()
    }

    pub fn num_withdrawals(&self) -> usize {
        self.nullifiers.len()
    }

    pub fn custody(&self) -> Amount {
        self.custody
    }

    fn publish(&self, event: PoolEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
