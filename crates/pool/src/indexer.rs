//! Off-chain replica of the pool's roots and spent nullifiers.
//!
//! The indexer never reads pool storage. It rebuilds the accumulator from
//! [`PoolEvent::Inserted`] events and recomputes every root itself, so a
//! hasher or ordering mismatch between the pool and this replica surfaces as
//! [`IndexerError::RootMismatch`] instead of as proofs that never verify.

use std::collections::HashMap;
use std::sync::Arc;

use ark_bn254::Fr;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use mixer_circuits::{FieldHasher, MembershipPath, MerkleAccumulator, MerkleError, PoseidonHasher};

use crate::config::{ConfigError, PoolConfig};
use crate::events::PoolEvent;
use crate::nullifiers::NullifierRegistry;
use crate::root_history::RootHistory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexerError {
    #[error("Insert event for index {got}, expected {expected}")]
    OutOfOrder { expected: u64, got: u64 },
    #[error("Root mismatch at index {index}: pool has {expected}, replica computed {computed}")]
    RootMismatch {
        index: u64,
        expected: Fr,
        computed: Fr,
    },
    #[error("Indexer fell behind by {0} events")]
    Lagged(u64),
    #[error(transparent)]
    Tree(#[from] MerkleError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub struct Indexer<H: FieldHasher = PoseidonHasher> {
    tree: MerkleAccumulator<H>,
    roots: RootHistory,
    spent: NullifierRegistry,
    leaf_indices: HashMap<Fr, u64>,
}

impl Indexer<PoseidonHasher> {
    pub fn new(config: &PoolConfig) -> Result<Self, IndexerError> {
        Self::with_hasher(config, PoseidonHasher)
    }
}

impl<H: FieldHasher> Indexer<H> {
    pub fn with_hasher(config: &PoolConfig, hasher: H) -> Result<Self, IndexerError> {
        let tree = MerkleAccumulator::with_hasher(config.tree_height, hasher)?;
        let mut roots = RootHistory::new(config.root_history_size)?;
        roots.record(tree.root());

        Ok(Self {
            tree,
            roots,
            spent: NullifierRegistry::new(),
            leaf_indices: HashMap::new(),
        })
    }

    /// Apply one pool event.
    ///
    /// After an error the replica no longer matches the pool and should be
    /// rebuilt.
    pub fn apply(&mut self, event: &PoolEvent) -> Result<(), IndexerError> {
        match *event {
            PoolEvent::Inserted { index, leaf, root } => {
                let expected = self.tree.len();
                if index != expected {
                    return Err(IndexerError::OutOfOrder {
                        expected,
                        got: index,
                    });
                }

                let (_, computed) = self.tree.insert(leaf)?;
                if computed != root {
                    return Err(IndexerError::RootMismatch {
                        index,
                        expected: root,
                        computed,
                    });
                }

                self.roots.record(computed);
                self.leaf_indices.insert(leaf, index);
                debug!(index, root = %root, "indexed deposit");
            }
            PoolEvent::Spent { nullifier_hash, .. } => {
                if self.spent.mark_spent(nullifier_hash).is_err() {
                    warn!(nullifier_hash = %nullifier_hash, "spend event for a spent nullifier");
                }
                debug!(nullifier_hash = %nullifier_hash, "indexed withdrawal");
            }
        }
        Ok(())
    }

    /// Apply events from `receiver` until the pool closes the channel.
    pub async fn follow(
        indexer: Arc<RwLock<Self>>,
        mut receiver: broadcast::Receiver<PoolEvent>,
    ) -> Result<(), IndexerError> {
        loop {
            match receiver.recv().await {
                Ok(event) => indexer.write().await.apply(&event)?,
                Err(broadcast::error::RecvError::Closed) => {
                    info!("event channel closed, indexer stopping");
                    return Ok(());
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "indexer lagged behind the pool");
                    return Err(IndexerError::Lagged(skipped));
                }
            }
        }
    }

    pub fn is_known_root(&self, root: &Fr) -> bool {
        self.roots.is_valid(root)
    }

    pub fn is_spent(&self, nullifier_hash: &Fr) -> bool {
        self.spent.is_spent(nullifier_hash)
    }

    pub fn current_root(&self) -> Fr {
        self.tree.root()
    }

    pub fn membership_path(&self, index: u64) -> Result<MembershipPath, MerkleError> {
        self.tree.membership_path(index)
    }

    pub fn leaf_index(&self, commitment: &Fr) -> Option<u64> {
        self.leaf_indices.get(commitment).copied()
    }

    pub fn len(&self) -> u64 {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
