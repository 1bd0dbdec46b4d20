//! Append-only set of spent nullifier hashes.

use std::collections::HashSet;

use ark_bn254::Fr;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Nullifier hash already spent")]
pub struct AlreadySpent;

#[derive(Clone, Debug, Default)]
pub struct NullifierRegistry {
    spent: HashSet<Fr>,
}

impl NullifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spent(&self, nullifier_hash: &Fr) -> bool {
        self.spent.contains(nullifier_hash)
    }

    /// Check and set in one step. Entries are never removed.
    pub fn mark_spent(&mut self, nullifier_hash: Fr) -> Result<(), AlreadySpent> {
        if self.spent.insert(nullifier_hash) {
            Ok(())
        } else {
            Err(AlreadySpent)
        }
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
