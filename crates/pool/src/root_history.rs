//! Bounded window of recently valid roots.
//!
//! Every accumulator mutation records its new root. Once more than
//! `capacity` roots have been recorded the oldest is evicted, so a proof built
//! against a root stays usable for the next `capacity - 1` deposits.

use std::collections::{HashMap, VecDeque};

use ark_bn254::Fr;

use crate::config::ConfigError;

#[derive(Clone, Debug)]
pub struct RootHistory {
    capacity: usize,
    roots: VecDeque<Fr>,
    /// Occurrences of each root inside the window
    counts: HashMap<Fr, usize>,
}

impl RootHistory {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::EmptyRootHistory);
        }
        Ok(Self {
            capacity,
            roots: VecDeque::with_capacity(capacity),
            counts: HashMap::with_capacity(capacity),
        })
    }

    /// Record a new root, evicting the oldest one if the window is full.
    pub fn record(&mut self, root: Fr) {
        self.roots.push_back(root);
        *self.counts.entry(root).or_insert(0) += 1;

        while self.roots.len() > self.capacity {
            if let Some(evicted) = self.roots.pop_front() {
                if let Some(count) = self.counts.get_mut(&evicted) {
                    *count -= 1;
                    if *count == 0 {
                        self.counts.remove(&evicted);
                    }
                }
            }
        }
    }

    /// Whether `root` is inside the retained window.
    pub fn is_valid(&self, root: &Fr) -> bool {
        self.counts.contains_key(root)
    }

    /// The most recently recorded root.
    pub fn current(&self) -> Option<Fr> {
        self.roots.back().copied()
    }

    /// Retained roots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Fr> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(i: u64) -> Fr {
        Fr::from(i)
    }

    #[test]
    fn test_record_and_check() {
        let mut history = RootHistory::new(3).unwrap();
        assert!(history.is_empty());
        assert!(!history.is_valid(&root(1)));

        history.record(root(1));
        history.record(root(2));

        assert!(history.is_valid(&root(1)));
        assert!(history.is_valid(&root(2)));
        assert_eq!(history.current(), Some(root(2)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut history = RootHistory::new(3).unwrap();
        for i in 1..=5 {
            history.record(root(i));
        }

        assert!(!history.is_valid(&root(1)));
        assert!(!history.is_valid(&root(2)));
        assert!(history.is_valid(&root(3)));
        assert!(history.is_valid(&root(5)));
        assert_eq!(history.iter().copied().collect::<Vec<_>>(), vec![root(3), root(4), root(5)]);
    }

    #[test]
    fn test_repeated_root_survives_partial_eviction() {
        let mut history = RootHistory::new(2).unwrap();
        history.record(root(7));
        history.record(root(7));
        history.record(root(8));

        // One copy of 7 was evicted, one is still in the window
        assert!(history.is_valid(&root(7)));

        history.record(root(9));
        assert!(!history.is_valid(&root(7)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RootHistory::new(0).unwrap_err(),
            ConfigError::EmptyRootHistory
        );
    }
}
