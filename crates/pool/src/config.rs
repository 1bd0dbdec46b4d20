//! Pool deployment parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mixer_circuits::{Amount, ChainId, DEFAULT_HEIGHT, MAX_HEIGHT};

const DEFAULT_ROOT_HISTORY_SIZE: usize = 30;
const DEFAULT_DENOMINATION: Amount = 100_000_000_000_000_000;
const DEFAULT_CHAIN_ID: ChainId = 1;

/// Invalid pool parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Tree height {0} is outside 1..={max}", max = MAX_HEIGHT)]
    TreeHeight(u32),
    #[error("Root history must retain at least one root")]
    EmptyRootHistory,
    #[error("Denomination must be non-zero")]
    ZeroDenomination,
}

/// Parameters fixed for the lifetime of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_tree_height")]
    pub tree_height: u32,
    /// Number of most recent roots a withdrawal may reference
    #[serde(default = "default_root_history_size")]
    pub root_history_size: usize,
    /// Fixed deposit amount in base units
    #[serde(default = "default_denomination")]
    pub denomination: Amount,
    #[serde(default = "default_chain_id")]
    pub chain_id: ChainId,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            tree_height: DEFAULT_HEIGHT,
            root_history_size: DEFAULT_ROOT_HISTORY_SIZE,
            denomination: DEFAULT_DENOMINATION,
            chain_id: DEFAULT_CHAIN_ID,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tree_height == 0 || self.tree_height > MAX_HEIGHT {
            return Err(ConfigError::TreeHeight(self.tree_height));
        }
        if self.root_history_size == 0 {
            return Err(ConfigError::EmptyRootHistory);
        }
        if self.denomination == 0 {
            return Err(ConfigError::ZeroDenomination);
        }
        Ok(())
    }
}

fn default_tree_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_root_history_size() -> usize {
    DEFAULT_ROOT_HISTORY_SIZE
}

fn default_denomination() -> Amount {
    DEFAULT_DENOMINATION
}

fn default_chain_id() -> ChainId {
    DEFAULT_CHAIN_ID
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PoolConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tree_height, 20);
        assert_eq!(config.root_history_size, 30);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = PoolConfig {
            tree_height: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TreeHeight(0)));

        config.tree_height = 33;
        assert_eq!(config.validate(), Err(ConfigError::TreeHeight(33)));

        config.tree_height = 4;
        config.root_history_size = 0;
        assert_eq!(config.validate(), Err(ConfigError::EmptyRootHistory));

        config.root_history_size = 1;
        config.denomination = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroDenomination));
    }
}
