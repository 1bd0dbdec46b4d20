//! Pool state for the mixer.
//!
//! This crate provides:
//! - `RootHistory` and `NullifierRegistry`, the two sets a withdrawal is
//!   checked against
//! - The withdrawal gate state machine
//! - `MixerState`, the single-writer pool, and `MixerService`, its async front
//! - `Indexer`, an off-chain replica fed by pool events

pub mod config;
pub mod error;
pub mod events;
pub mod gate;
pub mod indexer;
pub mod nullifiers;
pub mod root_history;
pub mod service;
pub mod state;


pub use config::{ConfigError, PoolConfig};
pub use error::{DepositError, RejectReason};
pub use events::PoolEvent;
pub use gate::{GateState, Payout, Withdrawal, WithdrawalRequest};
pub use indexer::{Indexer, IndexerError};
pub use nullifiers::{AlreadySpent, NullifierRegistry};
pub use root_history::RootHistory;
pub use service::MixerService;
pub use state::{DepositReceipt, MixerState};
