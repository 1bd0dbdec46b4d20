//! Async front end over [`MixerState`].
//!
//! Deposits and settlements take the write lock, so they are applied one at a
//! time. Groth16 verification is the slow part of a withdrawal; it runs on a
//! blocking thread with no lock held, and settlement re-checks the root and
//! nullifier under the write lock, so of several concurrent withdrawals of
//! one note exactly one settles.

use std::sync::Arc;

use ark_bn254::Fr;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, warn};

use mixer_circuits::{FieldHasher, MembershipPath, MerkleError, PoseidonHasher};
use mixer_prover::{ProofVerifier, VerifyError};

use crate::error::{DepositError, RejectReason};
use crate::events::PoolEvent;
use crate::gate::{Payout, WithdrawalRequest};
use crate::state::{DepositReceipt, MixerState};

pub struct MixerService<V: ProofVerifier, H: FieldHasher = PoseidonHasher> {
    state: Arc<RwLock<MixerState<H>>>,
    verifier: Arc<V>,
}

impl<V: ProofVerifier, H: FieldHasher> Clone for MixerService<V, H> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

impl<V: ProofVerifier, H: FieldHasher> MixerService<V, H> {
    pub fn new(state: MixerState<H>, verifier: V) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            verifier: Arc::new(verifier),
        }
    }

    pub async fn deposit(
        &self,
        commitment: Fr,
        amount: mixer_circuits::Amount,
    ) -> Result<DepositReceipt, DepositError> {
        let mut state = self.state.write().await;
        state.deposit(commitment, amount).map_err(|e| {
            warn!(reason = e.code(), "deposit rejected");
            e
        })
    }

    /// Run a withdrawal through the gate.
    pub async fn withdraw(&self, request: WithdrawalRequest) -> Result<Payout, RejectReason> {
        let mut withdrawal = {
            let state = self.state.read().await;
            state.precheck(request)
        };
        if let Some(reason) = withdrawal.rejection() {
            warn!(reason = reason.code(), "withdrawal rejected");
            return Err(reason.clone());
        }

        let signals = withdrawal.request().public_signals();
        let proof = withdrawal.request().proof.clone();
        let verifier = Arc::clone(&self.verifier);

        let outcome = tokio::task::spawn_blocking(move || verifier.verify(&signals, &proof))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "proof verification task failed");
                Err(VerifyError::Verification(e.to_string()))
            });

        if let Err(reason) = withdrawal.apply_verification(outcome) {
            warn!(reason = reason.code(), "withdrawal rejected");
            return Err(reason);
        }

        let mut state = self.state.write().await;
        state.settle(withdrawal)
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.state.read().await.subscribe()
    }

    pub async fn current_root(&self) -> Fr {
        self.state.read().await.current_root()
    }

    pub async fn is_known_root(&self, root: &Fr) -> bool {
        self.state.read().await.is_known_root(root)
    }

    pub async fn is_spent(&self, nullifier_hash: &Fr) -> bool {
        self.state.read().await.is_spent(nullifier_hash)
    }

    pub async fn membership_path(&self, index: u64) -> Result<MembershipPath, MerkleError> {
        self.state.read().await.membership_path(index)
    }

    pub async fn custody(&self) -> mixer_circuits::Amount {
        self.state.read().await.custody()
    }

    /// Shared handle to the underlying state, for read-only inspection.
    pub fn state(&self) -> &Arc<RwLock<MixerState<H>>> {
        &self.state
    }
}
