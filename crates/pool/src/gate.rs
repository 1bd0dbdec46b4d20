//! Withdrawal gate state machine.
//!
//! ```text
//! Received -> RootChecked -> NullifierChecked -> ProofVerified -> Settled
//!     \______________\_______________\________________\______> Rejected(reason)
//! ```
//!
//! Steps run in that fixed order and the first failure is final. A step
//! called out of order is refused with [`RejectReason::OutOfOrder`] and
//! leaves the withdrawal where it was. Only [`Withdrawal::settle`] mutates
//! anything, and it re-checks the root and
//! nullifier itself, so a withdrawal that was verified without holding the
//! pool lock still cannot settle against stale state.

use ark_bn254::Fr;
use tracing::{debug, warn};

use mixer_circuits::{Amount, PublicSignals};
use mixer_prover::{ProofVerifier, VerifyError};

use crate::error::RejectReason;
use crate::nullifiers::NullifierRegistry;
use crate::root_history::RootHistory;

/// A withdrawal as submitted by a user or relayer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalRequest {
    /// Compressed Groth16 proof
    pub proof: Vec<u8>,
    pub root: Fr,
    pub nullifier_hash: Fr,
    pub recipient: Fr,
    pub relayer: Fr,
    pub fee: Amount,
    pub refund: Amount,
}

impl WithdrawalRequest {
    /// The tuple the proof must verify against.
    pub fn public_signals(&self) -> PublicSignals {
        PublicSignals {
            root: self.root,
            nullifier_hash: self.nullifier_hash,
            recipient: self.recipient,
            relayer: self.relayer,
            fee: self.fee,
            refund: self.refund,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateState {
    Received,
    RootChecked,
    NullifierChecked,
    ProofVerified,
    Settled,
    Rejected(RejectReason),
}

impl GateState {
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Received => "received",
            GateState::RootChecked => "root_checked",
            GateState::NullifierChecked => "nullifier_checked",
            GateState::ProofVerified => "proof_verified",
            GateState::Settled => "settled",
            GateState::Rejected(_) => "rejected",
        }
    }
}

/// Value released by a settled withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub recipient: Fr,
    /// `denomination - fee`
    pub recipient_amount: Amount,
    pub relayer: Fr,
    pub fee: Amount,
    pub refund: Amount,
}

/// One withdrawal attempt moving through the gate.
#[derive(Clone, Debug)]
pub struct Withdrawal {
    request: WithdrawalRequest,
    denomination: Amount,
    state: GateState,
}

impl Withdrawal {
    /// Accept a request for a pool with the given denomination.
    ///
    /// A fee above the denomination is rejected before any other check.
    pub fn receive(request: WithdrawalRequest, denomination: Amount) -> Self {
        let state = if request.fee > denomination {
            GateState::Rejected(RejectReason::FeeExceedsDenomination {
                fee: request.fee,
                denomination,
            })
        } else {
            GateState::Received
        };

        Self {
            request,
            denomination,
            state,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn request(&self) -> &WithdrawalRequest {
        &self.request
    }

    /// The rejection reason, if the gate has rejected this withdrawal.
    pub fn rejection(&self) -> Option<&RejectReason> {
        match &self.state {
            GateState::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Step 1: the root must be inside the history window.
    pub fn check_root(&mut self, roots: &RootHistory) -> Result<(), RejectReason> {
        let valid = roots.is_valid(&self.request.root);
        self.step(GateState::Received, GateState::RootChecked, || {
            valid.then_some(()).ok_or(RejectReason::UnknownRoot)
        })
    }

    /// Step 2: the nullifier hash must not be spent.
    pub fn check_nullifier(&mut self, registry: &NullifierRegistry) -> Result<(), RejectReason> {
        let spent = registry.is_spent(&self.request.nullifier_hash);
        self.step(GateState::RootChecked, GateState::NullifierChecked, || {
            (!spent).then_some(()).ok_or(RejectReason::AlreadySpent)
        })
    }

    /// Step 3: verify the proof in place.
    pub fn verify_proof<V: ProofVerifier + ?Sized>(
        &mut self,
        verifier: &V,
    ) -> Result<(), RejectReason> {
        let outcome = verifier.verify(&self.request.public_signals(), &self.request.proof);
        self.apply_verification(outcome)
    }

    /// Step 3 when verification ran elsewhere (e.g. on a blocking thread).
    ///
    /// Anything but `Ok(true)` is an invalid proof.
    pub fn apply_verification(
        &mut self,
        outcome: Result<bool, VerifyError>,
    ) -> Result<(), RejectReason> {
        self.step(GateState::NullifierChecked, GateState::ProofVerified, || {
            match outcome {
                Ok(true) => Ok(()),
                Ok(false) => Err(RejectReason::InvalidProof),
                Err(e) => {
                    debug!(error = %e, "proof could not be verified");
                    Err(RejectReason::InvalidProof)
                }
            }
        })
    }

    /// Step 4: mark the nullifier spent and compute the payout.
    ///
    /// The root and nullifier are checked again against the state being
    /// mutated; the caller must hold exclusive access to both.
    pub fn settle(
        &mut self,
        roots: &RootHistory,
        registry: &mut NullifierRegistry,
    ) -> Result<Payout, RejectReason> {
        let request = &self.request;
        let root_valid = roots.is_valid(&request.root);
        let nullifier_hash = request.nullifier_hash;

        self.step(GateState::ProofVerified, GateState::Settled, || {
            if !root_valid {
                return Err(RejectReason::UnknownRoot);
            }
            registry
                .mark_spent(nullifier_hash)
                .map_err(|_| RejectReason::AlreadySpent)
        })?;

        Ok(Payout {
            recipient: self.request.recipient,
            recipient_amount: self.denomination - self.request.fee,
            relayer: self.request.relayer,
            fee: self.request.fee,
            refund: self.request.refund,
        })
    }

    fn step(
        &mut self,
        from: GateState,
        to: GateState,
        check: impl FnOnce() -> Result<(), RejectReason>,
    ) -> Result<(), RejectReason> {
        if let GateState::Rejected(reason) = &self.state {
            return Err(reason.clone());
        }
        if self.state != from {
            warn!(
                expected = from.name(),
                actual = self.state.name(),
                "withdrawal gate step out of order"
            );
            return Err(RejectReason::OutOfOrder {
                expected: from.name(),
                actual: self.state.name(),
            });
        }

        match check() {
            Ok(()) => {
                debug!(from = ?from, to = ?to, "withdrawal gate transition");
                self.state = to;
                Ok(())
            }
            Err(reason) => {
                debug!(from = ?from, reason = %reason, "withdrawal rejected");
                self.state = GateState::Rejected(reason.clone());
                Err(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedVerifier(Result<bool, VerifyError>);

    impl ProofVerifier for FixedVerifier {
        fn verify(&self, _: &PublicSignals, _: &[u8]) -> Result<bool, VerifyError> {
            self.0.clone()
        }
    }

    fn request(fee: Amount) -> WithdrawalRequest {
        WithdrawalRequest {
            proof: vec![1, 2, 3],
            root: Fr::from(100u64),
            nullifier_hash: Fr::from(200u64),
            recipient: Fr::from(300u64),
            relayer: Fr::from(400u64),
            fee,
            refund: 0,
        }
    }

    fn roots_with(root: Fr) -> RootHistory {
        let mut roots = RootHistory::new(4).unwrap();
        roots.record(root);
        roots
    }

    #[test]
    fn test_happy_path() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();
        let mut w = Withdrawal::receive(request(10), 1000);

        assert_eq!(w.state(), &GateState::Received);
        w.check_root(&roots).unwrap();
        assert_eq!(w.state(), &GateState::RootChecked);
        w.check_nullifier(&registry).unwrap();
        assert_eq!(w.state(), &GateState::NullifierChecked);
        w.verify_proof(&FixedVerifier(Ok(true))).unwrap();
        assert_eq!(w.state(), &GateState::ProofVerified);

        let payout = w.settle(&roots, &mut registry).unwrap();
        assert_eq!(w.state(), &GateState::Settled);
        assert_eq!(payout.recipient_amount, 990);
        assert_eq!(payout.fee, 10);
        assert_eq!(payout.relayer, Fr::from(400u64));
        assert!(registry.is_spent(&Fr::from(200u64)));
    }

    #[test]
    fn test_fee_checked_first() {
        // Unknown root too, but the fee is reported
        let roots = RootHistory::new(4).unwrap();
        let mut w = Withdrawal::receive(request(1001), 1000);

        let expected = RejectReason::FeeExceedsDenomination {
            fee: 1001,
            denomination: 1000,
        };
        assert_eq!(w.check_root(&roots), Err(expected.clone()));
        assert_eq!(w.rejection(), Some(&expected));
    }

    #[test]
    fn test_fee_equal_to_denomination_allowed() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();
        let mut w = Withdrawal::receive(request(1000), 1000);

        w.check_root(&roots).unwrap();
        w.check_nullifier(&registry).unwrap();
        w.verify_proof(&FixedVerifier(Ok(true))).unwrap();
        assert_eq!(w.settle(&roots, &mut registry).unwrap().recipient_amount, 0);
    }

    #[test]
    fn test_unknown_root_before_spent() {
        let roots = roots_with(Fr::from(1u64));
        let mut registry = NullifierRegistry::new();
        registry.mark_spent(Fr::from(200u64)).unwrap();

        let mut w = Withdrawal::receive(request(0), 1000);
        assert_eq!(w.check_root(&roots), Err(RejectReason::UnknownRoot));
        // Later steps keep reporting the first failure
        assert_eq!(w.check_nullifier(&registry), Err(RejectReason::UnknownRoot));
        assert_eq!(w.state(), &GateState::Rejected(RejectReason::UnknownRoot));
    }

    #[test]
    fn test_spent_nullifier() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();
        registry.mark_spent(Fr::from(200u64)).unwrap();

        let mut w = Withdrawal::receive(request(0), 1000);
        w.check_root(&roots).unwrap();
        assert_eq!(w.check_nullifier(&registry), Err(RejectReason::AlreadySpent));
    }

    #[test]
    fn test_invalid_and_malformed_proof() {
        let roots = roots_with(Fr::from(100u64));
        let registry = NullifierRegistry::new();

        for verifier in [
            FixedVerifier(Ok(false)),
            FixedVerifier(Err(VerifyError::MalformedProof("short".to_string()))),
        ] {
            let mut w = Withdrawal::receive(request(0), 1000);
            w.check_root(&roots).unwrap();
            w.check_nullifier(&registry).unwrap();
            assert_eq!(w.verify_proof(&verifier), Err(RejectReason::InvalidProof));
        }
    }

    #[test]
    fn test_settle_rechecks_state() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();

        let mut first = Withdrawal::receive(request(0), 1000);
        let mut second = Withdrawal::receive(request(0), 1000);
        for w in [&mut first, &mut second] {
            w.check_root(&roots).unwrap();
            w.check_nullifier(&registry).unwrap();
            w.verify_proof(&FixedVerifier(Ok(true))).unwrap();
        }

        assert!(first.settle(&roots, &mut registry).is_ok());
        assert_eq!(
            second.settle(&roots, &mut registry),
            Err(RejectReason::AlreadySpent)
        );

        // Root evicted between verification and settlement
        let mut other = request(0);
        other.nullifier_hash = Fr::from(201u64);
        let mut third = Withdrawal::receive(other, 1000);
        third.check_root(&roots).unwrap();
        third.check_nullifier(&registry).unwrap();
        third.verify_proof(&FixedVerifier(Ok(true))).unwrap();

        let newer = roots_with(Fr::from(999u64));
        assert_eq!(
            third.settle(&newer, &mut registry),
            Err(RejectReason::UnknownRoot)
        );
        assert!(!registry.is_spent(&Fr::from(201u64)));
    }

    #[test]
    fn test_settle_before_verification_refused() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();

        let mut w = Withdrawal::receive(request(0), 1000);
        assert_eq!(
            w.settle(&roots, &mut registry),
            Err(RejectReason::OutOfOrder {
                expected: "proof_verified",
                actual: "received",
            })
        );
        assert_eq!(w.state(), &GateState::Received);

        w.check_root(&roots).unwrap();
        w.check_nullifier(&registry).unwrap();
        assert_eq!(
            w.settle(&roots, &mut registry),
            Err(RejectReason::OutOfOrder {
                expected: "proof_verified",
                actual: "nullifier_checked",
            })
        );
        assert!(!registry.is_spent(&Fr::from(200u64)));
        assert!(registry.is_empty());

        // Refused steps leave the withdrawal usable
        w.verify_proof(&FixedVerifier(Ok(true))).unwrap();
        assert!(w.settle(&roots, &mut registry).is_ok());
        assert!(registry.is_spent(&Fr::from(200u64)));
    }

    #[test]
    fn test_verify_before_nullifier_check_refused() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();

        let mut w = Withdrawal::receive(request(0), 1000);
        w.check_root(&roots).unwrap();
        assert_eq!(
            w.verify_proof(&FixedVerifier(Ok(true))),
            Err(RejectReason::OutOfOrder {
                expected: "nullifier_checked",
                actual: "root_checked",
            })
        );
        assert_eq!(w.state(), &GateState::RootChecked);
        assert!(w.settle(&roots, &mut registry).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_settled_withdrawal_cannot_settle_again() {
        let roots = roots_with(Fr::from(100u64));
        let mut registry = NullifierRegistry::new();

        let mut w = Withdrawal::receive(request(0), 1000);
        w.check_root(&roots).unwrap();
        w.check_nullifier(&registry).unwrap();
        w.verify_proof(&FixedVerifier(Ok(true))).unwrap();
        w.settle(&roots, &mut registry).unwrap();

        assert_eq!(
            w.settle(&roots, &mut registry),
            Err(RejectReason::OutOfOrder {
                expected: "proof_verified",
                actual: "settled",
            })
        );
        assert_eq!(w.state(), &GateState::Settled);
        assert_eq!(registry.len(), 1);
    }
}
