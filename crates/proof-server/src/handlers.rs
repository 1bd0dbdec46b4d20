//! HTTP request handlers for notes, deposits and withdrawals.
//!
//! Field elements travel as `0x`-prefixed big-endian hex and amounts as
//! decimal strings, since a `u128` does not survive a JSON number.

use std::sync::Arc;

use ark_bn254::Fr;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use mixer_circuits::{Amount, ChainId, PublicSignals};
use mixer_pool::{DepositError, Payout, RejectReason, WithdrawalRequest};
use mixer_prover::{fr_from_hex, fr_to_hex, prove_withdrawal, ProveError, WithdrawTarget};

use crate::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable reason
    pub reason: &'static str,
}

fn error_response(status: StatusCode, reason: &'static str, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            reason,
        }),
    )
        .into_response()
}

fn parse_field(name: &str, value: &str) -> Result<Fr, Response> {
    fr_from_hex(value).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_field_element",
            format!("{}: {}", name, e),
        )
    })
}

fn parse_amount(name: &str, value: &str) -> Result<Amount, Response> {
    value.parse::<Amount>().map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "invalid_amount",
            format!("{}: {}", name, e),
        )
    })
}

fn deposit_status(err: &DepositError) -> StatusCode {
    match err {
        DepositError::ZeroCommitment | DepositError::WrongDenomination { .. } => {
            StatusCode::BAD_REQUEST
        }
        DepositError::DuplicateCommitment => StatusCode::CONFLICT,
        DepositError::CapacityExceeded { .. } | DepositError::CustodyOverflow => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn reject_status(reason: &RejectReason) -> StatusCode {
    match reason {
        RejectReason::FeeExceedsDenomination { .. } => StatusCode::BAD_REQUEST,
        RejectReason::UnknownRoot | RejectReason::AlreadySpent => StatusCode::CONFLICT,
        RejectReason::InvalidProof => StatusCode::UNPROCESSABLE_ENTITY,
        RejectReason::OutOfOrder { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============ Notes ============

#[derive(Serialize, Deserialize)]
pub struct GenerateNoteResponse {
    pub note: String,
    pub commitment: String,
}

pub async fn generate_note(State(state): State<Arc<AppState>>) -> Json<GenerateNoteResponse> {
    let (note, token) = state.codec.generate(state.keys.params.chain_id);

    Json(GenerateNoteResponse {
        note: token,
        commitment: fr_to_hex(&note.commitment()),
    })
}

#[derive(Deserialize)]
pub struct ParseNoteRequest {
    pub note: String,
}

#[derive(Serialize, Deserialize)]
pub struct ParseNoteResponse {
    pub commitment: String,
    pub nullifier_hash: String,
    pub denomination: String,
    pub chain_id: ChainId,
    /// Leaf index if the indexer has seen the deposit
    pub leaf_index: Option<u64>,
    pub spent: bool,
}

pub async fn parse_note(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ParseNoteRequest>,
) -> impl IntoResponse {
    let note = match state.codec.parse(&req.note) {
        Ok(note) => note,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "decode_error", e),
    };

    let commitment = note.commitment();
    let nullifier_hash = note.nullifier_hash();
    let (leaf_index, spent) = {
        let indexer = state.indexer.read().await;
        (indexer.leaf_index(&commitment), indexer.is_spent(&nullifier_hash))
    };

    let response = ParseNoteResponse {
        commitment: fr_to_hex(&commitment),
        nullifier_hash: fr_to_hex(&nullifier_hash),
        denomination: note.denomination().to_string(),
        chain_id: note.chain_id(),
        leaf_index,
        spent,
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ============ Deposit ============

#[derive(Deserialize)]
pub struct DepositRequest {
    pub commitment: String,
    pub amount: String,
}

#[derive(Serialize, Deserialize)]
pub struct DepositResponse {
    pub leaf_index: u64,
    pub root: String,
}

pub async fn deposit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DepositRequest>,
) -> impl IntoResponse {
    let commitment = match parse_field("commitment", &req.commitment) {
        Ok(c) => c,
        Err(response) => return response,
    };
    let amount = match parse_amount("amount", &req.amount) {
        Ok(a) => a,
        Err(response) => return response,
    };

    match state.pool.deposit(commitment, amount).await {
        Ok(receipt) => {
            info!(leaf_index = receipt.leaf_index, "deposit accepted");
            let response = DepositResponse {
                leaf_index: receipt.leaf_index,
                root: fr_to_hex(&receipt.root),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => error_response(deposit_status(&e), e.code(), &e),
    }
}

// ============ Withdrawal proof ============

#[derive(Deserialize)]
pub struct ProveWithdrawRequest {
    pub note: String,
    pub recipient: String,
    pub relayer: Option<String>,
    pub fee: Option<String>,
    pub refund: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct SignalsResponse {
    pub root: String,
    pub nullifier_hash: String,
    pub recipient: String,
    pub relayer: String,
    pub fee: String,
    pub refund: String,
}

impl From<&PublicSignals> for SignalsResponse {
    fn from(signals: &PublicSignals) -> Self {
        Self {
            root: fr_to_hex(&signals.root),
            nullifier_hash: fr_to_hex(&signals.nullifier_hash),
            recipient: fr_to_hex(&signals.recipient),
            relayer: fr_to_hex(&signals.relayer),
            fee: signals.fee.to_string(),
            refund: signals.refund.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ProveWithdrawResponse {
    pub proof: String,
    pub signals: SignalsResponse,
}

pub async fn prove_withdraw(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProveWithdrawRequest>,
) -> impl IntoResponse {
    let note = match state.codec.parse(&req.note) {
        Ok(note) => note,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "decode_error", e),
    };
    let recipient = match parse_field("recipient", &req.recipient) {
        Ok(r) => r,
        Err(response) => return response,
    };
    let relayer = match req.relayer.as_deref().map(|r| parse_field("relayer", r)) {
        Some(Ok(r)) => r,
        Some(Err(response)) => return response,
        None => Fr::from(0u64),
    };
    let fee = match req.fee.as_deref().map(|f| parse_amount("fee", f)) {
        Some(Ok(f)) => f,
        Some(Err(response)) => return response,
        None => 0,
    };
    let refund = match req.refund.as_deref().map(|r| parse_amount("refund", r)) {
        Some(Ok(r)) => r,
        Some(Err(response)) => return response,
        None => 0,
    };

    // The path comes from the indexer's replica, never from pool storage.
    let path = {
        let indexer = state.indexer.read().await;
        let Some(index) = indexer.leaf_index(&note.commitment()) else {
            return error_response(
                StatusCode::NOT_FOUND,
                "unknown_commitment",
                "Commitment has not been deposited (or is not indexed yet)",
            );
        };
        match indexer.membership_path(index) {
            Ok(path) => path,
            Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", e),
        }
    };

    let target = WithdrawTarget {
        recipient,
        relayer,
        fee,
        refund,
    };
    let keys = Arc::clone(&state.keys);
    let proved =
        tokio::task::spawn_blocking(move || prove_withdrawal(&keys, &note, path, target)).await;

    let proof_with_signals = match proved {
        Ok(Ok(p)) => p,
        Ok(Err(e @ ProveError::InvalidWitness(_))) => {
            return error_response(StatusCode::BAD_REQUEST, "invalid_witness", e)
        }
        Ok(Err(e)) => {
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "proof_generation", e)
        }
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", e),
    };

    let proof_bytes = match proof_with_signals.serialize_proof() {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", e),
    };
    let response = ProveWithdrawResponse {
        proof: format!("0x{}", hex::encode(proof_bytes)),
        signals: SignalsResponse::from(&proof_with_signals.signals),
    };
    (StatusCode::OK, Json(response)).into_response()
}

// ============ Withdraw ============

#[derive(Deserialize)]
pub struct WithdrawRequest {
    pub proof: String,
    pub root: String,
    pub nullifier_hash: String,
    pub recipient: String,
    pub relayer: String,
    pub fee: String,
    pub refund: String,
}

impl WithdrawRequest {
    fn decode(&self) -> Result<WithdrawalRequest, Response> {
        let proof = hex::decode(self.proof.trim_start_matches("0x")).map_err(|e| {
            error_response(StatusCode::BAD_REQUEST, "invalid_proof_encoding", e)
        })?;

        Ok(WithdrawalRequest {
            proof,
            root: parse_field("root", &self.root)?,
            nullifier_hash: parse_field("nullifier_hash", &self.nullifier_hash)?,
            recipient: parse_field("recipient", &self.recipient)?,
            relayer: parse_field("relayer", &self.relayer)?,
            fee: parse_amount("fee", &self.fee)?,
            refund: parse_amount("refund", &self.refund)?,
        })
    }
}

#[derive(Serialize, Deserialize)]
pub struct PayoutResponse {
    pub recipient: String,
    pub recipient_amount: String,
    pub relayer: String,
    pub fee: String,
    pub refund: String,
}

impl From<Payout> for PayoutResponse {
    fn from(payout: Payout) -> Self {
        Self {
            recipient: fr_to_hex(&payout.recipient),
            recipient_amount: payout.recipient_amount.to_string(),
            relayer: fr_to_hex(&payout.relayer),
            fee: payout.fee.to_string(),
            refund: payout.refund.to_string(),
        }
    }
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WithdrawRequest>,
) -> impl IntoResponse {
    let request = match req.decode() {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.pool.withdraw(request).await {
        Ok(payout) => (StatusCode::OK, Json(PayoutResponse::from(payout))).into_response(),
        Err(reason) => {
            warn!(reason = reason.code(), "withdrawal refused");
            error_response(reject_status(&reason), reason.code(), &reason)
        }
    }
}

// ============ Pre-flight queries ============

#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub root: String,
    pub deposits: u64,
}

pub async fn current_root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    let indexer = state.indexer.read().await;

    Json(RootResponse {
        root: fr_to_hex(&indexer.current_root()),
        deposits: indexer.len(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct RootStatusResponse {
    pub root: String,
    pub known: bool,
}

pub async fn root_status(
    State(state): State<Arc<AppState>>,
    Path(root): Path<String>,
) -> impl IntoResponse {
    let root = match parse_field("root", &root) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let known = state.indexer.read().await.is_known_root(&root);
    let response = RootStatusResponse {
        root: fr_to_hex(&root),
        known,
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[derive(Serialize, Deserialize)]
pub struct NullifierStatusResponse {
    pub nullifier_hash: String,
    pub spent: bool,
}

pub async fn nullifier_status(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> impl IntoResponse {
    let nullifier_hash = match parse_field("nullifier_hash", &hash) {
        Ok(h) => h,
        Err(response) => return response,
    };

    let spent = state.indexer.read().await.is_spent(&nullifier_hash);
    let response = NullifierStatusResponse {
        nullifier_hash: fr_to_hex(&nullifier_hash),
        spent,
    };
    (StatusCode::OK, Json(response)).into_response()
}
