//! HTTP API server for the mixer pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod routes;


use mixer_circuits::PoseidonHasher;
use mixer_pool::{Indexer, MixerService, MixerState, PoolConfig};
use mixer_prover::setup::{CircuitKeys, KeyParams};
use mixer_prover::{Groth16Verifier, NoteCodec};

use crate::config::{Config, NoteConfig};

/// Application state shared across handlers
pub struct AppState {
    pub pool: MixerService<Groth16Verifier>,
    pub indexer: Arc<RwLock<Indexer>>,
    pub keys: Arc<CircuitKeys>,
    pub codec: NoteCodec,
}

impl AppState {
    /// Build the pool around `keys` and start the indexer following it.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(pool_config: PoolConfig, note: &NoteConfig, keys: CircuitKeys) -> Result<Arc<Self>> {
        let verifier = Groth16Verifier::new(&keys.withdraw.verifying_key)
            .context("Failed to process verifying key")?;
        let state = MixerState::new(pool_config.clone()).context("Invalid pool configuration")?;
        let indexer = Arc::new(RwLock::new(
            Indexer::new(&pool_config).context("Failed to create indexer")?,
        ));

        let receiver = state.subscribe();
        tokio::spawn(follow_pool(Arc::clone(&indexer), receiver));

        Ok(Arc::new(Self {
            pool: MixerService::new(state, verifier),
            indexer,
            keys: Arc::new(keys),
            codec: NoteCodec::new(&note.asset, &note.denomination_label, pool_config.denomination),
        }))
    }
}

async fn follow_pool(
    indexer: Arc<RwLock<Indexer>>,
    receiver: tokio::sync::broadcast::Receiver<mixer_pool::PoolEvent>,
) {
    if let Err(e) = Indexer::follow(indexer, receiver).await {
        error!(error = %e, "indexer stopped; pre-flight checks are stale");
    }
}

/// Router with all API routes and middleware.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Refuse to start if the hasher does not reproduce the pinned vectors.
fn check_hasher() -> Result<()> {
    PoseidonHasher
        .self_check()
        .context("Poseidon parameters do not match the pinned test vectors")
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting mixer server...");

    let config = Config::load()?;
    check_hasher()?;

    // Load or generate circuit keys
    let params = KeyParams {
        tree_height: config.pool.tree_height,
        chain_id: config.pool.chain_id,
    };
    let keys_dir = config.keys.dir.clone();
    if !CircuitKeys::exists_in(&keys_dir) {
        info!(dir = %keys_dir.display(), "running trusted setup (this may take a while)");
    }
    let keys = tokio::task::spawn_blocking(move || CircuitKeys::load_or_setup(&keys_dir, params))
        .await
        .context("Key setup task failed")?
        .with_context(|| format!("Failed to load circuit keys from {}", config.keys.dir.display()))?;
    info!(
        tree_height = keys.params.tree_height,
        chain_id = keys.params.chain_id,
        "circuit keys ready"
    );

    let state = AppState::start(config.pool.clone(), &config.note, keys)?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
