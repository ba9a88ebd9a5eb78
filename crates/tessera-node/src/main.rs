//! tessera-node: the Tessera protocol node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh, otherwise resume from the snapshot
//!   3. Replay a file of signed transactions, if one is given
//!   4. Start the JSON-RPC 2.0 server
//!   5. Run the main loop: receive signed txs → apply as of the current day

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use tessera_core::interfaces::{DayClock, FixedClock};
use tessera_core::transaction::{Role, Transaction};
use tessera_crypto::KeyPair;
use tessera_genesis::{apply_genesis, is_applied, GenesisParams, RoleGrant};
use tessera_rpc::{RpcServer, RpcServerState};
use tessera_state::{ProtocolConfig, StateDb, StateEngine};

#[derive(Parser, Debug)]
#[command(
    name = "tessera-node",
    version,
    about = "Tessera node: stake-weighted daily log consensus and reward distribution"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.tessera/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8545")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only required on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// File of hex-encoded signed transactions, one per line, applied at
    /// startup before the RPC server opens.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Pin the protocol day instead of deriving it from the wall clock.
    #[arg(long)]
    day: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tessera=debug")),
        )
        .init();

    let args = Args::parse();
    info!("Tessera node starting");

    // ── State database ───────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ─────────────────────────────────────────────────────
    if !is_applied(&db).context("reading genesis marker")? {
        info!("fresh database, applying genesis");
        let params = load_or_generate_genesis_params(args.genesis_params.as_deref())?;
        apply_genesis(&db, &params).context("applying genesis")?;
    } else {
        info!("existing database found, skipping genesis");
    }

    // ── State engine ─────────────────────────────────────────────────────────
    let mut engine = StateEngine::load(Arc::clone(&db))
        .context("loading state snapshot")?
        .context("genesis marker present but no state snapshot")?;
    let config = engine.state().config.clone();
    info!(
        day = make_clock(&config, args.day).current_day(),
        next_index = engine.state().consensus.next_unfinalized(),
        "state loaded"
    );

    // ── Replay ───────────────────────────────────────────────────────────────
    if let Some(path) = &args.replay {
        let txs = read_replay_file(path)?;
        let today = make_clock(&config, args.day).current_day();
        let applied = engine.apply_all(&txs, today);
        info!(total = txs.len(), applied, day = today, "replay finished");
    }

    let engine = Arc::new(RwLock::new(engine));

    // ── Inbound transaction queue ────────────────────────────────────────────
    let (tx_sender, mut tx_receiver) = tokio::sync::mpsc::channel::<Transaction>(512);

    // ── RPC server ───────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState {
        engine: Arc::clone(&engine),
        clock: make_clock(&config, args.day),
        tx_sender: Some(tx_sender),
    });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Main loop: validate & apply ──────────────────────────────────────────
    let clock = make_clock(&config, args.day);
    info!("node ready");
    while let Some(tx) = tx_receiver.recv().await {
        let today = clock.current_day();
        let mut guard = engine.write().await;
        match guard.apply(&tx, today) {
            Ok(outcome) => debug!(tx_id = %tx.tx_id, ?outcome, "transaction outcome"),
            Err(e) => warn!(tx_id = %tx.tx_id, error = %e, "transaction rejected"),
        }
    }

    Ok(())
}

/// Day oracle for this node: pinned when `--day` is given, else the wall
/// clock anchored at the configured genesis timestamp.
fn make_clock(config: &ProtocolConfig, pinned: Option<u64>) -> Box<dyn DayClock + Send + Sync> {
    match pinned {
        Some(day) => Box::new(FixedClock(day)),
        None => Box::new(config.clock()),
    }
}

fn read_replay_file(path: &Path) -> anyhow::Result<Vec<Transaction>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading replay file {}", path.display()))?;
    text.lines()
        .map(str::trim)
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| {
            let bytes = hex::decode(line).with_context(|| format!("line {}: invalid hex", n + 1))?;
            bincode::deserialize(&bytes).with_context(|| format!("line {}: invalid transaction", n + 1))
        })
        .collect()
}

/// Load genesis parameters from a JSON file, or generate ephemeral keys if no path is given.
///
/// # Warning
/// Ephemeral keys are **not reproducible** and their secret halves are
/// discarded: nobody can act as owner. Only use this for local development.
fn load_or_generate_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    if let Some(p) = path {
        let json = std::fs::read_to_string(p)
            .with_context(|| format!("reading genesis params from {}", p.display()))?;
        return serde_json::from_str(&json).context("parsing genesis params JSON");
    }
    warn!("No --genesis-params provided. Generating ephemeral keys. DO NOT USE IN PRODUCTION.");
    let owner = KeyPair::generate();
    let ticket_signer = KeyPair::generate();
    Ok(GenesisParams {
        config: ProtocolConfig::default(),
        owner: owner.address.to_b58(),
        ticket_signer: ticket_signer.address.to_b58(),
        balances: vec![],
        validators: vec![],
        roles: vec![RoleGrant {
            role: Role::PoolMaintainer,
            account: owner.address.to_b58(),
        }],
    })
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
