// Copyright (c) 2026 Asset Ledger Contributors. MIT License.
// See LICENSE for details.

//! # Asset Ledger Node
//!
//! Entry point for the `asset-node` binary. Parses CLI arguments,
//! initializes logging, opens the ledger, and either serves the REST API or
//! runs a single contract function.
//!
//! - `run`: serve the REST API and the metrics endpoint
//! - `invoke`: submit one contract function and print the result
//! - `query`: evaluate one read-only contract function
//! - `version`: print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use asset_ledger_contracts::{AssetContract, AssetError, Function};
use asset_ledger_protocol::config::{CONTRACT_NAME, CONTRACT_VERSION, DB_SUBDIR};
use asset_ledger_protocol::{Ledger, SledStore};

use cli::{AssetNodeCli, CallArgs, Commands, LedgerArgs};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = AssetNodeCli::parse();

    match cli.command {
        Commands::Version => {
            print_version();
            Ok(())
        }
        command => {
            logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);
            match command {
                Commands::Run(args) => run_node(args).await,
                Commands::Invoke(args) => invoke(args),
                Commands::Query(args) => query(args),
                Commands::Version => Ok(()),
            }
        }
    }
}

/// Opens (creating if needed) the sled-backed ledger under the data directory.
fn open_ledger(args: &LedgerArgs) -> Result<Ledger<SledStore>> {
    let db_path = args.data_dir.join(DB_SUBDIR);
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let store = SledStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    let ledger = Ledger::with_creator(store, args.creator.clone());

    let latest = ledger
        .evaluate(|inv| AssetContract::new().latest_timestamp(inv))
        .context("failed to read latest ledger timestamp")?;
    if let Some(ts) = latest {
        ledger.resume_after(ts);
    }
    tracing::info!(
        path = %db_path.display(),
        creator = %args.creator,
        latest = ?latest,
        "ledger opened"
    );
    Ok(ledger)
}

/// Serves the REST API and the metrics endpoint until shutdown.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        data_dir = %args.ledger.data_dir.display(),
        "starting asset-node"
    );

    let ledger = Arc::new(open_ledger(&args.ledger)?);
    let contract = AssetContract::new();

    if args.init_ledger {
        seed_ledger(&ledger, contract)?;
    }

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to create metrics registry")?);
    let live = ledger
        .evaluate(|inv| contract.get_asset_count(inv))
        .context("failed to count assets")?;
    node_metrics.live_assets.set(live as i64);
    tracing::info!(live_assets = live, "ledger ready");

    // --- API server ---
    let app_state = api::AppState::new(Arc::clone(&ledger), Arc::clone(&node_metrics));
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    let api_server = axum::serve(api_listener, api_router).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("shutdown signal received, draining connections");
    });
    tokio::select! {
        res = api_server => res.context("API server error")?,
        res = axum::serve(metrics_listener, metrics_router) => res.context("metrics server error")?,
    }

    ledger.store().flush().context("failed to flush ledger")?;
    tracing::info!("asset-node stopped");
    Ok(())
}

/// Seeds the sample assets, leaving an already seeded ledger alone.
fn seed_ledger(ledger: &Ledger<SledStore>, contract: AssetContract) -> Result<()> {
    match ledger.submit(|inv| contract.init_ledger(inv)) {
        Ok(receipt) => {
            tracing::info!(tx_id = %receipt.tx_id, assets = receipt.result, "ledger seeded");
            Ok(())
        }
        Err(AssetError::AlreadyExists(id)) => {
            tracing::info!(existing = %id, "ledger already seeded; skipping init");
            Ok(())
        }
        Err(e) => Err(e).context("failed to seed ledger"),
    }
}

/// `invoke`: submit one function and print `{txId, timestamp, result}`.
fn invoke(args: CallArgs) -> Result<()> {
    let function: Function = args.function.parse()?;
    if function.is_read_only() {
        tracing::warn!(%function, "read-only function submitted; consider `query`");
    }

    let ledger = open_ledger(&args.ledger)?;
    let contract = AssetContract::new();
    let receipt = ledger
        .submit(|inv| contract.call(inv, function, args.args.as_slice()))
        .with_context(|| format!("{function} failed"))?;
    ledger.store().flush().context("failed to flush ledger")?;

    let out = serde_json::json!({
        "txId": receipt.tx_id,
        "timestamp": receipt.timestamp,
        "result": receipt.result,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// `query`: evaluate one read-only function and print its result.
fn query(args: CallArgs) -> Result<()> {
    let function: Function = args.function.parse()?;
    if !function.is_read_only() {
        bail!("{function} modifies the ledger; use `invoke` instead");
    }

    let ledger = open_ledger(&args.ledger)?;
    let contract = AssetContract::new();
    let result = ledger
        .evaluate(|inv| contract.call(inv, function, args.args.as_slice()))
        .with_context(|| format!("{function} failed"))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("asset-node {}", env!("CARGO_PKG_VERSION"));
    println!("contract   {} {}", CONTRACT_NAME, CONTRACT_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed that signal is simply never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
