//! # CLI Interface
//!
//! Command-line structure for `asset-node` using `clap` derive. Every
//! option has an environment variable fallback.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use asset_ledger_protocol::config::{
    DEFAULT_API_PORT, DEFAULT_CREATOR, DEFAULT_DATA_DIR, DEFAULT_METRICS_PORT,
};

use crate::logging::LogFormat;

/// Asset ledger node.
///
/// Serves the asset registry over HTTP, or runs single contract functions
/// against a local data directory.
#[derive(Parser, Debug)]
#[command(
    name = "asset-node",
    about = "Asset ledger node",
    version,
    propagate_version = true
)]
pub struct AssetNodeCli {
    /// Log output format: pretty or json.
    #[arg(
        long,
        global = true,
        env = "ASSET_LEDGER_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node: REST API plus metrics endpoint.
    Run(RunArgs),
    /// Submit one contract function and print its JSON result.
    Invoke(CallArgs),
    /// Evaluate one read-only contract function and print its JSON result.
    Query(CallArgs),
    /// Print version information and exit.
    Version,
}

/// Options shared by every command that opens the ledger.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Directory holding the ledger database. Created if missing.
    #[arg(long, short = 'd', env = "ASSET_LEDGER_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Identity folded into generated transaction IDs.
    #[arg(long, env = "ASSET_LEDGER_CREATOR", default_value = DEFAULT_CREATOR)]
    pub creator: String,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Port for the REST API.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_API_PORT)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ASSET_LEDGER_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Seed the sample assets before serving. Skipped if any seed id
    /// already exists.
    #[arg(long)]
    pub init_ledger: bool,
}

/// Arguments for `invoke` and `query`.
#[derive(Args, Debug)]
pub struct CallArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,

    /// Contract function name, e.g. `CreateAsset` or `GetAssetHistory`.
    pub function: String,

    /// Positional string arguments for the function.
    pub args: Vec<String>,
}
