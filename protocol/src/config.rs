//! # Ledger Configuration & Constants
//!
//! Defaults shared by the node binary and the storage layer. Runtime
//! overrides come from CLI flags and environment variables in `asset-node`;
//! this module only holds the values those flags fall back to.

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Version of the contract interface exposed over the function-call boundary.
/// Bump when a function is added, removed, or changes its argument list.
pub const CONTRACT_VERSION: &str = "1.0.0";

/// Name the contract is registered under. Reported by `/health` and the CLI.
pub const CONTRACT_NAME: &str = "asset-registry";

// ---------------------------------------------------------------------------
// Invocation Context
// ---------------------------------------------------------------------------

/// Creator identity folded into every transaction ID when none is configured.
pub const DEFAULT_CREATOR: &str = "Org1MSP::admin";

/// Length of the random nonce mixed into each transaction ID, in bytes.
pub const TX_NONCE_LENGTH: usize = 24;

/// Minimum step between consecutive invocation timestamps, in microseconds.
///
/// When the wall clock has not moved since the previous submission (or has
/// gone backwards), the executor advances the timestamp by this amount so
/// that `updatedAt` strictly increases across mutations.
pub const TIMESTAMP_STEP_MICROS: i64 = 1;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Name of the sled tree holding the flat world-state keyspace.
pub const WORLD_STATE_TREE: &str = "world_state";

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "./ledger-data";

/// Subdirectory of the data directory where sled keeps its files.
pub const DB_SUBDIR: &str = "db";

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Default REST API port, used when neither `--port` nor `PORT` is set.
pub const DEFAULT_API_PORT: u16 = 8080;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9090;

/// Path prefix for all versioned REST routes.
pub const API_PREFIX: &str = "/api/v1";
