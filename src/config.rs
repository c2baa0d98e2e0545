use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// Accumulator implementation used for new groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AccumulatorType {
    Merkle,
    Mock,
}

/// Base configuration for the registrar.
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "nullsmith", version, about = "Proof-gated nullifier registration")]
pub struct BaseConfig {
    /// RocksDB ledger directory. In-memory ledger when unset.
    #[arg(long, env = "NULLSMITH_LEDGER_PATH")]
    pub ledger_path: Option<String>,

    /// Directory of the file blob store receiving snapshots.
    #[arg(long, env = "NULLSMITH_SNAPSHOT_DIR", default_value = "./snapshots")]
    pub snapshot_dir: String,

    /// Snapshot every time a group's leaf count reaches a multiple of this.
    #[arg(long, default_value_t = 100)]
    pub snapshot_batch_size: u64,

    /// Upper bound on a single proof verification.
    #[arg(long, default_value_t = 5000)]
    pub verifier_timeout_ms: u64,

    /// Retries after a failed snapshot write.
    #[arg(long, default_value_t = 3)]
    pub snapshot_max_retries: u32,

    /// Delay before the first snapshot retry; doubles per attempt.
    #[arg(long, default_value_t = 200)]
    pub snapshot_retry_initial_ms: u64,

    #[arg(long, value_enum, default_value_t = AccumulatorType::Merkle)]
    pub accumulator_type: AccumulatorType,

    /// JSON-lines file of submissions. Reads stdin when unset.
    #[arg(long)]
    pub input: Option<String>,
}

impl BaseConfig {
    pub fn verifier_timeout(&self) -> Duration {
        Duration::from_millis(self.verifier_timeout_ms)
    }
}

impl Default for BaseConfig {
    fn default() -> Self {
        BaseConfig {
            ledger_path: None,
            snapshot_dir: "./snapshots".to_string(),
            snapshot_batch_size: 100,
            verifier_timeout_ms: 5000,
            snapshot_max_retries: 3,
            snapshot_retry_initial_ms: 200,
            accumulator_type: AccumulatorType::Merkle,
            input: None,
        }
    }
}
