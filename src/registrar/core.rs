//! Registrar struct, wiring and read-side operations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use kanal::AsyncSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::accumulator::AccumulatorRegistry;
use crate::blob_store::{BlobStoreVariant, FileBlobStore};
use crate::config::BaseConfig;
use crate::crypto::to_hex;
use crate::directory::{GroupDirectory, GroupMetadata};
use crate::error::{RegistrationError, Result as RegistrationResult};
use crate::ledger::{LedgerVariant, MemoryLedger, RocksDbLedger};
use crate::retry::RetryConfig;
use crate::snapshotter::{snapshot_channel, SnapshotPolicy, Snapshotter};
use crate::stats::{LedgerStats, StatsVariant};
use crate::traits::{Accumulator, BlobStore, Ledger, ProofVerifier, StatsAggregator};
use crate::types::{GroupStats, InclusionProof, SnapshotJob};
use crate::verifier::{NoopVerifier, VerifierVariant};

/// Proof-gated registration of nullifiers into per-group accumulators.
pub struct Registrar {
    /// Global/base configuration.
    pub config: BaseConfig,

    /// Groups known to this process.
    pub(crate) directory: Arc<GroupDirectory>,

    /// Accumulator per group, each behind its own write lock.
    pub(crate) registry: AccumulatorRegistry,

    pub(crate) verifier: VerifierVariant,

    /// Source of truth for used nullifiers.
    pub(crate) ledger: Arc<LedgerVariant>,

    pub(crate) stats: StatsVariant,

    pub(crate) snapshotter: Arc<Snapshotter>,

    pub(crate) policy: SnapshotPolicy,

    pub(crate) snapshot_tx: AsyncSender<SnapshotJob>,

    snapshot_worker: JoinHandle<()>,
}

impl Registrar {
    /// Wire a registrar from its parts and start the snapshot worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        config: BaseConfig,
        registry: AccumulatorRegistry,
        verifier: VerifierVariant,
        ledger: Arc<LedgerVariant>,
        stats: StatsVariant,
        blob_store: BlobStoreVariant,
    ) -> Self {
        let directory = Arc::new(GroupDirectory::new());
        let retry = RetryConfig::default()
            .with_max_retries(config.snapshot_max_retries)
            .with_initial_delay(std::time::Duration::from_millis(
                config.snapshot_retry_initial_ms,
            ));
        let snapshotter = Arc::new(Snapshotter::new(
            Arc::new(blob_store),
            Arc::clone(&directory),
            retry,
        ));

        let (snapshot_tx, snapshot_rx) = snapshot_channel();
        let snapshot_worker = Arc::clone(&snapshotter).spawn(snapshot_rx);

        info!(
            "Registrar ready: verifier={} ledger={} stats={} batch_size={}",
            verifier.name(),
            ledger.name(),
            stats.name(),
            config.snapshot_batch_size
        );

        Self {
            policy: SnapshotPolicy::new(config.snapshot_batch_size),
            config,
            directory,
            registry,
            verifier,
            ledger,
            stats,
            snapshotter,
            snapshot_tx,
            snapshot_worker,
        }
    }

    /// Build the production wiring described by `config`.
    pub async fn initialize(config: BaseConfig) -> Result<Self> {
        let ledger = match &config.ledger_path {
            Some(path) => {
                info!("Ledger opened at: {}", path);
                LedgerVariant::RocksDb(RocksDbLedger::open(path)?)
            }
            None => {
                info!("No ledger path configured, using in-memory ledger");
                LedgerVariant::Memory(MemoryLedger::new())
            }
        };
        let ledger = Arc::new(ledger);

        let mut blob_store =
            BlobStoreVariant::File(FileBlobStore::new(PathBuf::from(&config.snapshot_dir)));
        blob_store.open().await?;

        let registry = AccumulatorRegistry::new(config.accumulator_type);
        let verifier = VerifierVariant::Noop(NoopVerifier);
        let stats = StatsVariant::Ledger(LedgerStats::new(Arc::clone(&ledger)));

        Ok(Self::new(config, registry, verifier, ledger, stats, blob_store))
    }

    /// Stop accepting snapshot jobs and wait for queued ones to finish.
    pub async fn shutdown(self) -> Result<()> {
        let Registrar {
            snapshot_tx,
            snapshot_worker,
            ..
        } = self;
        drop(snapshot_tx);

        snapshot_worker
            .await
            .map_err(|_| anyhow::anyhow!("Snapshot task panicked"))?;

        info!("Registrar shutdown complete");
        Ok(())
    }

    pub fn directory(&self) -> &GroupDirectory {
        &self.directory
    }

    pub fn ledger(&self) -> &LedgerVariant {
        &self.ledger
    }

    // ==================== GROUPS ====================

    pub async fn create_group(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> RegistrationResult<GroupMetadata> {
        self.directory.create(id, name, description).await
    }

    /// Stop accepting registrations; proofs and roots stay available.
    pub async fn close_group(&self, id: &str) -> RegistrationResult<()> {
        self.directory.close(id).await
    }

    pub async fn group(&self, id: &str) -> RegistrationResult<GroupMetadata> {
        self.directory.require(id).await
    }

    pub async fn groups(&self) -> Vec<GroupMetadata> {
        self.directory.list().await
    }

    // ==================== QUERIES ====================

    /// Current root as lowercase hex; `hash("")` while the group has no members.
    pub async fn root(&self, group_id: &str) -> RegistrationResult<String> {
        self.directory.require(group_id).await?;

        let guard = self.load_group(group_id).await?;
        Ok(to_hex(&guard.accumulator.root()))
    }

    /// Number of leaves in the group's accumulator.
    pub async fn leaf_count(&self, group_id: &str) -> RegistrationResult<u64> {
        self.directory.require(group_id).await?;

        let guard = self.load_group(group_id).await?;
        Ok(guard.accumulator.len() as u64)
    }

    /// Inclusion proof for `nullifier_hash` against the current root.
    pub async fn inclusion_proof(
        &self,
        group_id: &str,
        nullifier_hash: &str,
    ) -> RegistrationResult<InclusionProof> {
        self.directory.require(group_id).await?;

        let not_found = || RegistrationError::LeafNotFound {
            group_id: group_id.to_string(),
            nullifier_hash: nullifier_hash.to_string(),
        };

        let guard = self.load_group(group_id).await?;
        let proof = guard
            .accumulator
            .prove(nullifier_hash)
            .map_err(|e| {
                RegistrationError::infrastructure(
                    format!("proof generation failed for group {group_id}"),
                    e,
                )
            })?
            .ok_or_else(not_found)?;

        debug!(
            "Inclusion proof for {} in group {}: depth={}",
            nullifier_hash,
            group_id,
            proof.siblings.len()
        );
        Ok(proof)
    }

    /// Whether the ledger holds a record for `nullifier_hash`.
    pub async fn is_registered(
        &self,
        group_id: &str,
        nullifier_hash: &str,
    ) -> RegistrationResult<bool> {
        self.directory.require(group_id).await?;

        let record = self
            .ledger
            .find_by_nullifier(group_id, nullifier_hash)
            .await
            .map_err(|e| {
                RegistrationError::infrastructure(
                    format!("ledger lookup failed for group {group_id}"),
                    e,
                )
            })?;
        Ok(record.is_some())
    }

    pub async fn stats(&self, group_id: &str) -> RegistrationResult<GroupStats> {
        self.directory.require(group_id).await?;

        super::pipeline::refresh_once(&self.stats, group_id).await
    }
}
