//! Periodic, best-effort persistence of accumulator snapshots.

use std::sync::Arc;

use kanal::{unbounded_async, AsyncReceiver, AsyncSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, span, Instrument, Level};

use crate::blob_store::BlobStoreVariant;
use crate::directory::GroupDirectory;
use crate::error::RegistrationError;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::traits::BlobStore;
use crate::types::{ContentId, Snapshot, SnapshotJob};

/// Snapshot cadence: every positive multiple of `batch_size` leaves.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPolicy {
    pub batch_size: u64,
}

impl SnapshotPolicy {
    pub fn new(batch_size: u64) -> Self {
        Self { batch_size }
    }

    pub fn is_due(&self, leaf_count: u64) -> bool {
        self.batch_size > 0 && leaf_count > 0 && leaf_count % self.batch_size == 0
    }
}

/// Writes snapshots to the blob store and records them on the directory.
pub struct Snapshotter {
    blob_store: Arc<BlobStoreVariant>,
    directory: Arc<GroupDirectory>,
    retry: RetryConfig,
}

impl Snapshotter {
    pub fn new(
        blob_store: Arc<BlobStoreVariant>,
        directory: Arc<GroupDirectory>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            blob_store,
            directory,
            retry,
        }
    }

    pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>, RegistrationError> {
        serde_json::to_vec(snapshot).map_err(|e| RegistrationError::Persistence(e.into()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Snapshot, RegistrationError> {
        serde_json::from_slice(bytes).map_err(|e| RegistrationError::Persistence(e.into()))
    }

    /// Persist one snapshot, retrying the blob store write with backoff.
    pub async fn persist_once(&self, job: &SnapshotJob) -> Result<ContentId, RegistrationError> {
        let bytes = Self::encode(&job.snapshot)?;

        let content_id = retry_with_backoff(&self.retry, || self.blob_store.put(&bytes))
            .await
            .map_err(RegistrationError::Persistence)?;

        self.directory
            .record_snapshot(
                &job.snapshot.group_id,
                &job.snapshot.root,
                &content_id,
                job.leaf_count,
            )
            .await?;

        info!(
            "Snapshot persisted: group={} leaves={} root={} id={}",
            job.snapshot.group_id, job.leaf_count, job.snapshot.root, content_id
        );
        Ok(content_id)
    }

    /// Fetch and decode a snapshot by content id.
    pub async fn load(&self, content_id: &str) -> Result<Snapshot, RegistrationError> {
        let bytes = self
            .blob_store
            .get(content_id)
            .await
            .map_err(RegistrationError::Persistence)?
            .ok_or_else(|| {
                RegistrationError::Persistence(anyhow::anyhow!(
                    "snapshot {} not found in {}",
                    content_id,
                    self.blob_store.name()
                ))
            })?;
        Self::decode(&bytes)
    }

    /// Spawn the worker that drains `rx` until every sender is dropped.
    pub fn spawn(self: Arc<Self>, rx: AsyncReceiver<SnapshotJob>) -> JoinHandle<()> {
        let span = span!(Level::INFO, "snapshot_task");
        tokio::spawn(
            async move {
                info!(
                    "Snapshot task started (blob_store={})",
                    self.blob_store.name()
                );

                while let Ok(job) = rx.recv().await {
                    debug!(
                        "Snapshot job received: group={} leaves={}",
                        job.snapshot.group_id, job.leaf_count
                    );
                    if let Err(e) = self.persist_once(&job).await {
                        error!(
                            "Failed to persist snapshot for group {} at {} leaves: {:#}",
                            job.snapshot.group_id, job.leaf_count, anyhow::Error::from(e)
                        );
                    }
                }

                info!("Snapshot task finished (channel closed)");
            }
            .instrument(span),
        )
    }
}

/// Queue feeding the snapshot worker.
pub fn snapshot_channel() -> (AsyncSender<SnapshotJob>, AsyncReceiver<SnapshotJob>) {
    unbounded_async::<SnapshotJob>()
}
