//! Rebuilding a group's accumulator from the ledger, optionally starting
//! from a persisted snapshot.

use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

use super::core::Registrar;
use crate::accumulator::{AccumulatorVariant, GroupAccumulator};
use crate::crypto::{leaf_hash, to_hex};
use crate::error::{RegistrationError, Result};
use crate::traits::{Accumulator, Ledger};
use crate::types::{RebuildReport, RegistrationRecord, RegistrationStatus, Snapshot};

impl Registrar {
    /// Lock the group's slot. The first time this process touches the group,
    /// ledger records already present (from an earlier run) are replayed
    /// into the accumulator before the guard is handed out.
    pub(crate) async fn load_group(
        &self,
        group_id: &str,
    ) -> Result<OwnedMutexGuard<GroupAccumulator>> {
        let slot = self.registry.slot(group_id).await;
        let mut guard = slot.lock_owned().await;
        if guard.loaded {
            return Ok(guard);
        }

        let records = self.member_records(group_id).await?;
        if records.len() > guard.accumulator.len() {
            let mut accumulator = self.registry.create_accumulator();
            let replayed = replay_once(&mut accumulator, group_id, &records)?;
            guard.accumulator = accumulator;
            info!(
                "Loaded group {} from ledger: {} records replayed, root={}",
                group_id,
                replayed,
                to_hex(&guard.accumulator.root())
            );
        }
        guard.loaded = true;
        Ok(guard)
    }

    /// Rebuild the group's accumulator by replaying every verified ledger
    /// record in sequence order, then clear the diverged flag.
    pub async fn reconcile(&self, group_id: &str) -> Result<RebuildReport> {
        self.directory.require(group_id).await?;

        let slot = self.registry.slot(group_id).await;
        let mut guard = slot.lock().await;

        let records = self.member_records(group_id).await?;
        let mut accumulator = self.registry.create_accumulator();
        let replayed = replay_once(&mut accumulator, group_id, &records)?;

        let report = RebuildReport {
            group_id: group_id.to_string(),
            restored: 0,
            replayed,
            leaf_count: accumulator.len() as u64,
            root: to_hex(&accumulator.root()),
        };

        if guard.diverged {
            info!("Group {} reconciled, accepting registrations again", group_id);
        }
        guard.accumulator = accumulator;
        guard.diverged = false;
        guard.loaded = true;

        info!(
            "Reconciled group {}: {} leaves, root={}",
            group_id, report.leaf_count, report.root
        );
        Ok(report)
    }

    /// Load the snapshot `content_id`, check it against the ledger, replay
    /// the records that came after it and install the result.
    pub async fn restore(&self, group_id: &str, content_id: &str) -> Result<RebuildReport> {
        self.directory.require(group_id).await?;

        let snapshot = self.snapshotter.load(content_id).await?;
        if snapshot.group_id != group_id {
            return Err(RegistrationError::SnapshotMismatch {
                group_id: group_id.to_string(),
                reason: format!("snapshot belongs to group {}", snapshot.group_id),
            });
        }

        let slot = self.registry.slot(group_id).await;
        let mut guard = slot.lock().await;

        let mut accumulator = self.registry.create_accumulator();
        accumulator
            .restore(&snapshot)
            .map_err(|e| RegistrationError::SnapshotMismatch {
                group_id: group_id.to_string(),
                reason: format!("{e:#}"),
            })?;

        let records = self.member_records(group_id).await?;
        check_prefix_once(&snapshot, &records)?;

        let restored = snapshot.leaves.len();
        let replayed = replay_once(&mut accumulator, group_id, &records[restored..])?;

        let report = RebuildReport {
            group_id: group_id.to_string(),
            restored: restored as u64,
            replayed,
            leaf_count: accumulator.len() as u64,
            root: to_hex(&accumulator.root()),
        };

        guard.accumulator = accumulator;
        guard.diverged = false;
        guard.loaded = true;

        info!(
            "Restored group {} from snapshot {}: {} from snapshot, {} replayed, root={}",
            group_id, content_id, report.restored, report.replayed, report.root
        );
        Ok(report)
    }

    async fn member_records(&self, group_id: &str) -> Result<Vec<RegistrationRecord>> {
        let mut records = self.ledger.records(group_id).await.map_err(|e| {
            RegistrationError::infrastructure(
                format!("ledger scan failed for group {group_id}"),
                e,
            )
        })?;
        records.retain(|r| r.status == RegistrationStatus::Verified);
        records.sort_by_key(|r| r.sequence);
        Ok(records)
    }
}

/// The snapshot's leaves must be exactly the first ledger members.
pub fn check_prefix_once(snapshot: &Snapshot, records: &[RegistrationRecord]) -> Result<()> {
    let mismatch = |reason: String| RegistrationError::SnapshotMismatch {
        group_id: snapshot.group_id.clone(),
        reason,
    };

    if snapshot.leaves.len() > records.len() {
        return Err(mismatch(format!(
            "snapshot has {} leaves but the ledger holds {} records",
            snapshot.leaves.len(),
            records.len()
        )));
    }

    for (position, (leaf, record)) in snapshot.leaves.iter().zip(records).enumerate() {
        if *leaf != to_hex(&leaf_hash(&record.nullifier_hash)) {
            return Err(mismatch(format!(
                "leaf {} does not match ledger record {}",
                position, record.sequence
            )));
        }
    }
    Ok(())
}

/// Insert `records` in order; returns the number inserted.
pub fn replay_once(
    accumulator: &mut AccumulatorVariant,
    group_id: &str,
    records: &[RegistrationRecord],
) -> Result<u64> {
    for record in records {
        accumulator
            .insert(&record.nullifier_hash)
            .map_err(|e| {
                warn!(
                    "Replay stopped at record {} of group {}",
                    record.sequence, group_id
                );
                RegistrationError::infrastructure(
                    format!("replay failed for group {group_id}"),
                    e,
                )
            })?;
    }
    Ok(records.len() as u64)
}
