//! Submission pipeline: verify, dedupe, commit, accumulate, snapshot, refresh.
//!
//! Each step is a standalone "*_once" function so it can be tested without
//! a full registrar.

use std::time::Duration;

use kanal::AsyncSender;
use tracing::{debug, error, info, warn};

use super::core::Registrar;
use crate::accumulator::GroupAccumulator;
use crate::crypto::to_hex;
use crate::error::{RegistrationError, Result};
use crate::ledger::LedgerVariant;
use crate::snapshotter::SnapshotPolicy;
use crate::stats::StatsVariant;
use crate::traits::{Accumulator, Ledger, ProofVerifier, StatsAggregator};
use crate::types::{
    GroupStats, Hash256, NewRegistration, PublicSignals, RegistrationRecord, RegistrationStatus,
    SnapshotJob, SubmitReceipt,
};
use crate::verifier::VerifierVariant;

impl Registrar {
    /// Register `public_signals.nullifier_hash` in `group_id` if `proof`
    /// verifies and the nullifier is new to the group.
    pub async fn submit(
        &self,
        group_id: &str,
        proof: &[u8],
        public_signals: &PublicSignals,
    ) -> Result<SubmitReceipt> {
        let nullifier_hash = public_signals.nullifier_hash.as_str();

        self.directory.require_active(group_id).await?;

        if let Err(e) = verify_once(
            &self.verifier,
            self.config.verifier_timeout(),
            proof,
            public_signals,
        )
        .await
        {
            warn!(
                "Rejected nullifier {} for group {}: {}",
                nullifier_hash, group_id, e
            );
            return Err(e);
        }

        let (record, root, leaf_count) = {
            let mut guard = self.load_group(group_id).await?;
            if guard.diverged {
                return Err(RegistrationError::GroupDiverged(group_id.to_string()));
            }

            dedupe_once(&self.ledger, group_id, nullifier_hash).await?;
            let record = commit_once(&self.ledger, group_id, public_signals).await?;
            let root = accumulate_once(&mut guard, group_id, nullifier_hash)?;
            let leaf_count = guard.accumulator.len() as u64;

            queue_snapshot_once(&self.snapshot_tx, &self.policy, &guard, group_id).await;
            (record, root, leaf_count)
        };

        info!(
            "Registered nullifier {} in group {} (leaves={}, root={})",
            nullifier_hash,
            group_id,
            leaf_count,
            to_hex(&root)
        );

        let stats = refresh_once(&self.stats, group_id).await?;

        Ok(SubmitReceipt {
            success: true,
            external_reference: record.external_reference,
            root: to_hex(&root),
            leaf_count,
            stats,
        })
    }

    /// Run the verifier alone, with the same timeout as `submit`. No effects.
    pub async fn verify_only(&self, proof: &[u8], public_signals: &PublicSignals) -> bool {
        match verify_once(
            &self.verifier,
            self.config.verifier_timeout(),
            proof,
            public_signals,
        )
        .await
        {
            Ok(()) => true,
            Err(e) => {
                debug!("verify_only: {}", e);
                false
            }
        }
    }
}

/// Verify a proof within `timeout`. Rejection, fault and timeout are all
/// `ProofVerification`.
pub async fn verify_once(
    verifier: &VerifierVariant,
    timeout: Duration,
    proof: &[u8],
    public_signals: &PublicSignals,
) -> Result<()> {
    match tokio::time::timeout(timeout, verifier.verify(proof, public_signals)).await {
        Ok(Ok(true)) => Ok(()),
        Ok(Ok(false)) => Err(RegistrationError::ProofVerification(format!(
            "proof rejected by {}",
            verifier.name()
        ))),
        Ok(Err(e)) => Err(RegistrationError::ProofVerification(format!(
            "{} fault: {:#}",
            verifier.name(),
            e
        ))),
        Err(_) => Err(RegistrationError::ProofVerification(format!(
            "{} timed out after {:?}",
            verifier.name(),
            timeout
        ))),
    }
}

/// Fail with `DuplicateNullifier` when the ledger already holds the nullifier.
pub async fn dedupe_once(
    ledger: &LedgerVariant,
    group_id: &str,
    nullifier_hash: &str,
) -> Result<()> {
    let existing = ledger
        .find_by_nullifier(group_id, nullifier_hash)
        .await
        .map_err(|e| {
            RegistrationError::infrastructure(
                format!("ledger lookup failed for group {group_id}"),
                e,
            )
        })?;

    if let Some(record) = existing {
        warn!(
            "Duplicate nullifier {} for group {} (seq={})",
            nullifier_hash, group_id, record.sequence
        );
        return Err(RegistrationError::DuplicateNullifier {
            group_id: group_id.to_string(),
            nullifier_hash: nullifier_hash.to_string(),
        });
    }
    Ok(())
}

/// Append a verified registration to the ledger.
pub async fn commit_once(
    ledger: &LedgerVariant,
    group_id: &str,
    public_signals: &PublicSignals,
) -> Result<RegistrationRecord> {
    let registration = NewRegistration {
        nullifier_hash: public_signals.nullifier_hash.clone(),
        category_codes: public_signals.category_codes.clone(),
        timestamp: public_signals.timestamp,
        status: RegistrationStatus::Verified,
    };

    let record = ledger.append(group_id, registration).await.map_err(|e| {
        RegistrationError::infrastructure(
            format!("ledger append failed for group {group_id}"),
            e,
        )
    })?;

    debug!(
        "Ledger record {} for group {} (ref={})",
        record.sequence, group_id, record.external_reference
    );
    Ok(record)
}

/// Insert into the accumulator. Runs only after the ledger commit, so a
/// failure here leaves the group diverged until reconciled.
pub fn accumulate_once(
    slot: &mut GroupAccumulator,
    group_id: &str,
    nullifier_hash: &str,
) -> Result<Hash256> {
    match slot.accumulator.insert(nullifier_hash) {
        Ok(root) => Ok(root),
        Err(e) => {
            slot.diverged = true;
            error!(
                "Accumulator insert failed after ledger commit: group={} nullifier={}: {:#}",
                group_id, nullifier_hash, e
            );
            Err(RegistrationError::ConsistencyRisk {
                group_id: group_id.to_string(),
                nullifier_hash: nullifier_hash.to_string(),
                source: e,
            })
        }
    }
}

/// Capture and enqueue a snapshot when the leaf count hits the batch
/// cadence. Never fails the caller.
pub async fn queue_snapshot_once(
    snapshot_tx: &AsyncSender<SnapshotJob>,
    policy: &SnapshotPolicy,
    slot: &GroupAccumulator,
    group_id: &str,
) -> bool {
    let leaf_count = slot.accumulator.len() as u64;
    if !policy.is_due(leaf_count) {
        return false;
    }

    let job = SnapshotJob {
        snapshot: slot.accumulator.snapshot(group_id),
        leaf_count,
    };
    match snapshot_tx.send(job).await {
        Ok(()) => {
            debug!("Snapshot queued: group={} leaves={}", group_id, leaf_count);
            true
        }
        Err(e) => {
            let err = RegistrationError::Persistence(anyhow::anyhow!(
                "snapshot queue closed: {}",
                e
            ));
            error!(
                "Snapshot for group {} at {} leaves dropped: {}",
                group_id, leaf_count, err
            );
            false
        }
    }
}

pub async fn refresh_once(stats: &StatsVariant, group_id: &str) -> Result<GroupStats> {
    stats.refresh(group_id).await.map_err(|e| {
        RegistrationError::infrastructure(
            format!("stats refresh failed for group {group_id}"),
            e,
        )
    })
}
