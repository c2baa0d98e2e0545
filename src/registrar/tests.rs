//! Unit tests for the registration pipeline.
//!
//! Step functions are tested directly; the end-to-end paths go through a
//! registrar wired to in-memory components whose handles the tests keep.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use kanal::unbounded_async;

use super::pipeline;
use super::recovery;
use super::Registrar;
use crate::accumulator::{
    AccumulatorRegistry, AccumulatorVariant, GroupAccumulator, MerkleAccumulator,
    MockAccumulator,
};
use crate::blob_store::{BlobStoreVariant, MemoryBlobStore};
use crate::config::{AccumulatorType, BaseConfig};
use crate::crypto::{empty_root, leaf_hash, to_hex};
use crate::error::RegistrationError;
use crate::ledger::{LedgerVariant, MemoryLedger};
use crate::snapshotter::{SnapshotPolicy, Snapshotter};
use crate::stats::{LedgerStats, MockStats, StatsVariant};
use crate::traits::{Accumulator, BlobStore, Ledger};
use crate::types::{PublicSignals, RegistrationRecord, RegistrationStatus, Snapshot};
use crate::verifier::{MockVerdict, MockVerifier, VerifierVariant};

// ==================== TEST HELPERS ====================

struct Harness {
    registrar: Registrar,
    ledger: MemoryLedger,
    verifier: MockVerifier,
    blobs: MemoryBlobStore,
    fail_inserts: Arc<AtomicBool>,
}

fn test_config(batch_size: u64) -> BaseConfig {
    BaseConfig {
        snapshot_batch_size: batch_size,
        verifier_timeout_ms: 200,
        snapshot_max_retries: 1,
        snapshot_retry_initial_ms: 1,
        ..Default::default()
    }
}

fn harness_with(batch_size: u64, stats: Option<MockStats>) -> Harness {
    let ledger = MemoryLedger::new();
    let verifier = MockVerifier::accepting();
    let blobs = MemoryBlobStore::new();
    let fail_inserts = Arc::new(AtomicBool::new(false));
    let insert_calls = Arc::new(AtomicUsize::new(0));

    let switch = Arc::clone(&fail_inserts);
    let registry = AccumulatorRegistry::with_factory(Arc::new(move || {
        AccumulatorVariant::Mock(MockAccumulator::with_switch(
            Arc::clone(&switch),
            Arc::clone(&insert_calls),
        ))
    }));

    let shared_ledger = Arc::new(LedgerVariant::Memory(ledger.clone()));
    let stats = match stats {
        Some(mock) => StatsVariant::Mock(mock),
        None => StatsVariant::Ledger(LedgerStats::new(Arc::clone(&shared_ledger))),
    };

    let registrar = Registrar::new(
        test_config(batch_size),
        registry,
        VerifierVariant::Mock(verifier.clone()),
        shared_ledger,
        stats,
        BlobStoreVariant::Memory(blobs.clone()),
    );

    Harness {
        registrar,
        ledger,
        verifier,
        blobs,
        fail_inserts,
    }
}

fn harness() -> Harness {
    harness_with(100, None)
}

fn signals(nullifier: &str) -> PublicSignals {
    PublicSignals {
        nullifier_hash: nullifier.to_string(),
        category_codes: vec![1, 2],
        timestamp: 1_700_000_000,
    }
}

fn record(seq: u64, nullifier: &str) -> RegistrationRecord {
    RegistrationRecord {
        group_id: "g1".into(),
        sequence: seq,
        nullifier_hash: nullifier.into(),
        category_codes: vec![],
        timestamp: 0,
        external_reference: format!("ref-{seq}"),
        status: RegistrationStatus::Verified,
        created_at: 0,
    }
}

/// Registrar with a real Merkle accumulator over an existing ledger, as a
/// restarted process would see it.
fn registrar_over(ledger: &MemoryLedger, blobs: &MemoryBlobStore, batch_size: u64) -> Registrar {
    let shared_ledger = Arc::new(LedgerVariant::Memory(ledger.clone()));
    Registrar::new(
        test_config(batch_size),
        AccumulatorRegistry::new(AccumulatorType::Merkle),
        VerifierVariant::Mock(MockVerifier::accepting()),
        Arc::clone(&shared_ledger),
        StatsVariant::Ledger(LedgerStats::new(shared_ledger)),
        BlobStoreVariant::Memory(blobs.clone()),
    )
}

/// Poll until the snapshot worker has stored `n` blobs.
async fn wait_for_puts(blobs: &MemoryBlobStore, n: usize) {
    for _ in 0..200 {
        if blobs.put_log().len() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("snapshot worker stored {} of {} blobs", blobs.put_log().len(), n);
}

// ==================== TESTS: verify_once ====================

#[tokio::test]
async fn test_verify_once_outcomes() -> Result<()> {
    let mock = MockVerifier::accepting();
    let verifier = VerifierVariant::Mock(mock.clone());
    let timeout = Duration::from_millis(50);

    pipeline::verify_once(&verifier, timeout, b"proof", &signals("n1")).await?;

    mock.set_verdict(MockVerdict::Reject);
    let err = pipeline::verify_once(&verifier, timeout, b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::ProofVerification(_)));

    mock.set_verdict(MockVerdict::Fault);
    let err = pipeline::verify_once(&verifier, timeout, b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("fault"));

    mock.set_verdict(MockVerdict::Hang);
    let err = pipeline::verify_once(&verifier, timeout, b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"));

    assert_eq!(mock.call_count(), 4);
    Ok(())
}

// ==================== TESTS: dedupe_once / commit_once ====================

#[tokio::test]
async fn test_dedupe_then_commit() -> Result<()> {
    let ledger = LedgerVariant::Memory(MemoryLedger::new());

    pipeline::dedupe_once(&ledger, "g1", "n1").await?;
    let record = pipeline::commit_once(&ledger, "g1", &signals("n1")).await?;
    assert_eq!(record.sequence, 0);
    assert_eq!(record.status, RegistrationStatus::Verified);
    assert_eq!(record.category_codes, vec![1, 2]);
    assert!(!record.external_reference.is_empty());

    let err = pipeline::dedupe_once(&ledger, "g1", "n1").await.unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateNullifier { .. }));

    // Namespaces are per group.
    pipeline::dedupe_once(&ledger, "g2", "n1").await?;
    Ok(())
}

#[tokio::test]
async fn test_dedupe_lookup_fault_is_infrastructure() -> Result<()> {
    let memory = MemoryLedger::new();
    memory.fail_lookups.store(true, Ordering::SeqCst);
    let ledger = LedgerVariant::Memory(memory);

    let err = pipeline::dedupe_once(&ledger, "g1", "n1").await.unwrap_err();
    assert!(matches!(err, RegistrationError::Infrastructure { .. }));
    assert!(err.to_string().contains("g1"));
    Ok(())
}

// ==================== TESTS: accumulate_once ====================

#[test]
fn test_accumulate_once_marks_divergence() {
    let fail = Arc::new(AtomicBool::new(true));
    let mut slot = GroupAccumulator {
        accumulator: AccumulatorVariant::Mock(MockAccumulator::with_switch(
            Arc::clone(&fail),
            Arc::new(AtomicUsize::new(0)),
        )),
        diverged: false,
        loaded: true,
    };

    let err = pipeline::accumulate_once(&mut slot, "g1", "n1").unwrap_err();
    assert!(matches!(err, RegistrationError::ConsistencyRisk { .. }));
    assert!(slot.diverged);
    assert_eq!(slot.accumulator.len(), 0);
}

// ==================== TESTS: queue_snapshot_once ====================

#[tokio::test]
async fn test_queue_snapshot_once_only_at_multiples() -> Result<()> {
    let (tx, rx) = unbounded_async();
    let policy = SnapshotPolicy::new(2);
    let mut slot = GroupAccumulator {
        accumulator: AccumulatorVariant::Merkle(MerkleAccumulator::new()),
        diverged: false,
        loaded: true,
    };

    slot.accumulator.insert("a")?;
    assert!(!pipeline::queue_snapshot_once(&tx, &policy, &slot, "g1").await);
    slot.accumulator.insert("b")?;
    assert!(pipeline::queue_snapshot_once(&tx, &policy, &slot, "g1").await);
    slot.accumulator.insert("c")?;
    assert!(!pipeline::queue_snapshot_once(&tx, &policy, &slot, "g1").await);

    let job = rx.try_recv()?.expect("one job queued");
    assert_eq!(job.leaf_count, 2);
    assert_eq!(job.snapshot.leaves.len(), 2);
    assert!(rx.try_recv()?.is_none());

    // A closed queue drops the job without failing.
    drop(rx);
    slot.accumulator.insert("d")?;
    assert!(!pipeline::queue_snapshot_once(&tx, &policy, &slot, "g1").await);
    Ok(())
}

// ==================== TESTS: recovery helpers ====================

#[test]
fn test_check_prefix_once() {
    let records = vec![record(0, "a"), record(1, "b"), record(2, "c")];
    let snapshot = |leaves: &[&str]| Snapshot {
        group_id: "g1".into(),
        leaves: leaves.iter().map(|n| to_hex(&leaf_hash(n))).collect(),
        root: String::new(),
    };

    assert!(recovery::check_prefix_once(&snapshot(&[]), &records).is_ok());
    assert!(recovery::check_prefix_once(&snapshot(&["a", "b"]), &records).is_ok());
    assert!(matches!(
        recovery::check_prefix_once(&snapshot(&["a", "c"]), &records),
        Err(RegistrationError::SnapshotMismatch { .. })
    ));
    assert!(matches!(
        recovery::check_prefix_once(&snapshot(&["a", "b", "c", "d"]), &records),
        Err(RegistrationError::SnapshotMismatch { .. })
    ));
}

#[test]
fn test_replay_once_matches_direct_inserts() -> Result<()> {
    let records = vec![record(0, "a"), record(1, "b"), record(2, "c")];
    let mut replayed = AccumulatorVariant::Merkle(MerkleAccumulator::new());
    assert_eq!(recovery::replay_once(&mut replayed, "g1", &records)?, 3);

    let mut direct = MerkleAccumulator::new();
    for n in ["a", "b", "c"] {
        direct.insert(n)?;
    }
    assert_eq!(replayed.root(), direct.root());
    Ok(())
}

// ==================== TESTS: submit ====================

#[tokio::test]
async fn test_submit_success() -> Result<()> {
    let h = harness();
    h.registrar.create_group("g1", "Census", "").await?;

    let receipt = h.registrar.submit("g1", b"proof", &signals("n1")).await?;
    assert!(receipt.success);
    assert_eq!(receipt.leaf_count, 1);
    assert_eq!(receipt.root, to_hex(&leaf_hash("n1")));
    assert_eq!(receipt.stats.total_members, 1);
    assert_eq!(receipt.stats.distributions[0].get(&1), Some(&1));

    let stored = h.ledger.find_by_nullifier("g1", "n1").await?.expect("record");
    assert_eq!(stored.external_reference, receipt.external_reference);
    assert!(h.registrar.is_registered("g1", "n1").await?);
    assert!(!h.registrar.is_registered("g1", "n2").await?);

    h.registrar.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_submit_duplicate_leaves_state_unchanged() -> Result<()> {
    let h = harness();
    h.registrar.create_group("g1", "Census", "").await?;
    h.registrar.submit("g1", b"proof", &signals("n1")).await?;
    let root_before = h.registrar.root("g1").await?;

    let err = h
        .registrar
        .submit("g1", b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateNullifier { .. }));
    assert_eq!(h.registrar.root("g1").await?, root_before);
    assert_eq!(h.registrar.leaf_count("g1").await?, 1);
    assert_eq!(h.ledger.total(), 1);
    Ok(())
}

#[tokio::test]
async fn test_submit_invalid_proof_has_no_effects() -> Result<()> {
    let h = harness();
    h.registrar.create_group("g1", "Census", "").await?;
    h.verifier.reject_nullifier("bad");

    let err = h
        .registrar
        .submit("g1", b"proof", &signals("bad"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::ProofVerification(_)));
    assert_eq!(h.ledger.total(), 0);
    assert_eq!(h.registrar.root("g1").await?, to_hex(&empty_root()));
    assert!(!h.registrar.verify_only(b"proof", &signals("bad")).await);
    assert!(h.registrar.verify_only(b"proof", &signals("good")).await);
    Ok(())
}

#[tokio::test]
async fn test_submit_requires_open_group() -> Result<()> {
    let h = harness();

    let err = h
        .registrar
        .submit("missing", b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::GroupNotFound(_)));

    h.registrar.create_group("g1", "Census", "").await?;
    h.registrar.submit("g1", b"proof", &signals("n1")).await?;
    h.registrar.close_group("g1").await?;

    let err = h
        .registrar
        .submit("g1", b"proof", &signals("n2"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::GroupClosed(_)));
    // Closed groups still answer proofs.
    let proof = h.registrar.inclusion_proof("g1", "n1").await?;
    assert!(proof.verify()?);
    assert_eq!(h.verifier.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_ledger_append_fault_leaves_accumulator_untouched() -> Result<()> {
    let h = harness();
    h.registrar.create_group("g1", "Census", "").await?;
    h.ledger.fail_appends.store(true, Ordering::SeqCst);

    let err = h
        .registrar
        .submit("g1", b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Infrastructure { .. }));
    assert_eq!(h.registrar.leaf_count("g1").await?, 0);

    h.ledger.fail_appends.store(false, Ordering::SeqCst);
    h.registrar.submit("g1", b"proof", &signals("n1")).await?;
    assert_eq!(h.registrar.leaf_count("g1").await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_stats_failure_surfaces_after_commit() -> Result<()> {
    let stats = MockStats::new();
    stats.fail.store(true, Ordering::SeqCst);
    let h = harness_with(100, Some(stats.clone()));
    h.registrar.create_group("g1", "Census", "").await?;

    let err = h
        .registrar
        .submit("g1", b"proof", &signals("n1"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Infrastructure { .. }));
    assert!(err.to_string().contains("stats"));
    // The registration itself is durable.
    assert!(h.registrar.is_registered("g1", "n1").await?);
    assert_eq!(h.registrar.leaf_count("g1").await?, 1);
    assert_eq!(stats.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

// ==================== TESTS: divergence ====================

#[tokio::test]
async fn test_consistency_risk_blocks_group_until_reconcile() -> Result<()> {
    let h = harness();
    h.registrar.create_group("g1", "Census", "").await?;
    h.registrar.create_group("g2", "Other", "").await?;
    h.registrar.submit("g1", b"proof", &signals("n1")).await?;

    h.fail_inserts.store(true, Ordering::SeqCst);
    let err = h
        .registrar
        .submit("g1", b"proof", &signals("n2"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::ConsistencyRisk { .. }));
    assert!(h.registrar.is_registered("g1", "n2").await?);
    h.fail_inserts.store(false, Ordering::SeqCst);

    let err = h
        .registrar
        .submit("g1", b"proof", &signals("n3"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::GroupDiverged(_)));
    // Other groups are unaffected.
    h.registrar.submit("g2", b"proof", &signals("n3")).await?;

    let report = h.registrar.reconcile("g1").await?;
    assert_eq!(report.replayed, 2);
    assert_eq!(report.leaf_count, 2);
    assert_eq!(report.root, h.registrar.root("g1").await?);
    assert!(h.registrar.inclusion_proof("g1", "n2").await?.verify()?);

    h.registrar.submit("g1", b"proof", &signals("n3")).await?;
    assert_eq!(h.registrar.leaf_count("g1").await?, 3);
    Ok(())
}

// ==================== TESTS: restart ====================

#[tokio::test]
async fn test_restart_replays_ledger_before_first_insert() -> Result<()> {
    println!("\n=== Restart: existing ledger records are loaded before submit ===\n");

    let ledger = MemoryLedger::new();
    let blobs = MemoryBlobStore::new();

    let first = registrar_over(&ledger, &blobs, 100);
    first.create_group("g", "Census", "").await?;
    for n in ["n0", "n1", "n2"] {
        first.submit("g", b"proof", &signals(n)).await?;
    }
    first.shutdown().await?;

    let second = registrar_over(&ledger, &blobs, 100);
    second.create_group("g", "Census", "").await?;
    let receipt = second.submit("g", b"proof", &signals("n3")).await?;

    assert_eq!(receipt.leaf_count, 4);
    assert_eq!(receipt.leaf_count, ledger.count("g").await?);
    assert_eq!(receipt.stats.total_members, 4);

    let mut expected = MerkleAccumulator::new();
    for n in ["n0", "n1", "n2", "n3"] {
        expected.insert(n)?;
    }
    assert_eq!(receipt.root, to_hex(&expected.root()));

    // Members from the earlier run still prove against the new root.
    for n in ["n0", "n1", "n2"] {
        assert!(second.is_registered("g", n).await?);
        let proof = second.inclusion_proof("g", n).await?;
        assert_eq!(proof.root, receipt.root);
        assert!(proof.verify()?);
    }

    second.shutdown().await?;
    println!("✓ root after restart covers all 4 members");
    Ok(())
}

#[tokio::test]
async fn test_restart_queries_see_ledger_members() -> Result<()> {
    let ledger = MemoryLedger::new();
    let blobs = MemoryBlobStore::new();

    let first = registrar_over(&ledger, &blobs, 100);
    first.create_group("g", "Census", "").await?;
    for n in ["a", "b", "c", "d", "e"] {
        first.submit("g", b"proof", &signals(n)).await?;
    }
    let root_before = first.root("g").await?;
    first.shutdown().await?;

    let second = registrar_over(&ledger, &blobs, 100);
    second.create_group("g", "Census", "").await?;
    assert_eq!(second.root("g").await?, root_before);
    assert_eq!(second.leaf_count("g").await?, 5);
    assert!(second.inclusion_proof("g", "c").await?.verify()?);

    // Replay happens once; a later duplicate is still caught by the ledger.
    let err = second
        .submit("g", b"proof", &signals("a"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::DuplicateNullifier { .. }));
    assert_eq!(second.leaf_count("g").await?, 5);
    Ok(())
}

// ==================== TESTS: snapshots ====================

#[tokio::test]
async fn test_failed_snapshot_does_not_fail_registration() -> Result<()> {
    let h = harness_with(2, None);
    h.registrar.create_group("g1", "Census", "").await?;
    // One initial attempt plus one retry, both failing.
    h.blobs.fail_next(2);

    h.registrar.submit("g1", b"proof", &signals("n1")).await?;
    let receipt = h.registrar.submit("g1", b"proof", &signals("n2")).await?;
    assert!(receipt.success);
    assert_eq!(receipt.leaf_count, 2);
    assert!(h.ledger.find_by_nullifier("g1", "n2").await?.is_some());
    assert!(h.registrar.inclusion_proof("g1", "n2").await?.verify()?);
    assert!(h.blobs.put_log().is_empty());

    // The next multiple still snapshots.
    h.registrar.submit("g1", b"proof", &signals("n3")).await?;
    h.registrar.submit("g1", b"proof", &signals("n4")).await?;

    let Harness {
        registrar, blobs, ..
    } = h;
    registrar.shutdown().await?;

    let puts = blobs.put_log();
    assert_eq!(puts.len(), 1);
    let bytes = blobs.get(&puts[0]).await?.expect("stored snapshot");
    let snapshot = Snapshotter::decode(&bytes)?;
    assert_eq!(snapshot.leaves.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_snapshots_at_batch_multiples_and_restore() -> Result<()> {
    let h = harness_with(3, None);
    h.registrar.create_group("g1", "Census", "").await?;
    for i in 0..7 {
        h.registrar
            .submit("g1", b"proof", &signals(&format!("n{i}")))
            .await?;
    }

    let Harness {
        registrar, blobs, ..
    } = h;
    let expected_root = registrar.root("g1").await?;

    // Wait for the worker to record the snapshot at 6 leaves.
    let mut snapshot_id = None;
    for _ in 0..100 {
        let meta = registrar.group("g1").await?;
        if meta.snapshot_leaf_count == Some(6) {
            snapshot_id = meta.snapshot_id;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let snapshot_id = snapshot_id.expect("snapshot at 6 leaves recorded");
    assert_eq!(blobs.put_log().len(), 2);

    let report = registrar.restore("g1", &snapshot_id).await?;
    assert_eq!(report.restored, 6);
    assert_eq!(report.replayed, 1);
    assert_eq!(report.root, expected_root);

    registrar.shutdown().await?;
    Ok(())
}

#[tokio::test]
async fn test_restore_rejects_foreign_snapshot() -> Result<()> {
    let h = harness_with(1, None);
    h.registrar.create_group("g1", "Census", "").await?;
    h.registrar.create_group("g2", "Other", "").await?;
    h.registrar.submit("g2", b"proof", &signals("x")).await?;

    let Harness {
        registrar, blobs, ..
    } = h;
    wait_for_puts(&blobs, 1).await;
    let foreign = blobs.put_log().pop().expect("g2 snapshot");

    let err = registrar.restore("g1", &foreign).await.unwrap_err();
    assert!(matches!(err, RegistrationError::SnapshotMismatch { .. }));

    let err = registrar.restore("g1", &"0".repeat(64)).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Persistence(_)));
    Ok(())
}
