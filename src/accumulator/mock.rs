use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;

use super::merkle_accumulator::MerkleAccumulator;
use crate::traits::Accumulator;
use crate::types::{Hash256, InclusionProof, Snapshot};

/// Mock accumulator for testing.
///
/// Delegates to a real Merkle accumulator but can be told to fail inserts.
/// The switch and counter are shared between clones of the handle so tests
/// can flip them after the accumulator has been moved into a registry.
pub struct MockAccumulator {
    inner: MerkleAccumulator,
    pub fail_inserts: Arc<AtomicBool>,
    pub insert_calls: Arc<AtomicUsize>,
}

impl MockAccumulator {
    pub fn new() -> Self {
        Self::with_switch(Arc::new(AtomicBool::new(false)), Arc::new(AtomicUsize::new(0)))
    }

    pub fn with_switch(fail_inserts: Arc<AtomicBool>, insert_calls: Arc<AtomicUsize>) -> Self {
        Self {
            inner: MerkleAccumulator::new(),
            fail_inserts,
            insert_calls,
        }
    }
}

impl Default for MockAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for MockAccumulator {
    fn id(&self) -> &'static str {
        "mock-accumulator"
    }

    fn insert(&mut self, nullifier_hash: &str) -> Result<Hash256> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inserts.load(Ordering::SeqCst) {
            anyhow::bail!("mock accumulator insert failure");
        }
        self.inner.insert(nullifier_hash)
    }

    fn root(&self) -> Hash256 {
        self.inner.root()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn contains(&self, nullifier_hash: &str) -> bool {
        self.inner.contains(nullifier_hash)
    }

    fn prove(&self, nullifier_hash: &str) -> Result<Option<InclusionProof>> {
        self.inner.prove(nullifier_hash)
    }

    fn snapshot(&self, group_id: &str) -> Snapshot {
        self.inner.snapshot(group_id)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.inner.restore(snapshot)
    }
}
