use anyhow::Result;

use crate::types::Hash256;
use crate::types::InclusionProof;
use crate::types::Snapshot;

/// Stateful, append-only cryptographic accumulator for one group.
///
/// Deduplication is the caller's job; `insert` appends unconditionally.
pub trait Accumulator: Send + Sync {
    /// Identifier for logging/telemetry (e.g. "merkle").
    fn id(&self) -> &'static str;

    /// Append H(nullifier_hash) and return the new root.
    fn insert(&mut self, nullifier_hash: &str) -> Result<Hash256>;

    /// Current root; H("") when empty.
    fn root(&self) -> Hash256;

    /// Number of leaves.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, nullifier_hash: &str) -> bool;

    /// Inclusion proof against the current root, `None` if never inserted.
    fn prove(&self, nullifier_hash: &str) -> Result<Option<InclusionProof>>;

    /// Full copy of leaves and root.
    fn snapshot(&self, group_id: &str) -> Snapshot;

    /// Replace state with the contents of `snapshot`.
    fn restore(&mut self, snapshot: &Snapshot) -> Result<()>;
}
