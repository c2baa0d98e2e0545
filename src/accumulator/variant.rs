use anyhow::Result;

use super::merkle_accumulator::MerkleAccumulator;
use super::mock::MockAccumulator;
use crate::config::AccumulatorType;
use crate::traits::Accumulator;
use crate::types::Hash256;
use crate::types::InclusionProof;
use crate::types::Snapshot;

/// Enum representing all possible accumulator implementations.
pub enum AccumulatorVariant {
    Merkle(MerkleAccumulator),
    Mock(MockAccumulator),
}

impl AccumulatorVariant {
    /// Create a new accumulator instance based on the specified type.
    pub fn new(accumulator_type: AccumulatorType) -> Self {
        match accumulator_type {
            AccumulatorType::Merkle => AccumulatorVariant::Merkle(MerkleAccumulator::new()),
            AccumulatorType::Mock => AccumulatorVariant::Mock(MockAccumulator::new()),
        }
    }
}

impl Accumulator for AccumulatorVariant {
    fn id(&self) -> &'static str {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.id(),
            AccumulatorVariant::Mock(inner) => inner.id(),
        }
    }

    fn insert(&mut self, nullifier_hash: &str) -> Result<Hash256> {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.insert(nullifier_hash),
            AccumulatorVariant::Mock(inner) => inner.insert(nullifier_hash),
        }
    }

    fn root(&self) -> Hash256 {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.root(),
            AccumulatorVariant::Mock(inner) => inner.root(),
        }
    }

    fn len(&self) -> usize {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.len(),
            AccumulatorVariant::Mock(inner) => inner.len(),
        }
    }

    fn contains(&self, nullifier_hash: &str) -> bool {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.contains(nullifier_hash),
            AccumulatorVariant::Mock(inner) => inner.contains(nullifier_hash),
        }
    }

    fn prove(&self, nullifier_hash: &str) -> Result<Option<InclusionProof>> {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.prove(nullifier_hash),
            AccumulatorVariant::Mock(inner) => inner.prove(nullifier_hash),
        }
    }

    fn snapshot(&self, group_id: &str) -> Snapshot {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.snapshot(group_id),
            AccumulatorVariant::Mock(inner) => inner.snapshot(group_id),
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        match self {
            AccumulatorVariant::Merkle(inner) => inner.restore(snapshot),
            AccumulatorVariant::Mock(inner) => inner.restore(snapshot),
        }
    }
}
