use std::collections::HashMap;

use anyhow::Result;

use crate::crypto::hash::{from_hex, leaf_hash, to_hex};
use crate::crypto::MerkleTree;
use crate::traits::Accumulator;
use crate::types::Hash256;
use crate::types::InclusionProof;
use crate::types::Snapshot;

/// Merkle tree accumulator over nullifier hashes.
pub struct MerkleAccumulator {
    tree: MerkleTree,
    leaf_to_index: HashMap<Hash256, usize>, // first occurrence wins
}

impl MerkleAccumulator {
    pub fn new() -> Self {
        Self {
            tree: MerkleTree::new(),
            leaf_to_index: HashMap::new(),
        }
    }

    /// Rebuild from a snapshot, checking its recorded root.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self> {
        let leaves = snapshot
            .leaves
            .iter()
            .map(|l| from_hex(l))
            .collect::<Result<Vec<_>>>()?;

        let tree = MerkleTree::from_leaves(&leaves);
        let root = to_hex(&tree.root());
        if root != snapshot.root {
            anyhow::bail!(
                "snapshot root {} does not match recomputed root {}",
                snapshot.root,
                root
            );
        }

        let mut leaf_to_index = HashMap::with_capacity(leaves.len());
        for (i, leaf) in leaves.iter().enumerate() {
            leaf_to_index.entry(*leaf).or_insert(i);
        }

        Ok(Self {
            tree,
            leaf_to_index,
        })
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }
}

impl Default for MerkleAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator for MerkleAccumulator {
    fn id(&self) -> &'static str {
        "merkle"
    }

    fn insert(&mut self, nullifier_hash: &str) -> Result<Hash256> {
        let leaf = leaf_hash(nullifier_hash);
        let index = self.tree.len();
        let root = self.tree.push(leaf);
        self.leaf_to_index.entry(leaf).or_insert(index);
        Ok(root)
    }

    fn root(&self) -> Hash256 {
        self.tree.root()
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn contains(&self, nullifier_hash: &str) -> bool {
        self.leaf_to_index.contains_key(&leaf_hash(nullifier_hash))
    }

    fn prove(&self, nullifier_hash: &str) -> Result<Option<InclusionProof>> {
        let leaf = leaf_hash(nullifier_hash);
        let Some(&index) = self.leaf_to_index.get(&leaf) else {
            return Ok(None);
        };
        let Some(path) = self.tree.path(index) else {
            anyhow::bail!("leaf index {} out of range ({} leaves)", index, self.tree.len());
        };
        Ok(Some(InclusionProof::from_path(&leaf, &path, &self.tree.root())))
    }

    fn snapshot(&self, group_id: &str) -> Snapshot {
        Snapshot {
            group_id: group_id.to_string(),
            leaves: self.tree.leaves().iter().map(to_hex).collect(),
            root: to_hex(&self.tree.root()),
        }
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        *self = Self::from_snapshot(snapshot)?;
        Ok(())
    }
}
