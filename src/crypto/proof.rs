use anyhow::Result;

use crate::crypto::hash::{from_hex, to_hex};
use crate::crypto::merkle::{root_from_path, MerklePath};
use crate::types::{Hash256, InclusionProof};

impl InclusionProof {
    pub fn from_path(leaf: &Hash256, path: &MerklePath, root: &Hash256) -> Self {
        Self {
            leaf: to_hex(leaf),
            siblings: path.siblings.iter().map(to_hex).collect(),
            path_indices: path.path_indices.clone(),
            root: to_hex(root),
        }
    }

    /// Recompute the root from leaf, siblings and path bits.
    ///
    /// Returns `None` when the sibling and path lengths disagree or a path
    /// bit is not 0/1.
    pub fn computed_root(&self) -> Result<Option<Hash256>> {
        let leaf = from_hex(&self.leaf)?;
        let siblings = self
            .siblings
            .iter()
            .map(|s| from_hex(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(root_from_path(&leaf, &siblings, &self.path_indices))
    }

    /// True when the recomputed root equals the recorded root.
    pub fn verify(&self) -> Result<bool> {
        let expected = from_hex(&self.root)?;
        Ok(self.computed_root()? == Some(expected))
    }

    /// True when the proof holds against `root` specifically. A proof taken
    /// before the tree grew fails against the newer root.
    pub fn verify_against(&self, root: &Hash256) -> Result<bool> {
        Ok(self.root == to_hex(root) && self.verify()?)
    }
}
