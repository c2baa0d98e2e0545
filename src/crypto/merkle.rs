use crate::crypto::hash::{empty_root, hash_pair};
use crate::types::Hash256;

/// Sibling path for one leaf, ordered from the leaf level upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath {
    pub siblings: Vec<Hash256>,
    /// 0 when the path node is the left child at that level, 1 when right.
    pub path_indices: Vec<u8>,
}

/// Append-only binary Merkle tree.
///
/// Odd-length levels are padded by pairing the last node with itself.
/// Every level is kept so proofs can be read without recomputation;
/// appending a leaf only rewrites the rightmost node of each level.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    levels: Vec<Vec<Hash256>>,
}

impl MerkleTree {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Build a tree over already-hashed leaves, level by level.
    pub fn from_leaves(leaves: &[Hash256]) -> Self {
        if leaves.is_empty() {
            return Self::new();
        }

        let mut levels = vec![leaves.to_vec()];
        while let Some(current) = levels.last().filter(|l| l.len() > 1) {
            let next: Vec<Hash256> = current
                .chunks(2)
                .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                .collect();
            levels.push(next);
        }

        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.first().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn leaves(&self) -> &[Hash256] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn level(&self, level: usize) -> Option<&[Hash256]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    /// ceil(log2(leaf_count)); 0 for empty and single-leaf trees.
    pub fn height(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn root(&self) -> Hash256 {
        match self.levels.last() {
            Some(top) if !top.is_empty() => top[0],
            _ => empty_root(),
        }
    }

    /// Append a leaf and return the new root.
    pub fn push(&mut self, leaf: Hash256) -> Hash256 {
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        self.levels[0].push(leaf);

        let mut index = self.levels[0].len() - 1;
        let mut level = 0;
        while self.levels[level].len() > 1 {
            let parent = index / 2;
            let nodes = &self.levels[level];
            let left = nodes[parent * 2];
            let right = nodes.get(parent * 2 + 1).copied().unwrap_or(left);
            let digest = hash_pair(&left, &right);

            if self.levels.len() == level + 1 {
                self.levels.push(Vec::new());
            }
            let next = &mut self.levels[level + 1];
            if parent < next.len() {
                next[parent] = digest;
            } else {
                next.push(digest);
            }

            index = parent;
            level += 1;
        }

        self.root()
    }

    pub fn path(&self, index: usize) -> Option<MerklePath> {
        if index >= self.len() {
            return None;
        }

        let height = self.height();
        let mut siblings = Vec::with_capacity(height);
        let mut path_indices = Vec::with_capacity(height);
        let mut idx = index;
        for nodes in &self.levels[..height] {
            let sibling = nodes.get(idx ^ 1).copied().unwrap_or(nodes[idx]);
            siblings.push(sibling);
            path_indices.push((idx & 1) as u8);
            idx /= 2;
        }

        Some(MerklePath {
            siblings,
            path_indices,
        })
    }
}

/// Fold a leaf and its sibling path back into a root.
pub fn root_from_path(leaf: &Hash256, siblings: &[Hash256], path_indices: &[u8]) -> Option<Hash256> {
    if siblings.len() != path_indices.len() {
        return None;
    }

    let mut cur = *leaf;
    for (sibling, bit) in siblings.iter().zip(path_indices) {
        cur = match bit {
            0 => hash_pair(&cur, sibling),
            1 => hash_pair(sibling, &cur),
            _ => return None,
        };
    }
    Some(cur)
}
