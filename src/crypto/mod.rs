pub mod hash;
pub mod merkle;
pub mod proof;

pub use hash::{empty_root, from_hex, hash_pair, leaf_hash, to_hex};
pub use merkle::{root_from_path, MerklePath, MerkleTree};
