use anyhow::Result;
use rs_merkle::algorithms::Sha256;
use rs_merkle::Hasher;

use crate::types::Hash256;

/// SHA-256 of arbitrary bytes.
#[inline]
pub fn hash_bytes(data: &[u8]) -> Hash256 {
    Sha256::hash(data)
}

/// Leaf digest of a nullifier: H(nullifier string bytes).
#[inline]
pub fn leaf_hash(nullifier_hash: &str) -> Hash256 {
    hash_bytes(nullifier_hash.as_bytes())
}

/// Interior node digest: H(left || right), raw 32-byte children.
#[inline]
pub fn hash_pair(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left);
    buf[32..].copy_from_slice(right);
    Sha256::hash(&buf)
}

/// Root of a tree without leaves: H("").
pub fn empty_root() -> Hash256 {
    hash_bytes(b"")
}

pub fn to_hex(hash: &Hash256) -> String {
    hex::encode(hash)
}

pub fn from_hex(s: &str) -> Result<Hash256> {
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    if bytes.len() != 32 {
        anyhow::bail!("expected 32-byte digest, got {} bytes", bytes.len());
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
