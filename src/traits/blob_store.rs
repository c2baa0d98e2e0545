use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::types::ContentId;

/// Content identifier of `bytes`: lowercase hex SHA-256.
pub fn content_id(bytes: &[u8]) -> ContentId {
    hex::encode(Sha256::digest(bytes))
}

/// Content-addressed blob storage (IPFS, object store, file system, etc.).
///
/// Identical bytes always map to the same identifier.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable store name for logging.
    fn name(&self) -> &'static str;

    /// Store bytes and return their content identifier.
    async fn put(&self, bytes: &[u8]) -> Result<ContentId>;

    /// Fetch bytes by content identifier.
    async fn get(&self, content_id: &str) -> Result<Option<Vec<u8>>>;

    /// Initialize the store (e.g., create directories).
    async fn open(&mut self) -> Result<()> {
        // Default: no-op
        Ok(())
    }
}
