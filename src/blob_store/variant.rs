use super::{file::FileBlobStore, memory::MemoryBlobStore};
use crate::traits::BlobStore;
use crate::types::ContentId;
use anyhow::Result;
use async_trait::async_trait;

/// Enum representing all possible blob store implementations.
pub enum BlobStoreVariant {
    Memory(MemoryBlobStore),
    File(FileBlobStore),
}

#[async_trait]
impl BlobStore for BlobStoreVariant {
    fn name(&self) -> &'static str {
        match self {
            BlobStoreVariant::Memory(inner) => inner.name(),
            BlobStoreVariant::File(inner) => inner.name(),
        }
    }

    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        match self {
            BlobStoreVariant::Memory(inner) => inner.put(bytes).await,
            BlobStoreVariant::File(inner) => inner.put(bytes).await,
        }
    }

    async fn get(&self, content_id: &str) -> Result<Option<Vec<u8>>> {
        match self {
            BlobStoreVariant::Memory(inner) => inner.get(content_id).await,
            BlobStoreVariant::File(inner) => inner.get(content_id).await,
        }
    }

    async fn open(&mut self) -> Result<()> {
        match self {
            BlobStoreVariant::Memory(inner) => inner.open().await,
            BlobStoreVariant::File(inner) => inner.open().await,
        }
    }
}
