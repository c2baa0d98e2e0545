use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::traits::{content_id, BlobStore};
use crate::types::ContentId;

/// File system blob store.
/// Each blob lives at `<directory>/<content id>.json`.
pub struct FileBlobStore {
    directory: PathBuf,
}

impl FileBlobStore {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("invalid content id: {:?}", id);
        }
        Ok(self.directory.join(format!("{id}.json")))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    fn name(&self) -> &'static str {
        "file-blob-store"
    }

    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let id = content_id(bytes);
        let path = self.path_for(&id)?;

        if tokio::fs::try_exists(&path).await? {
            tracing::debug!("File blob store: {} already present", id);
            return Ok(id);
        }

        tokio::fs::create_dir_all(&self.directory).await?;
        // Write to a temp file first so readers never see a partial blob.
        let tmp = self.directory.join(format!("{id}.tmp"));
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("write {:?}", tmp))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;

        tracing::info!("File blob store: wrote {} bytes to {:?}", bytes.len(), path);
        Ok(id)
    }

    async fn get(&self, content_id_str: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(content_id_str)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }

        let bytes = tokio::fs::read(&path).await?;
        let actual = content_id(&bytes);
        if actual != content_id_str {
            anyhow::bail!(
                "blob {:?} is corrupt: content hashes to {}",
                path,
                actual
            );
        }
        Ok(Some(bytes))
    }

    async fn open(&mut self) -> Result<()> {
        tracing::info!("File blob store: initializing directory {:?}", self.directory);
        tokio::fs::create_dir_all(&self.directory).await?;
        Ok(())
    }
}
