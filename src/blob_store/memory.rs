use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::traits::{content_id, BlobStore};
use crate::types::ContentId;

/// Mock blob store for testing.
/// Keeps blobs in memory and records every successful put in order.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    pub blobs: Arc<Mutex<HashMap<ContentId, Vec<u8>>>>,
    pub puts: Arc<Mutex<Vec<ContentId>>>,
    /// Number of upcoming puts that fail before succeeding again.
    pub fail_next_puts: Arc<AtomicU32>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: u32) {
        self.fail_next_puts.store(n, Ordering::SeqCst);
    }

    /// Content ids of successful puts, in call order.
    pub fn put_log(&self) -> Vec<ContentId> {
        self.puts.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn name(&self) -> &'static str {
        "memory-blob-store"
    }

    async fn put(&self, bytes: &[u8]) -> Result<ContentId> {
        let remaining = self.fail_next_puts.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next_puts.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("memory blob store put failure");
        }

        let id = content_id(bytes);
        self.blobs
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_insert_with(|| bytes.to_vec());
        self.puts.lock().unwrap().push(id.clone());

        tracing::debug!("MemoryBlobStore: stored {} bytes as {}", bytes.len(), id);
        Ok(id)
    }

    async fn get(&self, content_id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.lock().unwrap().get(content_id).cloned())
    }
}
