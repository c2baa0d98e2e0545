use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{RegistrationError, Result};
use crate::types::{ContentId, GroupId};

/// Metadata of one group as known to this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    pub id: GroupId,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: u64,
    /// Root of the latest persisted snapshot.
    pub merkle_root: Option<String>,
    pub snapshot_id: Option<ContentId>,
    pub snapshot_leaf_count: Option<u64>,
}

/// In-process directory of groups accepting registrations.
#[derive(Default)]
pub struct GroupDirectory {
    groups: RwLock<HashMap<GroupId, GroupMetadata>>,
}

impl GroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<GroupMetadata> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(id) {
            return Err(RegistrationError::GroupAlreadyExists(id.to_string()));
        }

        let meta = GroupMetadata {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            active: true,
            created_at: crate::registrar::now_secs(),
            merkle_root: None,
            snapshot_id: None,
            snapshot_leaf_count: None,
        };
        groups.insert(id.to_string(), meta.clone());
        tracing::info!("Group created: {}", id);
        Ok(meta)
    }

    pub async fn get(&self, id: &str) -> Option<GroupMetadata> {
        self.groups.read().await.get(id).cloned()
    }

    pub async fn require(&self, id: &str) -> Result<GroupMetadata> {
        self.get(id)
            .await
            .ok_or_else(|| RegistrationError::GroupNotFound(id.to_string()))
    }

    /// Group must exist and still accept registrations.
    pub async fn require_active(&self, id: &str) -> Result<GroupMetadata> {
        let meta = self.require(id).await?;
        if !meta.active {
            return Err(RegistrationError::GroupClosed(id.to_string()));
        }
        Ok(meta)
    }

    pub async fn close(&self, id: &str) -> Result<()> {
        let mut groups = self.groups.write().await;
        let meta = groups
            .get_mut(id)
            .ok_or_else(|| RegistrationError::GroupNotFound(id.to_string()))?;
        meta.active = false;
        tracing::info!("Group closed: {}", id);
        Ok(())
    }

    /// Record the latest persisted snapshot. Older snapshots never
    /// overwrite newer ones.
    pub async fn record_snapshot(
        &self,
        id: &str,
        root: &str,
        content_id: &str,
        leaf_count: u64,
    ) -> Result<()> {
        let mut groups = self.groups.write().await;
        let meta = groups
            .get_mut(id)
            .ok_or_else(|| RegistrationError::GroupNotFound(id.to_string()))?;

        if meta.snapshot_leaf_count.is_some_and(|n| n > leaf_count) {
            return Ok(());
        }
        meta.merkle_root = Some(root.to_string());
        meta.snapshot_id = Some(content_id.to_string());
        meta.snapshot_leaf_count = Some(leaf_count);
        Ok(())
    }

    pub async fn list(&self) -> Vec<GroupMetadata> {
        let mut all: Vec<_> = self.groups.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
