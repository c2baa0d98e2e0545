use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use crate::traits::Ledger;
use crate::types::{GroupId, NewRegistration, RegistrationRecord};

#[derive(Default)]
struct GroupLedger {
    records: Vec<RegistrationRecord>,
    by_nullifier: HashMap<String, usize>,
}

/// In-memory ledger.
///
/// Clones share state, so a test can keep a handle after moving one into
/// the registrar. `fail_appends` / `fail_lookups` inject faults.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    groups: Arc<Mutex<HashMap<GroupId, GroupLedger>>>,
    pub fail_appends: Arc<AtomicBool>,
    pub fail_lookups: Arc<AtomicBool>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all groups.
    pub fn total(&self) -> usize {
        self.groups
            .lock()
            .unwrap()
            .values()
            .map(|g| g.records.len())
            .sum()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    fn name(&self) -> &'static str {
        "memory-ledger"
    }

    async fn append(
        &self,
        group_id: &str,
        registration: NewRegistration,
    ) -> Result<RegistrationRecord> {
        if self.fail_appends.load(Ordering::SeqCst) {
            anyhow::bail!("memory ledger append failure");
        }

        let mut groups = self.groups.lock().unwrap();
        let group = groups.entry(group_id.to_string()).or_default();
        if group.by_nullifier.contains_key(&registration.nullifier_hash) {
            anyhow::bail!(
                "unique constraint violated: nullifier {} already in group {}",
                registration.nullifier_hash,
                group_id
            );
        }

        let record = super::new_record(group_id, group.records.len() as u64, registration);
        group
            .by_nullifier
            .insert(record.nullifier_hash.clone(), group.records.len());
        group.records.push(record.clone());

        tracing::debug!(
            "MemoryLedger: appended nullifier {} to group {} (seq={})",
            record.nullifier_hash,
            group_id,
            record.sequence
        );
        Ok(record)
    }

    async fn find_by_nullifier(
        &self,
        group_id: &str,
        nullifier_hash: &str,
    ) -> Result<Option<RegistrationRecord>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            anyhow::bail!("memory ledger lookup failure");
        }

        let groups = self.groups.lock().unwrap();
        Ok(groups.get(group_id).and_then(|g| {
            g.by_nullifier
                .get(nullifier_hash)
                .map(|&i| g.records[i].clone())
        }))
    }

    async fn count(&self, group_id: &str) -> Result<u64> {
        let groups = self.groups.lock().unwrap();
        Ok(groups
            .get(group_id)
            .map(|g| g.records.len() as u64)
            .unwrap_or(0))
    }

    async fn records(&self, group_id: &str) -> Result<Vec<RegistrationRecord>> {
        let groups = self.groups.lock().unwrap();
        Ok(groups
            .get(group_id)
            .map(|g| g.records.clone())
            .unwrap_or_default())
    }
}
