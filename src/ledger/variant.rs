use super::{memory::MemoryLedger, rocks::RocksDbLedger};
use crate::traits::Ledger;
use crate::types::{NewRegistration, RegistrationRecord};
use anyhow::Result;
use async_trait::async_trait;

/// Enum representing all possible ledger implementations.
pub enum LedgerVariant {
    Memory(MemoryLedger),
    RocksDb(RocksDbLedger),
}

#[async_trait]
impl Ledger for LedgerVariant {
    fn name(&self) -> &'static str {
        match self {
            LedgerVariant::Memory(inner) => inner.name(),
            LedgerVariant::RocksDb(inner) => inner.name(),
        }
    }

    async fn append(
        &self,
        group_id: &str,
        registration: NewRegistration,
    ) -> Result<RegistrationRecord> {
        match self {
            LedgerVariant::Memory(inner) => inner.append(group_id, registration).await,
            LedgerVariant::RocksDb(inner) => inner.append(group_id, registration).await,
        }
    }

    async fn find_by_nullifier(
        &self,
        group_id: &str,
        nullifier_hash: &str,
    ) -> Result<Option<RegistrationRecord>> {
        match self {
            LedgerVariant::Memory(inner) => inner.find_by_nullifier(group_id, nullifier_hash).await,
            LedgerVariant::RocksDb(inner) => {
                inner.find_by_nullifier(group_id, nullifier_hash).await
            }
        }
    }

    async fn count(&self, group_id: &str) -> Result<u64> {
        match self {
            LedgerVariant::Memory(inner) => inner.count(group_id).await,
            LedgerVariant::RocksDb(inner) => inner.count(group_id).await,
        }
    }

    async fn records(&self, group_id: &str) -> Result<Vec<RegistrationRecord>> {
        match self {
            LedgerVariant::Memory(inner) => inner.records(group_id).await,
            LedgerVariant::RocksDb(inner) => inner.records(group_id).await,
        }
    }
}
