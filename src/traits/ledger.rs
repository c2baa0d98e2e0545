use anyhow::Result;
use async_trait::async_trait;

use crate::types::NewRegistration;
use crate::types::RegistrationRecord;

/// Append-only registration ledger, the source of truth for
/// "has this nullifier been used in this group".
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Ledger name for logging and metrics.
    fn name(&self) -> &'static str;

    /// Append a registration and return the stored record.
    ///
    /// Implementations assign the sequence number, external reference and
    /// creation time, and must refuse a second record for the same
    /// nullifier in the same group.
    async fn append(
        &self,
        group_id: &str,
        registration: NewRegistration,
    ) -> Result<RegistrationRecord>;

    async fn find_by_nullifier(
        &self,
        group_id: &str,
        nullifier_hash: &str,
    ) -> Result<Option<RegistrationRecord>>;

    async fn count(&self, group_id: &str) -> Result<u64>;

    /// All records of a group in append order.
    async fn records(&self, group_id: &str) -> Result<Vec<RegistrationRecord>>;
}
