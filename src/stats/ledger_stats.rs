use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::ledger::LedgerVariant;
use crate::traits::{Ledger, StatsAggregator};
use crate::types::{GroupStats, RegistrationRecord, RegistrationStatus};

/// Stats recomputed from the ledger's verified records on every refresh.
pub struct LedgerStats {
    ledger: Arc<LedgerVariant>,
}

impl LedgerStats {
    pub fn new(ledger: Arc<LedgerVariant>) -> Self {
        Self { ledger }
    }

    /// Fold records into per-position category histograms.
    pub fn summarize(group_id: &str, records: &[RegistrationRecord], now: u64) -> GroupStats {
        let mut distributions: Vec<BTreeMap<u8, u64>> = Vec::new();
        let mut total_members = 0u64;

        for record in records
            .iter()
            .filter(|r| r.status == RegistrationStatus::Verified)
        {
            total_members += 1;
            if distributions.len() < record.category_codes.len() {
                distributions.resize_with(record.category_codes.len(), BTreeMap::new);
            }
            for (position, code) in record.category_codes.iter().enumerate() {
                *distributions[position].entry(*code).or_insert(0) += 1;
            }
        }

        GroupStats {
            group_id: group_id.to_string(),
            total_members,
            distributions,
            last_updated: now,
        }
    }
}

#[async_trait]
impl StatsAggregator for LedgerStats {
    fn name(&self) -> &'static str {
        "ledger-stats"
    }

    async fn refresh(&self, group_id: &str) -> Result<GroupStats> {
        let records = self.ledger.records(group_id).await?;
        Ok(Self::summarize(
            group_id,
            &records,
            crate::registrar::now_secs(),
        ))
    }
}
