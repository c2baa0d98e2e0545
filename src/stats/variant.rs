use super::{ledger_stats::LedgerStats, mock::MockStats};
use crate::traits::StatsAggregator;
use crate::types::GroupStats;
use anyhow::Result;
use async_trait::async_trait;

/// Enum representing all possible stats aggregator implementations.
pub enum StatsVariant {
    Ledger(LedgerStats),
    Mock(MockStats),
}

#[async_trait]
impl StatsAggregator for StatsVariant {
    fn name(&self) -> &'static str {
        match self {
            StatsVariant::Ledger(inner) => inner.name(),
            StatsVariant::Mock(inner) => inner.name(),
        }
    }

    async fn refresh(&self, group_id: &str) -> Result<GroupStats> {
        match self {
            StatsVariant::Ledger(inner) => inner.refresh(group_id).await,
            StatsVariant::Mock(inner) => inner.refresh(group_id).await,
        }
    }
}
