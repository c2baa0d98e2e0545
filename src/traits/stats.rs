use anyhow::Result;
use async_trait::async_trait;

use crate::types::GroupStats;

/// Aggregate statistics over a group's verified registrations.
#[async_trait]
pub trait StatsAggregator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Recompute and return the group's summary.
    async fn refresh(&self, group_id: &str) -> Result<GroupStats>;
}
