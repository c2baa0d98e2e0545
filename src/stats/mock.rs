use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::traits::StatsAggregator;
use crate::types::GroupStats;

/// Mock stats aggregator for testing.
#[derive(Clone, Default)]
pub struct MockStats {
    pub fail: Arc<AtomicBool>,
    pub calls: Arc<AtomicUsize>,
}

impl MockStats {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsAggregator for MockStats {
    fn name(&self) -> &'static str {
        "mock-stats"
    }

    async fn refresh(&self, group_id: &str) -> Result<GroupStats> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock stats failure");
        }
        Ok(GroupStats {
            group_id: group_id.to_string(),
            ..Default::default()
        })
    }
}
