use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::variant::AccumulatorVariant;
use crate::config::AccumulatorType;
use crate::types::GroupId;

/// Factory used to create a fresh accumulator for a group.
///
/// Note: boxed fn so tests can inject pre-wired mocks.
pub type AccumulatorFactory = Arc<dyn Fn() -> AccumulatorVariant + Send + Sync>;

/// Per-group state guarded by the group's single-writer lock.
pub struct GroupAccumulator {
    pub accumulator: AccumulatorVariant,
    /// Set when the ledger accepted a record the accumulator failed to
    /// insert. Cleared by reconcile.
    pub diverged: bool,
    /// Whether the accumulator has caught up with the ledger records this
    /// process found for the group. Slots start unloaded.
    pub loaded: bool,
}

pub type GroupSlot = Arc<Mutex<GroupAccumulator>>;

/// Owns every group's accumulator. Holding a slot's lock is the
/// mutual-exclusion boundary for writes to that group.
pub struct AccumulatorRegistry {
    groups: RwLock<HashMap<GroupId, GroupSlot>>,
    factory: AccumulatorFactory,
}

impl AccumulatorRegistry {
    pub fn new(accumulator_type: AccumulatorType) -> Self {
        Self::with_factory(Arc::new(move || AccumulatorVariant::new(accumulator_type)))
    }

    pub fn with_factory(factory: AccumulatorFactory) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            factory,
        }
    }

    pub fn create_accumulator(&self) -> AccumulatorVariant {
        (self.factory)()
    }

    /// Slot for `group_id`, created empty and unloaded on first use.
    pub async fn slot(&self, group_id: &str) -> GroupSlot {
        if let Some(slot) = self.groups.read().await.get(group_id) {
            return Arc::clone(slot);
        }

        let mut groups = self.groups.write().await;
        let slot = groups.entry(group_id.to_string()).or_insert_with(|| {
            tracing::debug!("Creating accumulator for group {}", group_id);
            Arc::new(Mutex::new(GroupAccumulator {
                accumulator: (self.factory)(),
                diverged: false,
                loaded: false,
            }))
        });
        Arc::clone(slot)
    }

    pub async fn group_ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
