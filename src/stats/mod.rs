pub mod ledger_stats;
pub mod mock;
pub mod variant;

pub use ledger_stats::LedgerStats;
pub use mock::MockStats;
pub use variant::StatsVariant;
