pub mod accumulator;
pub mod blob_store;
pub mod ledger;
pub mod stats;
pub mod verifier;

pub use accumulator::Accumulator;
pub use blob_store::content_id;
pub use blob_store::BlobStore;
pub use ledger::Ledger;
pub use stats::StatsAggregator;
pub use verifier::ProofVerifier;
