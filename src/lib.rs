// Library exports for testing and external use

pub mod accumulator;
pub mod blob_store;
pub mod config;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod registrar;
pub mod retry;
pub mod snapshotter;
pub mod stats;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod verifier;

// Re-export commonly used types and traits
pub use config::{AccumulatorType, BaseConfig};
pub use directory::{GroupDirectory, GroupMetadata};
pub use error::RegistrationError;
pub use registrar::Registrar;
pub use traits::{Accumulator, BlobStore, Ledger, ProofVerifier, StatsAggregator};
pub use types::{
    GroupId, GroupStats, Hash256, InclusionProof, PublicSignals, RebuildReport,
    RegistrationRecord, RegistrationStatus, Snapshot, SubmitReceipt,
};

// Re-export variant enums for convenience
pub use accumulator::{AccumulatorRegistry, AccumulatorVariant, MerkleAccumulator};
pub use blob_store::{BlobStoreVariant, FileBlobStore, MemoryBlobStore};
pub use ledger::{LedgerVariant, MemoryLedger, RocksDbLedger};
pub use stats::{LedgerStats, MockStats, StatsVariant};
pub use verifier::{MockVerdict, MockVerifier, NoopVerifier, VerifierVariant};
