use anyhow::Result;
use async_trait::async_trait;

use crate::types::PublicSignals;

/// Zero-knowledge proof verification capability.
///
/// The proof system itself is opaque here; only the boolean outcome is
/// consumed. An `Err` is treated the same as `Ok(false)` by the pipeline.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Verifier name for logging.
    fn name(&self) -> &'static str;

    async fn verify(&self, proof: &[u8], signals: &PublicSignals) -> Result<bool>;
}
