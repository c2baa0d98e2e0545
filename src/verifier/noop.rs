use crate::traits::ProofVerifier;
use crate::types::PublicSignals;
use anyhow::Result;
use async_trait::async_trait;

/// Noop verifier that accepts every proof.
/// Only meant for local development where no proving backend is wired.
pub struct NoopVerifier;

#[async_trait]
impl ProofVerifier for NoopVerifier {
    fn name(&self) -> &'static str {
        "noop-verifier"
    }

    async fn verify(&self, _proof: &[u8], signals: &PublicSignals) -> Result<bool> {
        tracing::debug!(
            "NoopVerifier: accepting proof for nullifier {} without verification",
            signals.nullifier_hash
        );
        Ok(true)
    }
}
