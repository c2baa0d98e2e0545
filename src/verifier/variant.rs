use super::{mock::MockVerifier, noop::NoopVerifier};
use crate::traits::ProofVerifier;
use crate::types::PublicSignals;
use anyhow::Result;
use async_trait::async_trait;

/// Enum representing all possible verifier implementations.
pub enum VerifierVariant {
    Noop(NoopVerifier),
    Mock(MockVerifier),
}

#[async_trait]
impl ProofVerifier for VerifierVariant {
    fn name(&self) -> &'static str {
        match self {
            VerifierVariant::Noop(inner) => inner.name(),
            VerifierVariant::Mock(inner) => inner.name(),
        }
    }

    async fn verify(&self, proof: &[u8], signals: &PublicSignals) -> Result<bool> {
        match self {
            VerifierVariant::Noop(inner) => inner.verify(proof, signals).await,
            VerifierVariant::Mock(inner) => inner.verify(proof, signals).await,
        }
    }
}
