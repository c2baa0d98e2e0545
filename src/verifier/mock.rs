use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::ProofVerifier;
use crate::types::PublicSignals;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome the mock verifier produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockVerdict {
    Accept,
    Reject,
    Fault,
    /// Never answers; exercises the caller's timeout.
    Hang,
}

/// Mock verifier for testing.
#[derive(Clone)]
pub struct MockVerifier {
    pub verdict: Arc<Mutex<MockVerdict>>,
    /// Nullifiers rejected regardless of the global verdict.
    pub rejected: Arc<Mutex<HashSet<String>>>,
    pub calls: Arc<AtomicUsize>,
    pub delay: Option<Duration>,
}

impl MockVerifier {
    pub fn new(verdict: MockVerdict) -> Self {
        Self {
            verdict: Arc::new(Mutex::new(verdict)),
            rejected: Arc::new(Mutex::new(HashSet::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn accepting() -> Self {
        Self::new(MockVerdict::Accept)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_verdict(&self, verdict: MockVerdict) {
        *self.verdict.lock().unwrap() = verdict;
    }

    pub fn reject_nullifier(&self, nullifier_hash: &str) {
        self.rejected
            .lock()
            .unwrap()
            .insert(nullifier_hash.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::accepting()
    }
}

#[async_trait]
impl ProofVerifier for MockVerifier {
    fn name(&self) -> &'static str {
        "mock-verifier"
    }

    async fn verify(&self, _proof: &[u8], signals: &PublicSignals) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self
            .rejected
            .lock()
            .unwrap()
            .contains(&signals.nullifier_hash)
        {
            return Ok(false);
        }

        let verdict = *self.verdict.lock().unwrap();
        match verdict {
            MockVerdict::Accept => Ok(true),
            MockVerdict::Reject => Ok(false),
            MockVerdict::Fault => anyhow::bail!("mock verifier fault"),
            MockVerdict::Hang => {
                std::future::pending::<()>().await;
                Ok(false)
            }
        }
    }
}
