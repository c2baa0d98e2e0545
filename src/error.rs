use thiserror::Error;

use crate::types::GroupId;

/// Errors surfaced by the registration pipeline to its callers.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("proof verification failed: {0}")]
    ProofVerification(String),

    #[error("nullifier {nullifier_hash} already registered in group {group_id}")]
    DuplicateNullifier {
        group_id: GroupId,
        nullifier_hash: String,
    },

    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("group already exists: {0}")]
    GroupAlreadyExists(GroupId),

    #[error("group is closed: {0}")]
    GroupClosed(GroupId),

    #[error("nullifier {nullifier_hash} not found in group {group_id}")]
    LeafNotFound {
        group_id: GroupId,
        nullifier_hash: String,
    },

    #[error("snapshot persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),

    #[error("snapshot does not match group {group_id}: {reason}")]
    SnapshotMismatch { group_id: GroupId, reason: String },

    #[error("ledger committed nullifier {nullifier_hash} but accumulator insert failed for group {group_id}")]
    ConsistencyRisk {
        group_id: GroupId,
        nullifier_hash: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("group {0} accumulator diverged from ledger, reconcile required")]
    GroupDiverged(GroupId),

    #[error("{context}")]
    Infrastructure {
        context: String,
        #[source]
        source: anyhow::Error,
    },
}

impl RegistrationError {
    pub fn infrastructure(context: impl Into<String>, source: anyhow::Error) -> Self {
        RegistrationError::Infrastructure {
            context: context.into(),
            source,
        }
    }

    /// Terminal errors caused by the submission itself rather than by
    /// infrastructure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RegistrationError::ProofVerification(_)
                | RegistrationError::DuplicateNullifier { .. }
                | RegistrationError::GroupNotFound(_)
                | RegistrationError::GroupClosed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
