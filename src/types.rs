use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed-size digest used for leaves, nodes and roots.
pub type Hash256 = [u8; 32];

/// Opaque identifier of one group (one accumulator, one nullifier namespace).
pub type GroupId = String;

/// Content identifier returned by a blob store.
pub type ContentId = String;

/// Public inputs that accompany a membership proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSignals {
    /// Hex-encoded nullifier hash, unique per member and group.
    pub nullifier_hash: String,
    /// Small categorical attributes disclosed by the proof
    /// (e.g. age range, continent).
    #[serde(default)]
    pub category_codes: Vec<u8>,
    /// Unix timestamp bound into the proof.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Verified,
    Failed,
}

/// Registration handed to the ledger; the ledger assigns sequence,
/// external reference and creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    pub nullifier_hash: String,
    pub category_codes: Vec<u8>,
    pub timestamp: u64,
    pub status: RegistrationStatus,
}

/// Append-only ledger entry for one accepted nullifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub group_id: GroupId,
    /// Position in the group's append order, starting at 0.
    pub sequence: u64,
    pub nullifier_hash: String,
    pub category_codes: Vec<u8>,
    pub timestamp: u64,
    /// Reference of the external submission (e.g. chain transaction).
    pub external_reference: String,
    pub status: RegistrationStatus,
    /// UTC unix seconds.
    pub created_at: u64,
}

/// Merkle inclusion proof, all digests lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    pub leaf: String,
    /// Sibling digests ordered from the leaf level toward the root.
    pub siblings: Vec<String>,
    /// One bit per level: 0 when the path node is a left child, 1 when right.
    pub path_indices: Vec<u8>,
    /// Root at the time the proof was generated.
    pub root: String,
}

/// Full copy of a group's accumulator for external persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub group_id: GroupId,
    pub leaves: Vec<String>,
    pub root: String,
}

/// Aggregate view of a group's verified registrations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupStats {
    pub group_id: GroupId,
    pub total_members: u64,
    /// One histogram per category position: code -> member count.
    pub distributions: Vec<BTreeMap<u8, u64>>,
    pub last_updated: u64,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub success: bool,
    pub external_reference: String,
    pub root: String,
    pub leaf_count: u64,
    pub stats: GroupStats,
}

/// Work item for the snapshot worker.
#[derive(Debug, Clone)]
pub struct SnapshotJob {
    pub snapshot: Snapshot,
    pub leaf_count: u64,
}

/// Outcome of rebuilding a group's accumulator from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildReport {
    pub group_id: GroupId,
    /// Leaves taken from a snapshot; 0 for a pure ledger replay.
    pub restored: u64,
    /// Leaves re-inserted from ledger records.
    pub replayed: u64,
    pub leaf_count: u64,
    pub root: String,
}
