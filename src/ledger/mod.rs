pub mod memory;
pub mod rocks;
pub mod variant;

pub use self::memory::MemoryLedger;
pub use self::rocks::RocksDbLedger;
pub use self::variant::LedgerVariant;

use crate::types::{NewRegistration, RegistrationRecord};

/// Build the stored record for `registration` at position `sequence`.
pub(crate) fn new_record(
    group_id: &str,
    sequence: u64,
    registration: NewRegistration,
) -> RegistrationRecord {
    RegistrationRecord {
        group_id: group_id.to_string(),
        sequence,
        nullifier_hash: registration.nullifier_hash,
        category_codes: registration.category_codes,
        timestamp: registration.timestamp,
        external_reference: uuid::Uuid::new_v4().to_string(),
        status: registration.status,
        created_at: crate::registrar::now_secs(),
    }
}
