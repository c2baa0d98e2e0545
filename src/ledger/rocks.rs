use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};

use crate::traits::Ledger;
use crate::types::{NewRegistration, RegistrationRecord};

const RECORD_TAG: u8 = b'r';
const NULLIFIER_TAG: u8 = b'n';
const HEAD_TAG: u8 = b'h';
const SEQ_LEN: usize = 8;

/// RocksDB-backed ledger.
///
/// Layout:
/// - `r || len(group) || group || seq_be`  -> JSON record
/// - `n || len(group) || group || nullifier` -> seq_be
/// - `h || len(group) || group`            -> next seq_be
pub struct RocksDbLedger {
    db: Arc<DB>,
    /// Serializes head read-modify-write across appends.
    write_lock: Mutex<()>,
}

impl RocksDbLedger {
    pub fn open(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).with_context(|| format!("open ledger at {path}"))?;
        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Encode `tag || u16_be(len) || group`.
    fn group_prefix(tag: u8, group_id: &str) -> Result<Vec<u8>> {
        let len = u16::try_from(group_id.len())
            .map_err(|_| anyhow::anyhow!("group id too long: {} bytes", group_id.len()))?;
        let mut buf = Vec::with_capacity(3 + group_id.len() + SEQ_LEN);
        buf.push(tag);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(group_id.as_bytes());
        Ok(buf)
    }

    fn record_key(group_id: &str, sequence: u64) -> Result<Vec<u8>> {
        let mut key = Self::group_prefix(RECORD_TAG, group_id)?;
        key.extend_from_slice(&sequence.to_be_bytes());
        Ok(key)
    }

    fn nullifier_key(group_id: &str, nullifier_hash: &str) -> Result<Vec<u8>> {
        let mut key = Self::group_prefix(NULLIFIER_TAG, group_id)?;
        key.extend_from_slice(nullifier_hash.as_bytes());
        Ok(key)
    }

    fn decode_seq(raw: &[u8]) -> Result<u64> {
        let bytes: [u8; SEQ_LEN] = raw
            .try_into()
            .map_err(|_| anyhow::anyhow!("corrupt sequence value ({} bytes)", raw.len()))?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn head(&self, group_id: &str) -> Result<u64> {
        let key = Self::group_prefix(HEAD_TAG, group_id)?;
        match self.db.get(key)? {
            Some(raw) => Self::decode_seq(&raw),
            None => Ok(0),
        }
    }

    fn read_record(&self, group_id: &str, sequence: u64) -> Result<Option<RegistrationRecord>> {
        match self.db.get(Self::record_key(group_id, sequence)?)? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Ledger for RocksDbLedger {
    fn name(&self) -> &'static str {
        "rocksdb-ledger"
    }

    async fn append(
        &self,
        group_id: &str,
        registration: NewRegistration,
    ) -> Result<RegistrationRecord> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("ledger write lock poisoned"))?;

        let nullifier_key = Self::nullifier_key(group_id, &registration.nullifier_hash)?;
        if self.db.get(&nullifier_key)?.is_some() {
            anyhow::bail!(
                "unique constraint violated: nullifier {} already in group {}",
                registration.nullifier_hash,
                group_id
            );
        }

        let sequence = self.head(group_id)?;
        let record = super::new_record(group_id, sequence, registration);

        let mut batch = WriteBatch::default();
        batch.put(
            Self::record_key(group_id, sequence)?,
            serde_json::to_vec(&record)?,
        );
        batch.put(&nullifier_key, sequence.to_be_bytes());
        batch.put(
            Self::group_prefix(HEAD_TAG, group_id)?,
            (sequence + 1).to_be_bytes(),
        );
        self.db.write(batch)?;

        Ok(record)
    }

    async fn find_by_nullifier(
        &self,
        group_id: &str,
        nullifier_hash: &str,
    ) -> Result<Option<RegistrationRecord>> {
        let Some(raw) = self.db.get(Self::nullifier_key(group_id, nullifier_hash)?)? else {
            return Ok(None);
        };
        let sequence = Self::decode_seq(&raw)?;
        self.read_record(group_id, sequence)
    }

    async fn count(&self, group_id: &str) -> Result<u64> {
        self.head(group_id)
    }

    async fn records(&self, group_id: &str) -> Result<Vec<RegistrationRecord>> {
        let prefix = Self::group_prefix(RECORD_TAG, group_id)?;
        let iter = self
            .db
            .iterator(IteratorMode::From(&prefix, Direction::Forward));

        let mut out = Vec::new();
        for item in iter {
            let (raw_key, value) = item?;
            if !raw_key.starts_with(&prefix) {
                // Group changed; stop.
                break;
            }
            out.push(serde_json::from_slice(&value)?);
        }
        Ok(out)
    }
}
