//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `state` - World state (key: chaincode key, value: opaque bytes)
//! - `events` - Append-only event log (key: big-endian sequence number)
//! - `event_ids` - Event id → sequence number

use crate::{
    error::{Error, Result},
    stub::{EventSink, StateStore},
    types::ChaincodeEvent,
    Config,
};
use rocksdb::{
    BlockBasedOptions, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, IteratorMode,
    Options, WriteBatch, DB,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const CF_STATE: &str = "state";
const CF_EVENTS: &str = "events";
const CF_EVENT_IDS: &str = "event_ids";

/// RocksDB-backed world state and event log
pub struct Storage {
    db: Arc<DB>,
    next_seq: AtomicU64,
}

impl Storage {
    /// Open or create the database under `config.data_dir`
    pub fn open(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let families = [
            (CF_STATE, DBCompressionType::Lz4, true),
            (CF_EVENTS, DBCompressionType::Zstd, false),
            (CF_EVENT_IDS, DBCompressionType::Lz4, true),
        ]
        .into_iter()
        .map(|(name, compression, point_lookups)| {
            ColumnFamilyDescriptor::new(name, family_options(compression, point_lookups))
        });

        let db = DB::open_cf_descriptors(&db_opts, &config.data_dir, families)?;

        let storage = Self {
            db: Arc::new(db),
            next_seq: AtomicU64::new(0),
        };
        let next = storage.last_sequence()?.map_or(0, |seq| seq + 1);
        storage.next_seq.store(next, Ordering::SeqCst);

        tracing::info!(path = ?config.data_dir, next_event = next, "Opened RocksDB state store");
        Ok(storage)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Missing column family {}", name)))
    }

    fn last_sequence(&self) -> Result<Option<u64>> {
        let cf = self.cf(CF_EVENTS)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _) = item?;
                Ok(Some(decode_seq(&key)?))
            }
            None => Ok(None),
        }
    }

    /// Append `event` to the log, after every event appended before it
    ///
    /// The sequence number is taken only once the batch is written, so a
    /// failed append leaves no gap. Appends are serialized by the peer actor.
    pub fn append_event(&self, event: &ChaincodeEvent) -> Result<()> {
        let seq = self.next_seq.load(Ordering::SeqCst);
        let value = bincode::serialize(event)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_EVENTS)?, seq.to_be_bytes(), &value);
        batch.put_cf(self.cf(CF_EVENT_IDS)?, event.event_id.as_bytes(), seq.to_be_bytes());
        self.db.write(batch)?;
        self.next_seq.store(seq + 1, Ordering::SeqCst);

        tracing::debug!(
            seq,
            event_id = %event.event_id,
            channel = %event.channel,
            "Event logged"
        );
        Ok(())
    }

    /// Look up a logged event by id
    pub fn get_event(&self, event_id: Uuid) -> Result<ChaincodeEvent> {
        let seq = self
            .db
            .get_cf(self.cf(CF_EVENT_IDS)?, event_id.as_bytes())?
            .ok_or_else(|| Error::KeyNotFound(event_id.to_string()))?;

        let value = self
            .db
            .get_cf(self.cf(CF_EVENTS)?, &seq)?
            .ok_or_else(|| Error::Storage(format!("Event {} indexed but not logged", event_id)))?;

        Ok(bincode::deserialize(&value)?)
    }

    /// All logged events, oldest first
    pub fn events(&self) -> Result<Vec<ChaincodeEvent>> {
        self.db
            .iterator_cf(self.cf(CF_EVENTS)?, IteratorMode::Start)
            .map(|item| -> Result<ChaincodeEvent> {
                let (_, value) = item?;
                Ok(bincode::deserialize(&value)?)
            })
            .collect()
    }

    /// Key counts for monitoring
    pub fn get_stats(&self) -> Result<StorageStats> {
        let state_keys = self
            .db
            .property_int_value_cf(self.cf(CF_STATE)?, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(StorageStats {
            state_keys,
            total_events: self.next_seq.load(Ordering::SeqCst),
        })
    }

    /// Flush and close
    pub fn close(self) -> Result<()> {
        self.db.flush()?;
        drop(self.db);
        tracing::info!("RocksDB closed");
        Ok(())
    }
}

fn family_options(compression: DBCompressionType, point_lookups: bool) -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(compression);
    if point_lookups {
        let mut table = BlockBasedOptions::default();
        table.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&table);
    }
    opts
}

fn decode_seq(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key
        .try_into()
        .map_err(|_| Error::Storage(format!("Corrupt event key of {} bytes", key.len())))?;
    Ok(u64::from_be_bytes(bytes))
}

impl StateStore for Storage {
    fn get_state(&self, key: &str) -> Result<Vec<u8>> {
        self.db
            .get_cf(self.cf(CF_STATE)?, key.as_bytes())?
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.put_cf(self.cf(CF_STATE)?, key.as_bytes(), value)?;
        tracing::debug!(key, bytes = value.len(), "State written");
        Ok(())
    }
}

impl EventSink for Storage {
    fn emit(&self, event: &ChaincodeEvent) -> Result<()> {
        self.append_event(event)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .field("next_seq", &self.next_seq.load(Ordering::Relaxed))
            .finish()
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Approximate number of state keys
    pub state_keys: u64,
    /// Number of logged events
    pub total_events: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxId;
    use tempfile::TempDir;

    fn open_temp() -> (Storage, Config, TempDir) {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), config, dir)
    }

    #[test]
    fn test_column_families_created() {
        let (storage, _, _dir) = open_temp();
        for name in [CF_STATE, CF_EVENTS, CF_EVENT_IDS] {
            assert!(storage.db.cf_handle(name).is_some(), "{}", name);
        }
    }

    #[test]
    fn test_put_and_get_state() {
        let (storage, _, _dir) = open_temp();

        storage.put_state("LA-1", br#"{"id":"LA-1"}"#).unwrap();
        assert_eq!(storage.get_state("LA-1").unwrap(), br#"{"id":"LA-1"}"#);

        storage.put_state("LA-1", b"replaced").unwrap();
        assert_eq!(storage.get_state("LA-1").unwrap(), b"replaced");
    }

    #[test]
    fn test_missing_state_is_not_found() {
        let (storage, _, _dir) = open_temp();
        assert!(storage.get_state("LA-999").unwrap_err().is_not_found());
    }

    #[test]
    fn test_events_keep_append_order() {
        let (storage, _, _dir) = open_temp();
        let tx = TxId::new();

        let logged: Vec<_> = (0..10)
            .map(|i| ChaincodeEvent::new(tx, "evtSender", vec![i]))
            .collect();
        for event in &logged {
            storage.emit(event).unwrap();
        }

        assert_eq!(storage.events().unwrap(), logged);
        assert_eq!(storage.get_event(logged[3].event_id).unwrap(), logged[3]);
        assert_eq!(storage.get_stats().unwrap().total_events, 10);
    }

    #[test]
    fn test_sequence_is_contiguous() {
        let (storage, _, _dir) = open_temp();
        let tx = TxId::new();

        for i in 0..5u8 {
            storage
                .append_event(&ChaincodeEvent::new(tx, "evtSender", vec![i]))
                .unwrap();
        }

        let cf = storage.cf(CF_EVENTS).unwrap();
        let seqs: Vec<u64> = storage
            .db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| decode_seq(&item.unwrap().0).unwrap())
            .collect();
        assert_eq!(seqs, vec![0, 1, 2, 3, 4]);
        assert_eq!(storage.last_sequence().unwrap(), Some(4));
        assert_eq!(storage.get_stats().unwrap().total_events, 5);
    }

    #[test]
    fn test_unknown_event_id() {
        let (storage, _, _dir) = open_temp();
        assert!(storage.get_event(Uuid::new_v4()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_reopen_continues_sequence() {
        let (storage, config, _dir) = open_temp();
        let first = ChaincodeEvent::new(TxId::new(), "evtSender", b"first".to_vec());
        storage.put_state("LA-1", b"v1").unwrap();
        storage.emit(&first).unwrap();
        storage.close().unwrap();

        let storage = Storage::open(&config).unwrap();
        let second = ChaincodeEvent::new(TxId::new(), "evtSender", b"second".to_vec());
        storage.emit(&second).unwrap();

        assert_eq!(storage.get_state("LA-1").unwrap(), b"v1");
        assert_eq!(storage.events().unwrap(), vec![first, second]);
    }
}
