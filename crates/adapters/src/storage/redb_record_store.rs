use std::path::Path;

use domain::record::entity::Record;
use domain::record::error::StoreError;
use ports::secondary::record_store::{PutCondition, RecordStore};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};

/// redb table: key = `pkey \0 skey`, value = JSON-serialized `Record`.
const RECORD_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

const KEY_SEPARATOR: char = '\0';

fn table_key(pkey: &str, skey: &str) -> String {
    format!("{pkey}{KEY_SEPARATOR}{skey}")
}

fn partition_prefix(pkey: &str) -> String {
    format!("{pkey}{KEY_SEPARATOR}")
}

/// Embedded record store backed by redb.
///
/// redb allows a single write transaction at a time, so the existence
/// check and insert of a conditional put happen inside one transaction
/// and are atomic with respect to every other writer of the database.
/// Expired records stay on disk until `purge_expired` removes them; until
/// then they are returned by `get`/`scan` but treated as absent by
/// conditional puts.
pub struct RedbRecordStore {
    db: Database,
}

impl RedbRecordStore {
    /// Open (or create) a redb database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = Database::create(path)
            .map_err(|e| StoreError::Backend(format!("redb open failed: {e}")))?;

        // Ensure the table exists.
        let txn = db
            .begin_write()
            .map_err(|e| StoreError::Backend(format!("redb txn begin: {e}")))?;
        {
            let _table = txn
                .open_table(RECORD_TABLE)
                .map_err(|e| StoreError::Backend(format!("redb table create: {e}")))?;
        }
        txn.commit()
            .map_err(|e| StoreError::Backend(format!("redb commit: {e}")))?;

        Ok(Self { db })
    }

    /// Delete every record whose `expires_at` is before `now`. Rows that
    /// cannot be decoded are left in place. Returns the number removed.
    pub fn purge_expired(&self, now: i64) -> Result<usize, StoreError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(format!("redb purge txn: {e}")))?;
        let removed = {
            let mut table = txn
                .open_table(RECORD_TABLE)
                .map_err(|e| StoreError::Backend(format!("redb purge table: {e}")))?;

            let mut expired = Vec::new();
            for entry in table
                .iter()
                .map_err(|e| StoreError::Backend(format!("redb purge iter: {e}")))?
            {
                let (k, v) =
                    entry.map_err(|e| StoreError::Backend(format!("redb purge read: {e}")))?;
                match serde_json::from_slice::<Record>(v.value()) {
                    Ok(record) if record.is_expired(now) => expired.push(k.value().to_string()),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(key = %k.value().escape_debug(), error = %e, "skipping undecodable record");
                    }
                }
            }

            for key in &expired {
                table
                    .remove(key.as_str())
                    .map_err(|e| StoreError::Backend(format!("redb purge remove: {e}")))?;
            }
            expired.len()
        };
        txn.commit()
            .map_err(|e| StoreError::Backend(format!("redb purge commit: {e}")))?;

        tracing::info!(removed, now, "expired records purged");
        Ok(removed)
    }

    /// Total number of stored rows, expired ones included.
    pub fn record_count(&self) -> Result<u64, StoreError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Backend(format!("redb read txn: {e}")))?;
        let table = txn
            .open_table(RECORD_TABLE)
            .map_err(|e| StoreError::Backend(format!("redb read table: {e}")))?;
        table
            .len()
            .map_err(|e| StoreError::Backend(format!("redb len: {e}")))
    }
}

/// Decode a stored row. Failures carry the table key and the raw row.
fn decode(key: &str, bytes: &[u8]) -> Result<Record, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
        data: String::from_utf8_lossy(bytes).into_owned(),
    })
}

impl RecordStore for RedbRecordStore {
    fn put(&self, record: &Record, condition: PutCondition) -> Result<(), StoreError> {
        let key = table_key(record.pkey(), record.skey());
        let value = serde_json::to_vec(record)
            .map_err(|e| StoreError::Backend(format!("serialize record: {e}")))?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::Backend(format!("redb write txn: {e}")))?;
        {
            let mut table = txn
                .open_table(RECORD_TABLE)
                .map_err(|e| StoreError::Backend(format!("redb write table: {e}")))?;

            if let PutCondition::IfAbsent { now } = condition {
                let existing = table
                    .get(key.as_str())
                    .map_err(|e| StoreError::Backend(format!("redb get: {e}")))?;
                // An undecodable row counts as present: never overwrite it.
                let live = match existing {
                    Some(guard) => decode(&key, guard.value()).map_or(true, |r| !r.is_expired(now)),
                    None => false,
                };
                if live {
                    return Err(StoreError::AlreadyExists {
                        pkey: record.pkey().to_string(),
                        skey: record.skey().to_string(),
                    });
                }
            }

            table
                .insert(key.as_str(), value.as_slice())
                .map_err(|e| StoreError::Backend(format!("redb insert: {e}")))?;
        }
        txn.commit()
            .map_err(|e| StoreError::Backend(format!("redb write commit: {e}")))?;
        Ok(())
    }

    fn get(&self, pkey: &str, skey: &str) -> Result<Option<Record>, StoreError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Backend(format!("redb read txn: {e}")))?;
        let table = txn
            .open_table(RECORD_TABLE)
            .map_err(|e| StoreError::Backend(format!("redb read table: {e}")))?;

        let key = table_key(pkey, skey);
        let result = table
            .get(key.as_str())
            .map_err(|e| StoreError::Backend(format!("redb get: {e}")))?;

        match result {
            Some(guard) => Ok(Some(decode(&key, guard.value())?)),
            None => Ok(None),
        }
    }

    fn scan(&self, pkey: &str) -> Result<Vec<Record>, StoreError> {
        let prefix = partition_prefix(pkey);
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::Backend(format!("redb read txn: {e}")))?;
        let table = txn
            .open_table(RECORD_TABLE)
            .map_err(|e| StoreError::Backend(format!("redb read table: {e}")))?;

        let mut records = Vec::new();
        for entry in table
            .range(prefix.as_str()..)
            .map_err(|e| StoreError::Backend(format!("redb range: {e}")))?
        {
            let (k, v) = entry.map_err(|e| StoreError::Backend(format!("redb scan: {e}")))?;
            if !k.value().starts_with(&prefix) {
                break;
            }
            records.push(decode(k.value(), v.value())?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::common::entity::ReportId;
    use domain::record::entity::{RecordBase, RecordPayload};
    use tempfile::NamedTempFile;

    fn make_store() -> (RedbRecordStore, NamedTempFile) {
        let tmp = NamedTempFile::new().unwrap();
        let store = RedbRecordStore::open(tmp.path()).unwrap();
        (store, tmp)
    }

    fn make_record(pkey: &str, skey: &str, expires_at: i64, report_id: &str) -> Record {
        Record {
            base: RecordBase {
                pkey: pkey.to_string(),
                skey: skey.to_string(),
                expires_at,
                created_at: Utc::now(),
            },
            payload: RecordPayload::AlertEntry {
                report_id: ReportId::from(report_id),
            },
        }
    }

    #[test]
    fn put_and_get() {
        let (store, _tmp) = make_store();
        let rec = make_record("alertmap/x", "Fixed", 100, "r-1");
        store.put(&rec, PutCondition::Always).unwrap();
        assert_eq!(store.get("alertmap/x", "Fixed").unwrap(), Some(rec));
        assert!(store.get("alertmap/y", "Fixed").unwrap().is_none());
    }

    #[test]
    fn conditional_put_rejects_live_record() {
        let (store, _tmp) = make_store();
        let cond = PutCondition::IfAbsent { now: 10 };
        store.put(&make_record("p", "s", 100, "r-1"), cond).unwrap();

        let err = store.put(&make_record("p", "s", 100, "r-2"), cond).unwrap_err();
        assert!(err.is_already_exists());
        match store.get("p", "s").unwrap().unwrap().payload {
            RecordPayload::AlertEntry { report_id } => assert_eq!(report_id.as_str(), "r-1"),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn conditional_put_replaces_expired_record() {
        let (store, _tmp) = make_store();
        store
            .put(&make_record("p", "s", 5, "old"), PutCondition::Always)
            .unwrap();
        store
            .put(&make_record("p", "s", 100, "new"), PutCondition::IfAbsent { now: 6 })
            .unwrap();
        assert_eq!(store.get("p", "s").unwrap().unwrap().base.expires_at, 100);
    }

    #[test]
    fn unconditional_put_overwrites() {
        let (store, _tmp) = make_store();
        store
            .put(&make_record("p", "s", 100, "a"), PutCondition::Always)
            .unwrap();
        store
            .put(&make_record("p", "s", 200, "b"), PutCondition::Always)
            .unwrap();
        assert_eq!(store.get("p", "s").unwrap().unwrap().base.expires_at, 200);
    }

    #[test]
    fn scan_is_partition_scoped_and_ordered() {
        let (store, _tmp) = make_store();
        for (pkey, skey) in [("content/r", "b"), ("content/r", "a"), ("content/rr", "a"), ("content/", "z")] {
            store
                .put(&make_record(pkey, skey, 100, "r"), PutCondition::Always)
                .unwrap();
        }
        let rows = store.scan("content/r").unwrap();
        let skeys: Vec<&str> = rows.iter().map(Record::skey).collect();
        assert_eq!(skeys, vec!["a", "b"]);
        assert!(store.scan("content/x").unwrap().is_empty());
    }

    #[test]
    fn concurrent_conditional_puts_have_single_winner() {
        let (store, _tmp) = make_store();
        let wins = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let store = &store;
                    s.spawn(move || {
                        store
                            .put(
                                &make_record("alertmap/a", "Fixed", 100, &format!("r-{i}")),
                                PutCondition::IfAbsent { now: 0 },
                            )
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });
        assert_eq!(wins, 1);
    }

    #[test]
    fn purge_removes_only_expired() {
        let (store, _tmp) = make_store();
        store
            .put(&make_record("p", "old", 5, "r"), PutCondition::Always)
            .unwrap();
        store
            .put(&make_record("p", "edge", 10, "r"), PutCondition::Always)
            .unwrap();
        store
            .put(&make_record("p", "new", 50, "r"), PutCondition::Always)
            .unwrap();

        assert_eq!(store.purge_expired(10).unwrap(), 1);
        assert_eq!(store.record_count().unwrap(), 2);
        assert!(store.get("p", "old").unwrap().is_none());
        assert!(store.get("p", "edge").unwrap().is_some());
    }

    fn insert_raw(store: &RedbRecordStore, pkey: &str, skey: &str, value: &[u8]) {
        let txn = store.db.begin_write().unwrap();
        {
            let mut table = txn.open_table(RECORD_TABLE).unwrap();
            table.insert(table_key(pkey, skey).as_str(), value).unwrap();
        }
        txn.commit().unwrap();
    }

    #[test]
    fn scan_reports_undecodable_row_with_raw_bytes() {
        let (store, _tmp) = make_store();
        store
            .put(&make_record("content/r", "a", 100, "r"), PutCondition::Always)
            .unwrap();
        insert_raw(&store, "content/r", "b", b"{garbage \xff");

        match store.scan("content/r").unwrap_err() {
            StoreError::Corrupt { key, data, .. } => {
                assert_eq!(key, table_key("content/r", "b"));
                assert_eq!(data, "{garbage \u{fffd}");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Other partitions are unaffected.
        assert!(store.scan("content/x").unwrap().is_empty());
    }

    #[test]
    fn get_reports_undecodable_row() {
        let (store, _tmp) = make_store();
        insert_raw(&store, "p", "s", b"not json");
        let err = store.get("p", "s").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref data, .. } if data == "not json"));
    }

    #[test]
    fn conditional_put_keeps_undecodable_row() {
        let (store, _tmp) = make_store();
        insert_raw(&store, "p", "s", b"not json");
        let err = store
            .put(&make_record("p", "s", 100, "r"), PutCondition::IfAbsent { now: 0 })
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[test]
    fn data_survives_reopen() {
        let tmp = NamedTempFile::new().unwrap();
        {
            let store = RedbRecordStore::open(tmp.path()).unwrap();
            store
                .put(&make_record("p", "s", 100, "r"), PutCondition::Always)
                .unwrap();
        }
        let store = RedbRecordStore::open(tmp.path()).unwrap();
        assert!(store.get("p", "s").unwrap().is_some());
    }
}
