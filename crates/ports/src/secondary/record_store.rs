use domain::record::entity::Record;
use domain::record::error::StoreError;

/// Write precondition for [`RecordStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Unconditional write; replaces any record stored at the same key.
    Always,
    /// Atomic create-if-absent. Fails with [`StoreError::AlreadyExists`]
    /// when a live record occupies the key. A record whose `expires_at` is
    /// before `now` (unix seconds) counts as absent.
    IfAbsent { now: i64 },
}

/// Key/value record storage keyed by `(pkey, skey)`.
///
/// `PutCondition::IfAbsent` must be linearizable per key: across any number
/// of concurrent callers, exactly one conditional write for a given key
/// succeeds. Deduplication in the application layer relies on nothing else.
///
/// Expiry is advisory: implementations may keep returning expired records
/// from `get` and `scan` until they are garbage-collected.
pub trait RecordStore: Send + Sync {
    /// Write a record, subject to `condition`.
    fn put(&self, record: &Record, condition: PutCondition) -> Result<(), StoreError>;

    /// Fetch the record stored at `(pkey, skey)`.
    fn get(&self, pkey: &str, skey: &str) -> Result<Option<Record>, StoreError>;

    /// Every record under the partition `pkey`, ordered by sort key.
    fn scan(&self, pkey: &str) -> Result<Vec<Record>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullStore;

    impl RecordStore for NullStore {
        fn put(&self, _record: &Record, _condition: PutCondition) -> Result<(), StoreError> {
            Ok(())
        }

        fn get(&self, _pkey: &str, _skey: &str) -> Result<Option<Record>, StoreError> {
            Ok(None)
        }

        fn scan(&self, _pkey: &str) -> Result<Vec<Record>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn record_store_is_dyn_compatible() {
        let store: Box<dyn RecordStore> = Box::new(NullStore);
        assert!(store.get("p", "s").unwrap().is_none());
        assert!(store.scan("p").unwrap().is_empty());
    }

    #[test]
    fn put_condition_is_copy() {
        let c = PutCondition::IfAbsent { now: 10 };
        let d = c;
        assert_eq!(c, d);
        assert_ne!(c, PutCondition::Always);
    }
}
