use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use domain::record::entity::Record;
use domain::record::error::StoreError;
use domain::task::error::QueueError;

use crate::secondary::metrics_port::{AttributeMetrics, DispatchMetrics, ReportMetrics};
use crate::secondary::record_store::{PutCondition, RecordStore};
use crate::secondary::task_queue::TaskQueue;

/// No-op implementation of all metrics sub-traits for use in tests.
///
/// All methods inherit the default no-op implementations from the sub-traits.
pub struct NoopMetrics;

impl ReportMetrics for NoopMetrics {}
impl AttributeMetrics for NoopMetrics {}
impl DispatchMetrics for NoopMetrics {}

/// In-memory record store. A single mutex makes conditional writes atomic.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<(String, String), Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryRecordStore {
    fn put(&self, record: &Record, condition: PutCondition) -> Result<(), StoreError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        let key = (record.pkey().to_string(), record.skey().to_string());
        if let PutCondition::IfAbsent { now } = condition
            && let Some(existing) = records.get(&key)
            && !existing.is_expired(now)
        {
            return Err(StoreError::AlreadyExists {
                pkey: key.0,
                skey: key.1,
            });
        }
        records.insert(key, record.clone());
        Ok(())
    }

    fn get(&self, pkey: &str, skey: &str) -> Result<Option<Record>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        Ok(records
            .get(&(pkey.to_string(), skey.to_string()))
            .cloned())
    }

    fn scan(&self, pkey: &str) -> Result<Vec<Record>, StoreError> {
        let records = self
            .records
            .lock()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))?;
        Ok(records
            .iter()
            .filter(|((pk, _), _)| pk == pkey)
            .map(|(_, r)| r.clone())
            .collect())
    }
}

/// Record store whose every operation fails with a backend error.
pub struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn put(&self, _record: &Record, _condition: PutCondition) -> Result<(), StoreError> {
        Err(StoreError::Backend("store unavailable".to_string()))
    }

    fn get(&self, _pkey: &str, _skey: &str) -> Result<Option<Record>, StoreError> {
        Err(StoreError::Backend("store unavailable".to_string()))
    }

    fn scan(&self, _pkey: &str) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Backend("store unavailable".to_string()))
    }
}

/// Queue that records every published `(queue, payload)` in order.
#[derive(Default)]
pub struct RecordingQueue {
    messages: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Payloads published to `queue`, in publish order.
    pub fn payloads_for(&self, queue: &str) -> Vec<Vec<u8>> {
        self.messages()
            .into_iter()
            .filter(|(q, _)| q == queue)
            .map(|(_, p)| p)
            .collect()
    }
}

impl TaskQueue for RecordingQueue {
    fn publish<'a>(
        &'a self,
        queue: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        Box::pin(async move {
            self.messages
                .lock()
                .map_err(|e| QueueError::Unavailable(format!("lock poisoned: {e}")))?
                .push((queue.to_string(), payload.to_vec()));
            Ok(())
        })
    }
}

/// Queue that rejects every publish to `failing_queue` and records the rest.
pub struct FailingQueue {
    failing_queue: String,
    inner: RecordingQueue,
}

impl FailingQueue {
    pub fn new(failing_queue: &str) -> Self {
        Self {
            failing_queue: failing_queue.to_string(),
            inner: RecordingQueue::new(),
        }
    }

    pub fn messages(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.messages()
    }
}

impl TaskQueue for FailingQueue {
    fn publish<'a>(
        &'a self,
        queue: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        if queue == self.failing_queue {
            return Box::pin(async move {
                Err(QueueError::Unavailable(format!("{queue} is down")))
            });
        }
        self.inner.publish(queue, payload)
    }
}
