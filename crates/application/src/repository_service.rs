use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::alert::entity::Alert;
use domain::attribute::entity::Attribute;
use domain::common::entity::ReportId;
use domain::record::entity::{Record, RecordBase, RecordPayload};
use domain::record::error::StoreError;
use domain::record::keys::{
    alert_cache_key, alert_cache_partition, alert_entry_key, attribute_cache_key,
    attribute_cache_partition, report_section_key, report_section_partition,
};
use domain::report::entity::{Report, ReportSection, ReportStatus};
use domain::report::error::ReportError;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::record_store::{PutCondition, RecordStore};

use crate::codec::{decode_record, encode_string};

/// Correlates alerts into reports and stages enrichment results.
///
/// Stateless apart from its injected store: every method is safe to call
/// concurrently from unrelated processes. Deduplication relies solely on the
/// store's atomic `PutCondition::IfAbsent`.
pub struct RepositoryService {
    store: Arc<dyn RecordStore>,
    ttl: Duration,
    metrics: Arc<dyn MetricsPort>,
}

impl RepositoryService {
    pub fn new(store: Arc<dyn RecordStore>, ttl: Duration, metrics: Arc<dyn MetricsPort>) -> Self {
        Self {
            store,
            ttl,
            metrics,
        }
    }

    fn base(&self, (pkey, skey): (String, String), now: DateTime<Utc>) -> RecordBase {
        RecordBase {
            pkey,
            skey,
            expires_at: expires_at(now, self.ttl),
            created_at: now,
        }
    }

    // ── Alert entry: alert identity → report id ────────────────────

    /// Map `alert` to its report, creating the report on first sight.
    ///
    /// Exactly one of any number of concurrent calls for the same alert
    /// identity returns `ReportStatus::New`; the others return
    /// `ReportStatus::More` with the winner's report id.
    pub fn take_report(&self, alert: &Alert, now: DateTime<Utc>) -> Result<Report, ReportError> {
        let alert_id = alert.alert_id();
        let report_id = ReportId::generate();
        let entry = Record {
            base: self.base(alert_entry_key(&alert_id), now),
            payload: RecordPayload::AlertEntry {
                report_id: report_id.clone(),
            },
        };

        match self.store.put(
            &entry,
            PutCondition::IfAbsent {
                now: now.timestamp(),
            },
        ) {
            Ok(()) => {
                tracing::info!(%alert_id, %report_id, "new report created");
                self.metrics.record_report(ReportStatus::New.as_str());
                Ok(Report {
                    id: report_id,
                    status: ReportStatus::New,
                    created_at: now,
                })
            }
            Err(StoreError::AlreadyExists { .. }) => {
                let existing = self.existing_entry(&alert_id, entry.pkey(), entry.skey())?;
                tracing::debug!(%alert_id, report_id = %existing.id, "alert joined existing report");
                self.metrics.record_report(ReportStatus::More.as_str());
                Ok(existing)
            }
            Err(source) => Err(ReportError::Store {
                op: "put",
                context: format!("alert_id={alert_id}"),
                source,
            }),
        }
    }

    fn existing_entry(&self, alert_id: &str, pkey: &str, skey: &str) -> Result<Report, ReportError> {
        let context = || format!("alert_id={alert_id}");
        let record = self
            .store
            .get(pkey, skey)
            .map_err(|source| ReportError::Store {
                op: "get",
                context: context(),
                source,
            })?
            .ok_or_else(|| ReportError::Store {
                op: "get",
                context: context(),
                source: StoreError::Backend(
                    "alert entry missing after conditional write conflict".to_string(),
                ),
            })?;

        match record.payload {
            RecordPayload::AlertEntry { report_id } => Ok(Report {
                id: report_id,
                status: ReportStatus::More,
                created_at: record.base.created_at,
            }),
            other => Err(ReportError::CorruptRecord {
                what: "alert_entry",
                reason: format!("unexpected payload kind '{}'", other.kind()),
                data: format!("{pkey}/{skey}"),
            }),
        }
    }

    // ── Alert cache: one snapshot per delivery ─────────────────────

    /// Append a snapshot of `alert` to the report. Never overwrites.
    pub fn save_alert_cache(
        &self,
        report_id: &ReportId,
        alert: &Alert,
        now: DateTime<Utc>,
    ) -> Result<(), ReportError> {
        let alert_data = encode_string(alert, "alert")?;
        let record = Record {
            base: self.base(alert_cache_key(report_id), now),
            payload: RecordPayload::AlertCache { alert_data },
        };
        self.store
            .put(&record, PutCondition::Always)
            .map_err(|source| ReportError::Store {
                op: "put",
                context: format!("report_id={report_id} alert_id={}", alert.alert_id()),
                source,
            })?;
        self.metrics.record_staged("alert_cache");
        tracing::debug!(%report_id, skey = record.skey(), "alert snapshot staged");
        Ok(())
    }

    /// Every alert snapshot of the report. Aborts on the first corrupt row.
    pub fn fetch_alert_cache(&self, report_id: &ReportId) -> Result<Vec<Alert>, ReportError> {
        let records = self.scan(&alert_cache_partition(report_id), report_id, "alert_cache")?;
        records
            .into_iter()
            .map(|record| match record.payload {
                RecordPayload::AlertCache { alert_data } => {
                    decode_record(&alert_data, "alert_cache")
                }
                other => Err(unexpected_payload("alert_cache", &other)),
            })
            .collect()
    }

    // ── Report sections: inspector output ──────────────────────────

    /// Append an inspector section to its report.
    pub fn save_report_section(
        &self,
        section: &ReportSection,
        now: DateTime<Utc>,
    ) -> Result<(), ReportError> {
        let data = encode_string(section, "report section")?;
        let record = Record {
            base: self.base(
                report_section_key(&section.report_id, &section.attribute),
                now,
            ),
            payload: RecordPayload::ReportSection { data },
        };
        self.store
            .put(&record, PutCondition::Always)
            .map_err(|source| ReportError::Store {
                op: "put",
                context: format!(
                    "report_id={} author={}",
                    section.report_id, section.author
                ),
                source,
            })?;
        self.metrics.record_staged("report_section");
        tracing::debug!(
            report_id = %section.report_id,
            author = %section.author,
            kind = section.content.kind(),
            "report section staged"
        );
        Ok(())
    }

    /// Every section of the report. Aborts on the first corrupt row.
    pub fn fetch_report_section(
        &self,
        report_id: &ReportId,
    ) -> Result<Vec<ReportSection>, ReportError> {
        let records = self.scan(&report_section_partition(report_id), report_id, "report_section")?;
        records
            .into_iter()
            .map(|record| match record.payload {
                RecordPayload::ReportSection { data } => decode_record(&data, "report_section"),
                other => Err(unexpected_payload("report_section", &other)),
            })
            .collect()
    }

    // ── Attribute cache: at most one dispatch per attribute ────────

    /// Register `attribute` for the report.
    ///
    /// Returns `Ok(true)` when this call created the entry and the caller
    /// should dispatch the attribute, `Ok(false)` when it was already
    /// scheduled. A missing attribute timestamp defaults to `now`.
    pub fn put_attribute_cache(
        &self,
        report_id: &ReportId,
        attribute: &Attribute,
        now: DateTime<Utc>,
    ) -> Result<bool, ReportError> {
        let record = Record {
            base: self.base(attribute_cache_key(report_id, attribute), now),
            payload: RecordPayload::AttributeCache {
                timestamp: attribute.timestamp.unwrap_or(now),
                attr_type: attribute.attr_type,
                attr_key: attribute.key.clone(),
                attr_value: attribute.value.clone(),
                attr_context: attribute.context.clone(),
            },
        };

        match self.store.put(
            &record,
            PutCondition::IfAbsent {
                now: now.timestamp(),
            },
        ) {
            Ok(()) => {
                self.metrics
                    .record_attribute_cached(attribute.attr_type.as_str());
                Ok(true)
            }
            Err(StoreError::AlreadyExists { .. }) => {
                tracing::debug!(
                    %report_id,
                    attr_type = %attribute.attr_type,
                    attr_key = %attribute.key,
                    "attribute already scheduled"
                );
                self.metrics
                    .record_attribute_duplicate(attribute.attr_type.as_str());
                Ok(false)
            }
            Err(source) => Err(ReportError::Store {
                op: "put",
                context: format!(
                    "report_id={report_id} attribute={}:{}={}",
                    attribute.attr_type, attribute.key, attribute.value
                ),
                source,
            }),
        }
    }

    /// Every attribute cached for the report, timestamps always set.
    pub fn fetch_attribute_cache(
        &self,
        report_id: &ReportId,
    ) -> Result<Vec<Attribute>, ReportError> {
        let records = self.scan(&attribute_cache_partition(report_id), report_id, "attribute_cache")?;
        records
            .into_iter()
            .map(|record| match record.payload {
                RecordPayload::AttributeCache {
                    timestamp,
                    attr_type,
                    attr_key,
                    attr_value,
                    attr_context,
                } => Ok(Attribute {
                    attr_type,
                    key: attr_key,
                    value: attr_value,
                    context: attr_context,
                    timestamp: Some(timestamp),
                }),
                other => Err(unexpected_payload("attribute_cache", &other)),
            })
            .collect()
    }

    /// Every record in the partition. A row the store cannot decode aborts
    /// the scan as `CorruptRecord` with the raw row attached.
    fn scan(
        &self,
        pkey: &str,
        report_id: &ReportId,
        what: &'static str,
    ) -> Result<Vec<Record>, ReportError> {
        self.store.scan(pkey).map_err(|source| match source {
            StoreError::Corrupt { key, reason, data } => ReportError::CorruptRecord {
                what,
                reason: format!("{reason} (key: {})", key.escape_debug()),
                data,
            },
            source => ReportError::Store {
                op: "scan",
                context: format!("report_id={report_id} partition={pkey}"),
                source,
            },
        })
    }
}

/// Expiry for a record written at `now`. Saturates at `i64::MAX` so an
/// oversized TTL never yields a record that is already expired.
fn expires_at(now: DateTime<Utc>, ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|secs| now.timestamp().checked_add(secs))
        .unwrap_or(i64::MAX)
}

fn unexpected_payload(what: &'static str, payload: &RecordPayload) -> ReportError {
    ReportError::CorruptRecord {
        what,
        reason: format!("unexpected payload kind '{}'", payload.kind()),
        data: serde_json::to_string(payload).unwrap_or_default(),
    }
}
