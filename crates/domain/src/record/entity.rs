use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::entity::{AttrContext, AttrType};
use crate::common::entity::ReportId;

/// Envelope shared by every stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordBase {
    pub pkey: String,
    pub skey: String,
    /// Unix seconds after which the store may garbage-collect the record.
    pub expires_at: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPayload {
    /// Alert identity → report id mapping. Written once, never mutated.
    AlertEntry { report_id: ReportId },
    /// JSON snapshot of one alert delivery.
    AlertCache { alert_data: String },
    /// JSON-encoded report section.
    ReportSection { data: String },
    /// One deduplicated attribute of a report.
    AttributeCache {
        timestamp: DateTime<Utc>,
        attr_type: AttrType,
        attr_key: String,
        attr_value: String,
        #[serde(default)]
        attr_context: Vec<AttrContext>,
    },
}

impl RecordPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlertEntry { .. } => "alert_entry",
            Self::AlertCache { .. } => "alert_cache",
            Self::ReportSection { .. } => "report_section",
            Self::AttributeCache { .. } => "attribute_cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(flatten)]
    pub base: RecordBase,
    pub payload: RecordPayload,
}

impl Record {
    pub fn pkey(&self) -> &str {
        &self.base.pkey
    }

    pub fn skey(&self) -> &str {
        &self.base.skey
    }

    /// `true` once `now` (unix seconds) is past the record's expiry.
    pub fn is_expired(&self, now: i64) -> bool {
        self.base.expires_at < now
    }
}
