use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attribute::entity::Attribute;
use crate::common::entity::ReportId;

/// Whether a correlation call created the report or joined an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// This call created the alert entry.
    New,
    /// The alert was redelivered; the existing report id is reused.
    More,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::More => "more",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of correlating an alert. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

// ── Report content ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_addr: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub principal: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub action: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalwareScan {
    pub vendor: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Malware {
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scans: Vec<MalwareScan>,
    /// How the sample relates to the attribute (e.g. `communicated`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHost {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addr: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub as_owner: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mac_addr: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_name: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_malware: Vec<Malware>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportUser {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBinary {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_malware: Vec<Malware>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub software: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub os: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
}

/// One unit of inspector output. The variant tag survives serialization:
/// `{"type": "host", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ReportContent {
    Host(ReportHost),
    User(ReportUser),
    Binary(ReportBinary),
}

impl ReportContent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Host(_) => "host",
            Self::User(_) => "user",
            Self::Binary(_) => "binary",
        }
    }
}

/// Content produced by one inspector for one attribute of a report. This is
/// also the content-queue message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub report_id: ReportId,
    pub author: String,
    pub attribute: Attribute,
    pub content: ReportContent,
}
