//! Partition and sort key layout for every record kind.

use uuid::Uuid;

use crate::attribute::entity::Attribute;
use crate::common::entity::ReportId;

/// Sort key of every alert entry. Constant so that the partition key alone
/// identifies the alert.
pub const ALERT_ENTRY_SORT_KEY: &str = "Fixed";

pub fn alert_entry_key(alert_id: &str) -> (String, String) {
    (
        format!("alertmap/{alert_id}"),
        ALERT_ENTRY_SORT_KEY.to_string(),
    )
}

pub fn alert_cache_partition(report_id: &ReportId) -> String {
    format!("alert/{report_id}")
}

/// Fresh key for a new alert snapshot row.
pub fn alert_cache_key(report_id: &ReportId) -> (String, String) {
    (
        alert_cache_partition(report_id),
        format!("cache/{}", Uuid::new_v4()),
    )
}

pub fn report_section_partition(report_id: &ReportId) -> String {
    format!("content/{report_id}")
}

/// Fresh key for a new section row. Sections for the same attribute share
/// the hash prefix.
pub fn report_section_key(report_id: &ReportId, attribute: &Attribute) -> (String, String) {
    (
        report_section_partition(report_id),
        format!("{}/{}", attribute.hash(), Uuid::new_v4()),
    )
}

pub fn attribute_cache_partition(report_id: &ReportId) -> String {
    format!("attribute/{report_id}")
}

pub fn attribute_cache_key(report_id: &ReportId, attribute: &Attribute) -> (String, String) {
    (attribute_cache_partition(report_id), attribute.hash())
}
