use serde::{Deserialize, Serialize};

use crate::attribute::entity::Attribute;
use crate::common::entity::ReportId;
use crate::report::entity::ReportContent;

/// Unit of dispatched work. Also the wire shape of attribute-queue and
/// task-queue messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub report_id: ReportId,
    pub attribute: Attribute,
}

/// Output of one inspector invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub contents: Vec<ReportContent>,
    #[serde(default)]
    pub new_attributes: Vec<Attribute>,
}

impl TaskResult {
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty() && self.new_attributes.is_empty()
    }
}

/// Per-invocation context handed to an inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    pub report_id: ReportId,
}
