use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::alert::entity::Alert;
use domain::attribute::entity::Attribute;
use domain::report::entity::Report;
use domain::report::error::ReportError;

use crate::dispatch::TaskDispatcher;

/// What happened to one alert delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeOutcome {
    pub report: Report,
    /// Attributes published as new tasks, in alert order.
    pub dispatched: Vec<Attribute>,
    /// Attributes skipped because they were already scheduled.
    pub duplicates: usize,
}

/// Entry point for alerts: correlates them to a report, stages a snapshot,
/// and fans out one task per not-yet-scheduled attribute.
///
/// Every step is idempotent or dedup-guarded, so a failed delivery may be
/// redelivered from the start.
pub struct AlertIntake {
    dispatcher: Arc<TaskDispatcher>,
}

impl AlertIntake {
    pub fn new(dispatcher: Arc<TaskDispatcher>) -> Self {
        Self { dispatcher }
    }

    pub async fn receive_alert(
        &self,
        alert: &Alert,
        now: DateTime<Utc>,
    ) -> Result<IntakeOutcome, ReportError> {
        alert.validate()?;

        let repository = self.dispatcher.repository();
        let report = repository.take_report(alert, now)?;
        repository.save_alert_cache(&report.id, alert, now)?;

        let mut dispatched = Vec::new();
        let mut duplicates = 0;
        for attribute in &alert.attributes {
            if self.dispatcher.dispatch(&report.id, attribute, now).await? {
                dispatched.push(attribute.clone());
            } else {
                duplicates += 1;
            }
        }

        tracing::info!(
            report_id = %report.id,
            status = %report.status,
            detector = %alert.detector,
            rule_id = %alert.rule_id,
            dispatched = dispatched.len(),
            duplicates,
            "alert received"
        );
        Ok(IntakeOutcome {
            report,
            dispatched,
            duplicates,
        })
    }
}
