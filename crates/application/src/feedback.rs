use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::report::entity::ReportSection;
use domain::report::error::ReportError;
use domain::task::entity::Task;

use crate::codec::decode_message;
use crate::dispatch::TaskDispatcher;

/// Consumes inspector output from the content and attribute queues.
///
/// Content messages are staged as report sections. Attribute messages go
/// through the dedup cache and are re-dispatched only on first sight.
pub struct FeedbackService {
    dispatcher: Arc<TaskDispatcher>,
}

impl FeedbackService {
    pub fn new(dispatcher: Arc<TaskDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Stage one content-queue message.
    pub fn accept_content(&self, payload: &[u8], now: DateTime<Utc>) -> Result<ReportSection, ReportError> {
        let section: ReportSection = decode_message(payload, "content message")?;
        self.dispatcher
            .repository()
            .save_report_section(&section, now)?;
        Ok(section)
    }

    /// Gate one attribute-queue message; returns whether a task was
    /// published for it.
    pub async fn accept_attribute(
        &self,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<bool, ReportError> {
        let task: Task = decode_message(payload, "attribute message")?;
        self.dispatcher
            .dispatch(&task.report_id, &task.attribute, now)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use domain::attribute::entity::{AttrType, Attribute};
    use domain::common::entity::ReportId;
    use domain::report::entity::{ReportContent, ReportHost};
    use ports::test_utils::{MemoryRecordStore, NoopMetrics, RecordingQueue};

    use crate::repository_service::RepositoryService;

    fn service(queue: Arc<RecordingQueue>) -> FeedbackService {
        let repository = Arc::new(RepositoryService::new(
            Arc::new(MemoryRecordStore::new()),
            Duration::from_secs(600),
            Arc::new(NoopMetrics),
        ));
        FeedbackService::new(Arc::new(TaskDispatcher::new(
            repository,
            queue,
            "task-q",
            Arc::new(NoopMetrics),
        )))
    }

    #[test]
    fn content_message_is_staged() {
        let svc = service(Arc::new(RecordingQueue::new()));
        let section = ReportSection {
            report_id: ReportId::from("R"),
            author: "hostInspector".to_string(),
            attribute: Attribute::new(AttrType::IpAddr, "dst", "10.0.0.1"),
            content: ReportContent::Host(ReportHost {
                host_name: vec!["db01".to_string()],
                ..Default::default()
            }),
        };
        let payload = serde_json::to_vec(&section).unwrap();

        svc.accept_content(&payload, Utc::now()).unwrap();
        let staged = svc
            .dispatcher
            .repository()
            .fetch_report_section(&ReportId::from("R"))
            .unwrap();
        assert_eq!(staged, vec![section]);
    }

    #[test]
    fn malformed_content_is_rejected() {
        let svc = service(Arc::new(RecordingQueue::new()));
        let err = svc.accept_content(b"{\"report_id\":\"R\"}", Utc::now()).unwrap_err();
        assert!(matches!(err, ReportError::Decode { .. }));
    }

    #[tokio::test]
    async fn same_attribute_from_two_inspectors_dispatches_once() {
        let queue = Arc::new(RecordingQueue::new());
        let svc = service(queue.clone());
        let task = Task {
            report_id: ReportId::from("R"),
            attribute: Attribute::new(AttrType::IpAddr, "resolved", "93.184.216.34"),
        };
        let payload = serde_json::to_vec(&task).unwrap();

        assert!(svc.accept_attribute(&payload, Utc::now()).await.unwrap());
        assert!(!svc.accept_attribute(&payload, Utc::now()).await.unwrap());
        assert_eq!(queue.payloads_for("task-q"), vec![payload]);
    }
}
