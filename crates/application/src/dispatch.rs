use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::attribute::entity::Attribute;
use domain::common::entity::ReportId;
use domain::report::error::{QueueRole, ReportError};
use domain::task::entity::Task;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::task_queue::TaskQueue;

use crate::codec::encode;
use crate::repository_service::RepositoryService;

/// Publishes inspection tasks, gated by the attribute dedup cache.
pub struct TaskDispatcher {
    repository: Arc<RepositoryService>,
    queue: Arc<dyn TaskQueue>,
    task_queue: String,
    metrics: Arc<dyn MetricsPort>,
}

impl TaskDispatcher {
    pub fn new(
        repository: Arc<RepositoryService>,
        queue: Arc<dyn TaskQueue>,
        task_queue: impl Into<String>,
        metrics: Arc<dyn MetricsPort>,
    ) -> Self {
        Self {
            repository,
            queue,
            task_queue: task_queue.into(),
            metrics,
        }
    }

    pub fn repository(&self) -> &RepositoryService {
        &self.repository
    }

    /// Publish a task for `attribute` unless one was already scheduled for
    /// the report. Returns whether a task was published.
    ///
    /// The cache entry is written before the publish and is kept when the
    /// publish fails. The task for that attribute is then dropped: every
    /// later dispatch of it for the same report returns `Ok(false)` until
    /// the entry expires.
    pub async fn dispatch(
        &self,
        report_id: &ReportId,
        attribute: &Attribute,
        now: DateTime<Utc>,
    ) -> Result<bool, ReportError> {
        if !self
            .repository
            .put_attribute_cache(report_id, attribute, now)?
        {
            return Ok(false);
        }

        let task = Task {
            report_id: report_id.clone(),
            attribute: attribute.clone(),
        };
        let payload = encode(&task, "task message")?;
        if let Err(source) = self.queue.publish(&self.task_queue, &payload).await {
            self.metrics.record_publish_failure(QueueRole::Task.as_str());
            return Err(ReportError::Queue {
                role: QueueRole::Task,
                queue: self.task_queue.clone(),
                source,
            });
        }
        self.metrics.record_published(QueueRole::Task.as_str());
        tracing::info!(
            %report_id,
            attr_type = %attribute.attr_type,
            attr_key = %attribute.key,
            queue = %self.task_queue,
            "task dispatched"
        );
        Ok(true)
    }
}
