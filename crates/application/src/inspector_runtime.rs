use std::sync::Arc;

use domain::attribute::entity::Attribute;
use domain::common::entity::ReportId;
use domain::report::entity::ReportSection;
use domain::report::error::{QueueRole, ReportError};
use domain::task::entity::{Task, TaskContext, TaskResult};
use ports::secondary::inspector_port::Inspector;
use ports::secondary::metrics_port::MetricsPort;
use ports::secondary::task_queue::TaskQueue;

use crate::codec::{decode_message, encode};

/// Static identity and destinations of one inspector deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub author: String,
    pub content_queue: String,
    pub attribute_queue: String,
}

/// Result of handling one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The inspector produced no result; nothing was published.
    Declined,
    /// Number of content and attribute messages published.
    Published { contents: usize, attributes: usize },
}

/// Runs inspector business logic for received tasks and republishes the
/// results.
///
/// Contents always go out before new attributes, each in the order the
/// inspector returned them. The first failed publish aborts the call;
/// messages already sent stay sent.
pub struct InspectorRuntime {
    inspector: Arc<dyn Inspector>,
    queue: Arc<dyn TaskQueue>,
    settings: DispatchSettings,
    metrics: Arc<dyn MetricsPort>,
}

impl InspectorRuntime {
    pub fn new(
        inspector: Arc<dyn Inspector>,
        queue: Arc<dyn TaskQueue>,
        settings: DispatchSettings,
        metrics: Arc<dyn MetricsPort>,
    ) -> Self {
        Self {
            inspector,
            queue,
            settings,
            metrics,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub async fn handle_task(&self, task: &Task) -> Result<TaskOutcome, ReportError> {
        let ctx = TaskContext {
            report_id: task.report_id.clone(),
        };

        let result = match self.inspector.inspect(&ctx, &task.attribute).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    report_id = %task.report_id,
                    author = %self.settings.author,
                    attr_type = %task.attribute.attr_type,
                    error = %e,
                    "inspector failed"
                );
                self.metrics.record_task(&self.settings.author, "failed");
                return Err(ReportError::Inspector(e.to_string()));
            }
        };

        let Some(result) = result else {
            tracing::debug!(
                report_id = %task.report_id,
                author = %self.settings.author,
                "inspector declined attribute"
            );
            self.metrics.record_task(&self.settings.author, "declined");
            return Ok(TaskOutcome::Declined);
        };

        if result.is_empty() {
            tracing::debug!(
                report_id = %task.report_id,
                author = %self.settings.author,
                "inspector returned an empty result"
            );
            self.metrics.record_task(&self.settings.author, "empty");
            return Ok(TaskOutcome::Published {
                contents: 0,
                attributes: 0,
            });
        }

        let outcome = self.publish_result(task, result).await?;
        self.metrics.record_task(&self.settings.author, "published");
        Ok(outcome)
    }

    /// Decode a JSON task message and handle it.
    pub async fn handle_message(&self, payload: &[u8]) -> Result<TaskOutcome, ReportError> {
        let task: Task = decode_message(payload, "task message")?;
        self.handle_task(&task).await
    }

    /// Handle a batch of task messages in order, stopping at the first
    /// failure.
    pub async fn handle_batch(&self, payloads: &[Vec<u8>]) -> Result<Vec<TaskOutcome>, ReportError> {
        let mut outcomes = Vec::with_capacity(payloads.len());
        for payload in payloads {
            outcomes.push(self.handle_message(payload).await?);
        }
        Ok(outcomes)
    }

    async fn publish_result(
        &self,
        task: &Task,
        result: TaskResult,
    ) -> Result<TaskOutcome, ReportError> {
        let contents = result.contents.len();
        let attributes = result.new_attributes.len();

        for content in result.contents {
            let section = ReportSection {
                report_id: task.report_id.clone(),
                author: self.settings.author.clone(),
                attribute: task.attribute.clone(),
                content,
            };
            let payload = encode(&section, "content message")?;
            self.publish(QueueRole::Content, &self.settings.content_queue, &payload)
                .await?;
        }

        for attribute in result.new_attributes {
            let next = Task {
                report_id: task.report_id.clone(),
                attribute,
            };
            let payload = encode(&next, "attribute message")?;
            self.publish(
                QueueRole::Attribute,
                &self.settings.attribute_queue,
                &payload,
            )
            .await?;
        }

        tracing::info!(
            report_id = %task.report_id,
            author = %self.settings.author,
            contents,
            attributes,
            "inspection result published"
        );
        Ok(TaskOutcome::Published {
            contents,
            attributes,
        })
    }

    async fn publish(&self, role: QueueRole, queue: &str, payload: &[u8]) -> Result<(), ReportError> {
        if let Err(source) = self.queue.publish(queue, payload).await {
            self.metrics.record_publish_failure(role.as_str());
            return Err(ReportError::Queue {
                role,
                queue: queue.to_string(),
                source,
            });
        }
        self.metrics.record_published(role.as_str());
        Ok(())
    }
}

/// Invoke `inspector` on `attribute` under a fresh report id without
/// publishing anything.
pub async fn run_inspector(
    inspector: &dyn Inspector,
    attribute: Attribute,
) -> Result<Option<TaskResult>, ReportError> {
    let ctx = TaskContext {
        report_id: ReportId::generate(),
    };
    inspector
        .inspect(&ctx, &attribute)
        .await
        .map_err(|e| ReportError::Inspector(e.to_string()))
}
