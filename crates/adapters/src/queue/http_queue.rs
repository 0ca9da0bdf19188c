use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::task::error::QueueError;
use ports::secondary::task_queue::TaskQueue;

/// Task queue that POSTs each message to its queue URL.
///
/// The queue identifier is the full HTTP(S) endpoint of the queue. One
/// attempt per publish: redelivery is the caller's decision.
pub struct HttpTaskQueue {
    client: reqwest::Client,
}

impl HttpTaskQueue {
    pub fn new(timeout: Duration) -> Result<Self, QueueError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QueueError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl TaskQueue for HttpTaskQueue {
    fn publish<'a>(
        &'a self,
        queue: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(queue)
                .header("Content-Type", "application/json")
                .body(payload.to_vec())
                .send()
                .await
                .map_err(|e| QueueError::Unavailable(format!("POST failed: {e}")))?;

            let status = response.status();
            if status.is_success() {
                tracing::debug!(queue, bytes = payload.len(), "message published");
                Ok(())
            } else {
                Err(QueueError::Rejected(format!("queue returned HTTP {status}")))
            }
        })
    }
}
