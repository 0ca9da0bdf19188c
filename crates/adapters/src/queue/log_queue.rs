use std::future::Future;
use std::pin::Pin;

use domain::task::error::QueueError;
use ports::secondary::task_queue::TaskQueue;

/// Task queue that writes each message to the log instead of sending it.
///
/// Used when no queue backend is configured, and by the CLI to show what
/// a run would publish.
pub struct LogTaskQueue;

impl TaskQueue for LogTaskQueue {
    fn publish<'a>(
        &'a self,
        queue: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>> {
        Box::pin(async move {
            tracing::info!(
                queue,
                bytes = payload.len(),
                message = %String::from_utf8_lossy(payload),
                "message published to log"
            );
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_queue_accepts_everything() {
        let queue = LogTaskQueue;
        assert!(queue.publish("task-q", b"{\"report_id\":\"R\"}").await.is_ok());
        assert!(queue.publish("", &[0xff, 0x00]).await.is_ok());
    }
}
