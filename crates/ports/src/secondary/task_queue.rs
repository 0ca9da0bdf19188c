use std::future::Future;
use std::pin::Pin;

use domain::task::error::QueueError;

/// Secondary port for publishing messages to an at-least-once queue.
///
/// Uses `Pin<Box<dyn Future>>` return type (instead of RPITIT) so the trait
/// is dyn-compatible and can be used as `Arc<dyn TaskQueue>`.
pub trait TaskQueue: Send + Sync {
    /// Publish one payload to the queue identified by `queue`.
    fn publish<'a>(
        &'a self,
        queue: &'a str,
        payload: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = Result<(), QueueError>> + Send + 'a>>;
}
