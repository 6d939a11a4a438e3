use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

/// Handle to a spawned periodic task. Cancellation is positive: the token is
/// tripped first, then the task is awaited so nothing fires after `cancel`
/// returns.
pub struct ScheduledTask {
    task_handle: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTask {
    pub fn new(task_handle: JoinHandle<()>, cancellation_token: CancellationToken) -> Self {
        Self {
            task_handle,
            cancellation_token,
        }
    }

    pub async fn cancel(self, timeout: std::time::Duration) {
        self.cancellation_token.cancel();
        let cancel_with_timeout = time::timeout(timeout, self.task_handle);
        let _ = cancel_with_timeout.await;
    }
}
