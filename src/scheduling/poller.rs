use std::time::Duration;

use chrono::Local;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::task::ScheduledTask;
use crate::app::AppSender;

/// Starts the clock poller: samples local wall-clock time every
/// `poll_interval` and hands it to the state owner as a tick. The poller
/// holds no schedule state of its own, so it never needs restarting when
/// the medicine list changes.
pub fn start(poll_interval: Duration, sender: AppSender) -> ScheduledTask {
    let cancellation_token = CancellationToken::new();
    let task_cancellation_token = cancellation_token.child_token();

    let task_handle = tokio::spawn(async move {
        let mut interval = time::interval(poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = task_cancellation_token.cancelled() => break,
                _ = interval.tick() => {
                    let now = Local::now().naive_local();
                    if sender.send_tick(now).await.is_err() {
                        // State owner is gone; nothing left to drive.
                        break;
                    }
                }
            }
        }
    });

    ScheduledTask::new(task_handle, cancellation_token)
}
