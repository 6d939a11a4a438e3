use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio_util::sync::CancellationToken;

use super::task::ScheduledTask;
use crate::medicine::{Medicine, MedicineId};
use crate::speech::{SpeechService, VoiceId};

const REPEATER_CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

/// The alert currently being announced.
#[derive(Debug, Clone)]
pub struct ReminderAlert {
    pub medicine: Medicine,
    pub triggered_at: NaiveDateTime,
}

/// A ringing alert together with its voice repeater task. Dropping the slot
/// without calling [`ActiveAlert::clear`] would leave the repeater running,
/// so the state owner always clears explicitly.
pub struct ActiveAlert {
    alert: ReminderAlert,
    repeater: ScheduledTask,
}

impl ActiveAlert {
    /// Transition into ringing: record the alert and start announcing.
    pub fn ring(
        medicine: Medicine,
        triggered_at: NaiveDateTime,
        phrase: String,
        voice: VoiceId,
        speech: Arc<dyn SpeechService>,
        repeat_interval: Duration,
    ) -> Self {
        log::info!(
            "Alert ringing. [medicine_id = {}, kind = {}, time = {}]",
            medicine.id,
            medicine.kind,
            medicine.time
        );
        let repeater = start_repeater(phrase, voice, speech, repeat_interval);
        Self {
            alert: ReminderAlert {
                medicine,
                triggered_at,
            },
            repeater,
        }
    }

    pub fn medicine_id(&self) -> MedicineId {
        self.alert.medicine.id
    }

    pub fn alert(&self) -> &ReminderAlert {
        &self.alert
    }

    /// Transition back to idle. The repeater token is tripped before the
    /// task is awaited, so no announcement fires after this returns.
    pub async fn clear(self) {
        log::info!(
            "Alert cleared. [medicine_id = {}]",
            self.alert.medicine.id
        );
        self.repeater.cancel(REPEATER_CANCEL_TIMEOUT).await;
    }
}

/// Speaks `phrase` immediately, then again at every `repeat_interval` until
/// cancelled. Failed speech calls are logged and skipped; the next repeat
/// tries again.
fn start_repeater(
    phrase: String,
    voice: VoiceId,
    speech: Arc<dyn SpeechService>,
    repeat_interval: Duration,
) -> ScheduledTask {
    let cancellation_token = CancellationToken::new();
    let task_cancellation_token = cancellation_token.child_token();

    let task_handle = tokio::spawn(async move {
        loop {
            // Checked before every announcement as well as between them, so
            // an alert cleared before this task first runs stays silent.
            if task_cancellation_token.is_cancelled() {
                break;
            }
            if let Err(error) = speech.speak(&phrase, voice).await {
                log::warn!("Speech synthesis failed, will retry on the next repeat. [error = {error:#}]");
            }
            tokio::select! {
                _ = task_cancellation_token.cancelled() => break,
                _ = tokio::time::sleep(repeat_interval) => {}
            }
        }
    });

    ScheduledTask::new(task_handle, cancellation_token)
}
