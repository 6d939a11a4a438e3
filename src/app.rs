use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime, TimeDelta};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::medicine::{Medicine, MedicineId, NewMedicine, TriggerTime};
use crate::scheduling::{ActiveAlert, ReminderAlert, find_due};
use crate::settings::UserSettings;
use crate::speech::{SpeechService, reminder_text};
use crate::storage::{KvStore, StateStore};

#[derive(Debug)]
pub enum AppMessage {
    Tick(NaiveDateTime),
    AddMedicine(NewMedicine, oneshot::Sender<Medicine>),
    MarkTaken(MedicineId),
    Snooze(MedicineId),
    UpdateSettings(UserSettings),
    ListMedicines(oneshot::Sender<Vec<Medicine>>),
    GetSettings(oneshot::Sender<UserSettings>),
    GetActiveAlert(oneshot::Sender<Option<ReminderAlert>>),
}

/// Typed handle to the state owner. Clones share one mpsc channel; the
/// receiving loop applies messages strictly one at a time, which is the
/// whole concurrency story: no mutation ever interleaves with another.
#[derive(Clone)]
pub struct AppSender(mpsc::Sender<AppMessage>);

impl AppSender {
    pub async fn send_tick(&self, now: NaiveDateTime) -> anyhow::Result<()> {
        self.0.send(AppMessage::Tick(now)).await?;
        Ok(())
    }

    pub async fn add_medicine(&self, new: NewMedicine) -> anyhow::Result<Medicine> {
        let (reply, response) = oneshot::channel();
        self.0.send(AppMessage::AddMedicine(new, reply)).await?;
        Ok(response.await?)
    }

    pub async fn mark_taken(&self, id: MedicineId) -> anyhow::Result<()> {
        self.0.send(AppMessage::MarkTaken(id)).await?;
        Ok(())
    }

    pub async fn snooze(&self, id: MedicineId) -> anyhow::Result<()> {
        self.0.send(AppMessage::Snooze(id)).await?;
        Ok(())
    }

    pub async fn update_settings(&self, settings: UserSettings) -> anyhow::Result<()> {
        self.0.send(AppMessage::UpdateSettings(settings)).await?;
        Ok(())
    }

    pub async fn list_medicines(&self) -> anyhow::Result<Vec<Medicine>> {
        let (reply, response) = oneshot::channel();
        self.0.send(AppMessage::ListMedicines(reply)).await?;
        Ok(response.await?)
    }

    pub async fn settings(&self) -> anyhow::Result<UserSettings> {
        let (reply, response) = oneshot::channel();
        self.0.send(AppMessage::GetSettings(reply)).await?;
        Ok(response.await?)
    }

    pub async fn active_alert(&self) -> anyhow::Result<Option<ReminderAlert>> {
        let (reply, response) = oneshot::channel();
        self.0.send(AppMessage::GetActiveAlert(reply)).await?;
        Ok(response.await?)
    }
}

/// Clears stale done-flags: a dose acknowledged on an earlier calendar day
/// no longer counts as taken today. Idempotent.
pub fn reset_stale_taken_flags(medicines: &mut [Medicine], today: NaiveDate) -> bool {
    let mut changed = false;
    for med in medicines.iter_mut() {
        if med.taken_today && med.last_taken.map(|taken| taken.date()) != Some(today) {
            med.taken_today = false;
            changed = true;
        }
    }
    changed
}

struct AppState {
    medicines: Vec<Medicine>,
    settings: UserSettings,
    active: Option<ActiveAlert>,
    speech: Arc<dyn SpeechService>,
    repeat_interval: Duration,
    last_seen_date: NaiveDate,
}

impl AppState {
    fn add_medicine(&mut self, new: NewMedicine, now: NaiveDateTime) -> Medicine {
        let next_id = self.medicines.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let medicine = Medicine::create(next_id, new, now);
        self.medicines.push(medicine.clone());
        medicine
    }

    /// One poll: run the midnight rollover reset if the date changed since
    /// the last tick, then ring the first due medicine (if the slot is free
    /// for it).
    async fn tick(&mut self, now: NaiveDateTime) -> bool {
        let mut changed = false;
        if now.date() != self.last_seen_date {
            changed = reset_stale_taken_flags(&mut self.medicines, now.date());
            self.last_seen_date = now.date();
        }

        let ringing_id = self.active.as_ref().map(|a| a.medicine_id());
        if let Some(due) = find_due(&self.medicines, ringing_id, now).cloned() {
            // A newly due medicine supersedes whatever was ringing.
            if let Some(previous) = self.active.take() {
                previous.clear().await;
            }
            let phrase = reminder_text(self.settings.language, due.kind).to_string();
            let voice = self.settings.voice_gender.voice_id();
            self.active = Some(ActiveAlert::ring(
                due,
                now,
                phrase,
                voice,
                Arc::clone(&self.speech),
                self.repeat_interval,
            ));
        }
        changed
    }

    /// Acknowledge today's dose. Unknown ids leave the list untouched but
    /// still clear a matching alert.
    async fn mark_taken(&mut self, id: MedicineId, now: NaiveDateTime) {
        if let Some(med) = self.medicines.iter_mut().find(|m| m.id == id) {
            med.taken_today = true;
            med.last_taken = Some(now);
        } else {
            log::warn!("Acknowledged a medicine that no longer exists. [medicine_id = {id}]");
        }

        if let Some(active) = self.active.take_if(|a| a.medicine_id() == id) {
            active.clear().await;
        }
    }

    /// Push the trigger forward by the configured snooze and silence the
    /// alert. The dose stays untaken so the new time can ring.
    async fn snooze(&mut self, id: MedicineId, now: NaiveDateTime) {
        let snoozed_until = now + TimeDelta::minutes(i64::from(self.settings.snooze_minutes));
        let new_time = TriggerTime::from_instant(snoozed_until);

        if let Some(med) = self.medicines.iter_mut().find(|m| m.id == id) {
            med.time = new_time;
            med.taken_today = false;
            log::info!("Snoozed. [medicine_id = {id}, new_time = {new_time}]");
        } else {
            log::warn!("Snoozed a medicine that no longer exists. [medicine_id = {id}]");
        }

        if let Some(active) = self.active.take() {
            active.clear().await;
        }
    }
}

/// Owner of all mutable state (medicine list, user settings, the single
/// alert slot). Runs as a spawned message loop; [`AppSender`] is the public
/// API surface for both the clock poller and the presentation layer.
pub struct ReminderApp {
    sender: AppSender,
    app_task_handle: JoinHandle<()>,
}

impl ReminderApp {
    pub async fn start<S: KvStore + 'static>(
        store: StateStore<S>,
        speech: Arc<dyn SpeechService>,
        repeat_interval: Duration,
    ) -> Self {
        let now = Local::now().naive_local();
        Self::start_at(store, speech, repeat_interval, now).await
    }

    /// Entry point with an explicit clock, so tests control the calendar.
    pub async fn start_at<S: KvStore + 'static>(
        store: StateStore<S>,
        speech: Arc<dyn SpeechService>,
        repeat_interval: Duration,
        now: NaiveDateTime,
    ) -> Self {
        let mut medicines = store.load_medicines().await;
        let settings = store.load_settings().await;

        // Session-start daily reset, before the first tick can evaluate.
        if reset_stale_taken_flags(&mut medicines, now.date()) {
            persist_medicines(&store, &medicines).await;
        }

        let state = AppState {
            medicines,
            settings,
            active: None,
            speech,
            repeat_interval,
            last_seen_date: now.date(),
        };

        let (channel_sender, receiver) = mpsc::channel(64);
        let sender = AppSender(channel_sender);
        let app_task_handle = tokio::spawn(async move {
            handle_messages(state, store, receiver).await;
        });

        Self {
            sender,
            app_task_handle,
        }
    }

    pub fn sender(&self) -> AppSender {
        self.sender.clone()
    }

    /// Closes the channel and waits for the loop to wind down (which also
    /// silences any ringing alert).
    pub async fn shutdown(self) {
        drop(self.sender);
        let _ = tokio::time::timeout(Duration::from_secs(5), self.app_task_handle).await;
    }
}

async fn handle_messages<S: KvStore>(
    mut state: AppState,
    store: StateStore<S>,
    mut receiver: mpsc::Receiver<AppMessage>,
) {
    while let Some(msg) = receiver.recv().await {
        match msg {
            AppMessage::Tick(now) => {
                if state.tick(now).await {
                    persist_medicines(&store, &state.medicines).await;
                }
            }
            AppMessage::AddMedicine(new, reply) => {
                let now = Local::now().naive_local();
                let medicine = state.add_medicine(new, now);
                persist_medicines(&store, &state.medicines).await;
                let _ = reply.send(medicine);
            }
            AppMessage::MarkTaken(id) => {
                let now = Local::now().naive_local();
                state.mark_taken(id, now).await;
                persist_medicines(&store, &state.medicines).await;
            }
            AppMessage::Snooze(id) => {
                let now = Local::now().naive_local();
                state.snooze(id, now).await;
                persist_medicines(&store, &state.medicines).await;
            }
            AppMessage::UpdateSettings(settings) => {
                state.settings = settings.sanitized();
                if let Err(error) = store.save_settings(&state.settings).await {
                    log::error!("Could not persist settings. [error = {error:#}]");
                }
            }
            AppMessage::ListMedicines(reply) => {
                let _ = reply.send(state.medicines.clone());
            }
            AppMessage::GetSettings(reply) => {
                let _ = reply.send(state.settings);
            }
            AppMessage::GetActiveAlert(reply) => {
                let _ = reply.send(state.active.as_ref().map(|a| a.alert().clone()));
            }
        }
    }

    if let Some(active) = state.active.take() {
        active.clear().await;
    }
}

async fn persist_medicines<S: KvStore>(store: &StateStore<S>, medicines: &[Medicine]) {
    if let Err(error) = store.save_medicines(medicines).await {
        log::error!("Could not persist medicine list. [error = {error:#}]");
    }
}
