mod file;
#[cfg(test)]
mod memory;

pub use file::FileKvStore;
#[cfg(test)]
pub use memory::InMemoryKvStore;

use async_trait::async_trait;

use crate::medicine::Medicine;
use crate::settings::UserSettings;

pub const MEDICINES_KEY: &str = "medicines";
pub const SETTINGS_KEY: &str = "settings";

/// Persistence collaborator: two serialized values behind string keys.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// Typed layer over a [`KvStore`]. Load failures (missing key, unreadable
/// store, parse error) degrade to defaults; the app must start regardless.
pub struct StateStore<S> {
    inner: S,
}

impl<S: KvStore> StateStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub async fn load_medicines(&self) -> Vec<Medicine> {
        self.load_or_default(MEDICINES_KEY).await
    }

    pub async fn load_settings(&self) -> UserSettings {
        self.load_or_default::<UserSettings>(SETTINGS_KEY)
            .await
            .sanitized()
    }

    pub async fn save_medicines(&self, medicines: &[Medicine]) -> anyhow::Result<()> {
        let raw = serde_json::to_string(medicines)?;
        self.inner.save(MEDICINES_KEY, &raw).await
    }

    pub async fn save_settings(&self, settings: &UserSettings) -> anyhow::Result<()> {
        let raw = serde_json::to_string(settings)?;
        self.inner.save(SETTINGS_KEY, &raw).await
    }

    async fn load_or_default<T>(&self, key: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        let raw = match self.inner.load(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(error) => {
                log::warn!("Could not read saved state, starting fresh. [key = {key}, error = {error:#}]");
                return T::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(error) => {
                log::warn!("Saved state is unreadable, starting fresh. [key = {key}, error = {error}]");
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medicine::{Medicine, MedicineKind, NewMedicine};
    use chrono::NaiveDate;

    fn sample_medicines() -> Vec<Medicine> {
        let now = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap();
        let mut first = Medicine::create(
            1,
            NewMedicine {
                kind: MedicineKind::Moxifloxacin,
                time: "08:00".parse().unwrap(),
                dosage: "1 drop".into(),
            },
            now,
        );
        first.taken_today = true;
        first.last_taken = Some(now);

        let second = Medicine::create(
            2,
            NewMedicine {
                kind: MedicineKind::Other,
                time: "21:15".parse().unwrap(),
                dosage: "1 drop".into(),
            },
            now,
        );
        vec![first, second]
    }

    #[tokio::test]
    async fn round_trips_medicines_and_settings() {
        let store = StateStore::new(InMemoryKvStore::new());
        let medicines = sample_medicines();
        let settings = UserSettings::default();

        store.save_medicines(&medicines).await.unwrap();
        store.save_settings(&settings).await.unwrap();

        let loaded = store.load_medicines().await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, medicines[0].id);
        assert_eq!(loaded[0].last_taken, medicines[0].last_taken);
        assert!(loaded[0].taken_today);
        assert_eq!(loaded[1].time, medicines[1].time);
        // Absent lastTakenTime stays absent, not null or zero.
        assert_eq!(loaded[1].last_taken, None);

        assert_eq!(store.load_settings().await, settings);
    }

    #[test]
    fn absent_last_taken_is_omitted_from_json() {
        let medicines = sample_medicines();
        let raw = serde_json::to_string(&medicines).unwrap();
        assert_eq!(raw.matches("lastTakenTime").count(), 1);
    }

    #[tokio::test]
    async fn missing_keys_fall_back_to_defaults() {
        let store = StateStore::new(InMemoryKvStore::new());
        assert!(store.load_medicines().await.is_empty());
        assert_eq!(store.load_settings().await, UserSettings::default());
    }

    #[tokio::test]
    async fn zero_snooze_in_saved_settings_is_replaced() {
        let kv = InMemoryKvStore::new();
        // Hand-edited settings file with an unusable snooze duration.
        kv.save(
            SETTINGS_KEY,
            r#"{"language":"te","voiceGender":"female","snoozeMinutes":0}"#,
        )
        .await
        .unwrap();

        let store = StateStore::new(kv);
        let settings = store.load_settings().await;
        assert_eq!(settings.snooze_minutes, UserSettings::default().snooze_minutes);
    }

    #[tokio::test]
    async fn corrupt_state_falls_back_to_defaults() {
        let kv = InMemoryKvStore::new();
        kv.save(MEDICINES_KEY, "{not json").await.unwrap();
        kv.save(SETTINGS_KEY, "[]").await.unwrap();

        let store = StateStore::new(kv);
        assert!(store.load_medicines().await.is_empty());
        assert_eq!(store.load_settings().await, UserSettings::default());
    }
}
