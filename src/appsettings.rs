use std::sync::OnceLock;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct StorageSettings {
    pub data_dir: String,
}

#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    /// Clock poller cadence. The evaluator matches on the minute, so any
    /// value below 60 keeps triggers from being skipped.
    pub poll_interval_secs: u64,
    /// Cadence of the repeated voice announcement while ringing.
    pub repeat_interval_secs: u64,
}

impl SchedulerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn repeat_interval(&self) -> Duration {
        Duration::from_secs(self.repeat_interval_secs)
    }
}

#[derive(Deserialize, Debug)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub scheduler: SchedulerSettings,
}

impl AppSettings {
    fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("storage.data_dir", "./data")?
            .set_default("scheduler.poll_interval_secs", 15_i64)?
            .set_default("scheduler.repeat_interval_secs", 10_i64)?
            .add_source(File::with_name("appsettings").required(false))
            .add_source(File::with_name("appsettings.local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

pub fn get() -> &'static AppSettings {
    static APPSETTINGS: OnceLock<AppSettings> = OnceLock::new();
    APPSETTINGS
        .get_or_init(|| AppSettings::new().expect("Default configuration is always valid."))
}
