use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type MedicineId = i64;

/// Every schedule runs for a fixed one-month course.
pub const DEFAULT_COURSE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MedicineKind {
    Moxifloxacin,
    #[serde(rename = "CMC")]
    Cmc,
    Ganciclovir,
    Other,
}

impl MedicineKind {
    pub fn ordinal(&self) -> Option<u8> {
        match self {
            MedicineKind::Moxifloxacin => Some(1),
            MedicineKind::Cmc => Some(2),
            MedicineKind::Ganciclovir => Some(3),
            MedicineKind::Other => None,
        }
    }
}

impl FromStr for MedicineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "moxifloxacin" => Ok(MedicineKind::Moxifloxacin),
            "cmc" => Ok(MedicineKind::Cmc),
            "ganciclovir" => Ok(MedicineKind::Ganciclovir),
            "other" => Ok(MedicineKind::Other),
            other => anyhow::bail!("unknown medicine kind: {other}"),
        }
    }
}

impl fmt::Display for MedicineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MedicineKind::Moxifloxacin => "Moxifloxacin",
            MedicineKind::Cmc => "CMC",
            MedicineKind::Ganciclovir => "Ganciclovir",
            MedicineKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// Daily trigger time, minute granularity. Seconds and below are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerTime(NaiveTime);

impl TriggerTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized = inner
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .expect("Will never fail.");
        Self(normalized)
    }

    /// Truncates an instant to its wall-clock minute.
    pub fn from_instant(instant: NaiveDateTime) -> Self {
        Self::new(instant.time())
    }

    /// True when `now` falls anywhere inside this trigger's minute.
    pub fn matches(&self, now: NaiveDateTime) -> bool {
        Self::from_instant(now) == *self
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for TriggerTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(s, "%H:%M")?;
        Ok(Self::new(time))
    }
}

impl Serialize for TriggerTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TriggerTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One scheduled treatment. Timestamps are local wall-clock time; the
/// persisted field names match the saved-state format of earlier versions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    #[serde(rename = "type")]
    pub kind: MedicineKind,
    pub dosage: String,
    pub time: TriggerTime,
    #[serde(rename = "takenToday")]
    pub taken_today: bool,
    #[serde(rename = "lastTakenTime", skip_serializing_if = "Option::is_none", default)]
    pub last_taken: Option<NaiveDateTime>,
    #[serde(rename = "startDate")]
    pub start: NaiveDateTime,
    #[serde(rename = "durationDays")]
    pub duration_days: i64,
}

/// User-supplied fields of a new schedule; the rest is filled in at creation.
#[derive(Debug, Clone)]
pub struct NewMedicine {
    pub kind: MedicineKind,
    pub time: TriggerTime,
    pub dosage: String,
}

impl Medicine {
    pub fn create(id: MedicineId, new: NewMedicine, now: NaiveDateTime) -> Self {
        Self {
            id,
            kind: new.kind,
            dosage: new.dosage,
            time: new.time,
            taken_today: false,
            last_taken: None,
            start: now,
            duration_days: DEFAULT_COURSE_DAYS,
        }
    }

    /// Whole days elapsed since the course started, clamped at zero so a
    /// clock set backwards never yields a negative day.
    pub fn days_since_start(&self, now: NaiveDateTime) -> i64 {
        (now - self.start).max(TimeDelta::zero()).num_days()
    }

    /// 1-indexed course day for display ("Day 3 / 30").
    pub fn day_number(&self, now: NaiveDateTime) -> i64 {
        self.days_since_start(now) + 1
    }

    /// A finished course never triggers again, whatever `taken_today` says.
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.days_since_start(now) >= self.duration_days
    }
}
