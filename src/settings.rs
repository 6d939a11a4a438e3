use serde::{Deserialize, Serialize};

use crate::speech::VoiceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Te,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Female,
    Male,
}

impl VoiceGender {
    pub fn voice_id(&self) -> VoiceId {
        match self {
            VoiceGender::Female => VoiceId::Kore,
            VoiceGender::Male => VoiceId::Puck,
        }
    }
}

/// Per-user preferences, persisted alongside the medicine list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub language: Language,
    #[serde(rename = "voiceGender")]
    pub voice_gender: VoiceGender,
    #[serde(rename = "snoozeMinutes")]
    pub snooze_minutes: u32,
}

impl UserSettings {
    /// A zero-minute snooze would land the trigger back in the current
    /// minute and re-ring immediately; treat it as absent and fall back to
    /// the default.
    pub fn sanitized(mut self) -> Self {
        if self.snooze_minutes == 0 {
            log::warn!("Ignoring zero snooze duration, using the default.");
            self.snooze_minutes = Self::default().snooze_minutes;
        }
        self
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            language: Language::Te,
            voice_gender: VoiceGender::Female,
            snooze_minutes: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run_behavior() {
        let settings = UserSettings::default();
        assert_eq!(settings.language, Language::Te);
        assert_eq!(settings.voice_gender, VoiceGender::Female);
        assert_eq!(settings.snooze_minutes, 5);
    }

    #[test]
    fn zero_snooze_is_replaced_with_the_default() {
        let settings = UserSettings {
            snooze_minutes: 0,
            ..UserSettings::default()
        };
        assert_eq!(settings.sanitized().snooze_minutes, 5);

        let settings = UserSettings {
            snooze_minutes: 2,
            ..UserSettings::default()
        };
        assert_eq!(settings.sanitized().snooze_minutes, 2);
    }

    #[test]
    fn gender_selects_voice() {
        assert_eq!(VoiceGender::Female.voice_id(), VoiceId::Kore);
        assert_eq!(VoiceGender::Male.voice_id(), VoiceId::Puck);
    }
}
