use async_trait::async_trait;

use crate::medicine::MedicineKind;
use crate::settings::Language;

/// Voice identifiers understood by the synthesis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceId {
    Kore,
    Puck,
}

impl VoiceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceId::Kore => "Kore",
            VoiceId::Puck => "Puck",
        }
    }
}

/// Speech synthesis collaborator. Calls are fire-and-forget from the
/// scheduler's point of view; a failed call must not change alert state.
#[async_trait]
pub trait SpeechService: Send + Sync + 'static {
    async fn speak(&self, text: &str, voice: VoiceId) -> anyhow::Result<()>;
}

/// Stand-in backend that writes the phrase to the log instead of rendering
/// audio. Keeps the binary runnable without a synthesis endpoint.
pub struct LoggingSpeechService;

#[async_trait]
impl SpeechService for LoggingSpeechService {
    async fn speak(&self, text: &str, voice: VoiceId) -> anyhow::Result<()> {
        log::info!("[voice:{}] {}", voice.as_str(), text);
        Ok(())
    }
}

/// Spoken reminder phrase for a medicine kind.
pub fn reminder_text(language: Language, kind: MedicineKind) -> &'static str {
    match (language, kind) {
        (Language::En, MedicineKind::Moxifloxacin) => {
            "Please apply your number one, Moxifloxacin eye medicine now."
        }
        (Language::En, MedicineKind::Cmc) => {
            "Please apply your number two, C.M.C eye medicine now."
        }
        (Language::En, MedicineKind::Ganciclovir) => {
            "Please apply your number three, Ganciclovir eye medicine now."
        }
        (Language::En, MedicineKind::Other) => "Please apply your eye medicine now.",
        (Language::Te, MedicineKind::Moxifloxacin) => {
            "దయచేసి ఇప్పుడు ఒకటో మందు, మాక్సిఫ్లోక్సాసిన్ కంటి చుక్కలు వేయండి."
        }
        (Language::Te, MedicineKind::Cmc) => {
            "దయచేసి ఇప్పుడు రెండో మందు, సి.ఎం.సి కంటి చుక్కలు వేయండి."
        }
        (Language::Te, MedicineKind::Ganciclovir) => {
            "దయచేసి ఇప్పుడు మూడో మందు, గాన్సిక్లోవిర్ కంటి మలయం వేయండి."
        }
        (Language::Te, MedicineKind::Other) => "దయచేసి ఇప్పుడు మీ కంటి మందు వేయండి.",
    }
}
