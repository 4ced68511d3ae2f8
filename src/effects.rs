// src/effects.rs - Side-effect requests handed to audio/speech collaborators
use serde::Serialize;
use tracing::info;

/// C major pentatonic, low to high (Hz).
pub const TONE_SCALE: [f64; 6] = [261.63, 293.66, 329.63, 392.00, 440.00, 523.25];

/// Fire-and-forget requests; the controller never reads anything back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SideEffect {
    Announce { text: String },
    /// `pitch_factor` is in [0,1], higher hand means higher note.
    PlayTone { pitch_factor: f64, frequency_hz: f64 },
    PlayScanSound,
    PlaySelectSound,
    PlayPhoenixSound,
}

impl SideEffect {
    pub fn announce(text: impl Into<String>) -> Self {
        SideEffect::Announce { text: text.into() }
    }

    pub fn tone(pitch_factor: f64) -> Self {
        SideEffect::PlayTone {
            pitch_factor,
            frequency_hz: tone_frequency(pitch_factor),
        }
    }

    pub fn label(&self) -> String {
        match self {
            SideEffect::Announce { text } => format!("announce:{}", text),
            SideEffect::PlayTone { frequency_hz, .. } => format!("tone:{:.2}", frequency_hz),
            SideEffect::PlayScanSound => "scan".to_string(),
            SideEffect::PlaySelectSound => "select".to_string(),
            SideEffect::PlayPhoenixSound => "phoenix".to_string(),
        }
    }
}

pub fn tone_note_index(pitch_factor: f64) -> usize {
    let last = TONE_SCALE.len() - 1;
    let index = (pitch_factor * last as f64).floor();
    if index.is_nan() || index < 0.0 {
        0
    } else {
        (index as usize).min(last)
    }
}

pub fn tone_frequency(pitch_factor: f64) -> f64 {
    TONE_SCALE[tone_note_index(pitch_factor)]
}

/// Receiver for side effects. Failures stay on the collaborator's side.
pub trait EffectSink {
    fn dispatch(&mut self, effect: &SideEffect);
}

/// Logs every request; stands in for speech and audio when replaying.
#[derive(Debug, Default)]
pub struct TracingSink {
    pub dispatched: usize,
}

impl EffectSink for TracingSink {
    fn dispatch(&mut self, effect: &SideEffect) {
        self.dispatched += 1;
        match effect {
            SideEffect::Announce { text } => info!("speak: {}", text),
            SideEffect::PlayTone {
                pitch_factor,
                frequency_hz,
            } => info!("tone: {:.2} Hz (factor {:.2})", frequency_hz, pitch_factor),
            other => info!("sound: {}", other.label()),
        }
    }
}

impl EffectSink for Vec<SideEffect> {
    fn dispatch(&mut self, effect: &SideEffect) {
        self.push(effect.clone());
    }
}
