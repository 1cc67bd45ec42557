//! Gesture Effects
//!
//! What happens when a gesture is accepted. Effects are loaded from
//! configuration once and never mutated; blank strings count as absent.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gesture::Gesture;

/// Spoken text is assumed to play at this many characters per second
const SPEECH_CHARS_PER_SEC: u64 = 10;

/// Fixed overhead added to every spoken reply estimate
const SPEECH_OVERHEAD: Duration = Duration::from_millis(1500);

/// Effect configured for a gesture
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effect {
    /// Emotion to show (0.4s transition)
    pub emotion: Option<String>,
    /// Text to speak
    pub speak: Option<String>,
    /// Sound asset to play
    pub sound: Option<String>,
    /// Hardware action identifier
    pub hardware: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl Effect {
    /// Emotion to switch to, if set
    #[must_use]
    pub fn emotion(&self) -> Option<&str> {
        non_blank(self.emotion.as_ref())
    }

    /// Text to speak, if set
    #[must_use]
    pub fn speak(&self) -> Option<&str> {
        non_blank(self.speak.as_ref())
    }

    /// Sound to play, if set
    #[must_use]
    pub fn sound(&self) -> Option<&str> {
        non_blank(self.sound.as_ref())
    }

    /// Hardware action, if set
    #[must_use]
    pub fn hardware(&self) -> Option<&str> {
        non_blank(self.hardware.as_ref())
    }

    /// Whether the effect does anything at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emotion().is_none()
            && self.speak().is_none()
            && self.sound().is_none()
            && self.hardware().is_none()
    }

    /// How long gesture input stays blocked after this effect fires
    ///
    /// The base window, stretched to cover the estimated playback time when
    /// the effect speaks (`chars / 10 + 1.5` seconds).
    #[must_use]
    pub fn busy_duration(&self, base: Duration) -> Duration {
        match self.speak() {
            Some(text) => base.max(estimated_speech_duration(text)),
            None => base,
        }
    }
}

/// Rough playback time for a spoken reply
#[must_use]
pub fn estimated_speech_duration(text: &str) -> Duration {
    let chars = text.chars().count() as u64;
    Duration::from_millis(chars * 1000 / SPEECH_CHARS_PER_SEC) + SPEECH_OVERHEAD
}

/// Effects keyed by the gesture that triggers them
pub type EffectMap = HashMap<Gesture, Effect>;
