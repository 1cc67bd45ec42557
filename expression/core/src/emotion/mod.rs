//! Emotion Parameters
//!
//! Numeric face descriptions used by the procedural renderer. Each emotion
//! is a full [`EmotionParams`] set; transitions interpolate between two sets
//! field by field.
//!
//! # Presets
//!
//! Twelve emotions ship built in. Configuration may override any field of a
//! built-in preset or define a brand new emotion; a new emotion starts from
//! [`EmotionParams::default`] (the neutral face) and takes the overridden
//! fields on top.

mod presets;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::frame::Rgb;

pub use presets::FALLBACK_EMOTION;

/// Geometry and colors describing one facial expression
///
/// Distances are in pixels at the configured resolution. `mouth_open`,
/// `mouth_sensitivity` and `mouth_curve` are unitless factors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmotionParams {
    /// Horizontal offset of each eye from the face center
    pub eye_spacing: f32,
    /// Eye ellipse width
    pub eye_width: f32,
    /// Eye ellipse height
    pub eye_height: f32,
    /// Vertical position of the eye centers
    pub eye_y: f32,
    /// Pupil diameter
    pub pupil_size: f32,
    /// Horizontal pupil shift (positive looks right)
    pub pupil_offset: f32,
    /// Brow lift as a fraction of eye height
    pub brow_raise: f32,
    /// Brow tilt; mirrored between the two brows
    pub brow_slant: f32,
    /// Mouth width
    pub mouth_width: f32,
    /// Mouth height (also drives stroke thickness)
    pub mouth_height: f32,
    /// Smile (positive) or frown (negative)
    pub mouth_curve: f32,
    /// Resting mouth openness
    pub mouth_open: f32,
    /// How strongly speech level opens the mouth
    pub mouth_sensitivity: f32,
    /// Eye fill color
    pub eye_color: Rgb,
    /// Pupil color
    pub pupil_color: Rgb,
    /// Brow stroke color
    pub brow_color: Rgb,
    /// Mouth stroke color
    pub mouth_color: Rgb,
}

impl Default for EmotionParams {
    /// The neutral face
    fn default() -> Self {
        Self {
            eye_spacing: 90.0,
            eye_width: 42.0,
            eye_height: 42.0,
            eye_y: 100.0,
            pupil_size: 12.0,
            pupil_offset: 0.0,
            brow_raise: 0.0,
            brow_slant: 0.0,
            mouth_width: 120.0,
            mouth_height: 24.0,
            mouth_curve: 0.0,
            mouth_open: 0.05,
            mouth_sensitivity: 0.6,
            eye_color: Rgb(240, 240, 240),
            pupil_color: Rgb(20, 20, 20),
            brow_color: Rgb(220, 220, 220),
            mouth_color: Rgb(240, 120, 120),
        }
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl EmotionParams {
    /// Interpolate toward `target`; `t` is clamped to [0, 1]
    #[must_use]
    pub fn blend(&self, target: &EmotionParams, t: f32) -> EmotionParams {
        let t = t.clamp(0.0, 1.0);
        EmotionParams {
            eye_spacing: lerp(self.eye_spacing, target.eye_spacing, t),
            eye_width: lerp(self.eye_width, target.eye_width, t),
            eye_height: lerp(self.eye_height, target.eye_height, t),
            eye_y: lerp(self.eye_y, target.eye_y, t),
            pupil_size: lerp(self.pupil_size, target.pupil_size, t),
            pupil_offset: lerp(self.pupil_offset, target.pupil_offset, t),
            brow_raise: lerp(self.brow_raise, target.brow_raise, t),
            brow_slant: lerp(self.brow_slant, target.brow_slant, t),
            mouth_width: lerp(self.mouth_width, target.mouth_width, t),
            mouth_height: lerp(self.mouth_height, target.mouth_height, t),
            mouth_curve: lerp(self.mouth_curve, target.mouth_curve, t),
            mouth_open: lerp(self.mouth_open, target.mouth_open, t),
            mouth_sensitivity: lerp(self.mouth_sensitivity, target.mouth_sensitivity, t),
            eye_color: self.eye_color.lerp(target.eye_color, t),
            pupil_color: self.pupil_color.lerp(target.pupil_color, t),
            brow_color: self.brow_color.lerp(target.brow_color, t),
            mouth_color: self.mouth_color.lerp(target.mouth_color, t),
        }
    }

    /// Copy with every field present in `over` replaced
    #[must_use]
    pub fn merged(&self, over: &EmotionParamsOverride) -> EmotionParams {
        EmotionParams {
            eye_spacing: over.eye_spacing.unwrap_or(self.eye_spacing),
            eye_width: over.eye_width.unwrap_or(self.eye_width),
            eye_height: over.eye_height.unwrap_or(self.eye_height),
            eye_y: over.eye_y.unwrap_or(self.eye_y),
            pupil_size: over.pupil_size.unwrap_or(self.pupil_size),
            pupil_offset: over.pupil_offset.unwrap_or(self.pupil_offset),
            brow_raise: over.brow_raise.unwrap_or(self.brow_raise),
            brow_slant: over.brow_slant.unwrap_or(self.brow_slant),
            mouth_width: over.mouth_width.unwrap_or(self.mouth_width),
            mouth_height: over.mouth_height.unwrap_or(self.mouth_height),
            mouth_curve: over.mouth_curve.unwrap_or(self.mouth_curve),
            mouth_open: over.mouth_open.unwrap_or(self.mouth_open),
            mouth_sensitivity: over.mouth_sensitivity.unwrap_or(self.mouth_sensitivity),
            eye_color: over.eye_color.unwrap_or(self.eye_color),
            pupil_color: over.pupil_color.unwrap_or(self.pupil_color),
            brow_color: over.brow_color.unwrap_or(self.brow_color),
            mouth_color: over.mouth_color.unwrap_or(self.mouth_color),
        }
    }
}

/// Partial [`EmotionParams`] as written in configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct EmotionParamsOverride {
    pub eye_spacing: Option<f32>,
    pub eye_width: Option<f32>,
    pub eye_height: Option<f32>,
    pub eye_y: Option<f32>,
    pub pupil_size: Option<f32>,
    pub pupil_offset: Option<f32>,
    pub brow_raise: Option<f32>,
    pub brow_slant: Option<f32>,
    pub mouth_width: Option<f32>,
    pub mouth_height: Option<f32>,
    pub mouth_curve: Option<f32>,
    pub mouth_open: Option<f32>,
    pub mouth_sensitivity: Option<f32>,
    pub eye_color: Option<Rgb>,
    pub pupil_color: Option<Rgb>,
    pub brow_color: Option<Rgb>,
    pub mouth_color: Option<Rgb>,
}

/// The resolved preset table
#[derive(Clone, Debug)]
pub struct EmotionPresets {
    presets: HashMap<String, EmotionParams>,
    neutral: EmotionParams,
}

impl Default for EmotionPresets {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EmotionPresets {
    /// Built-in presets only
    #[must_use]
    pub fn builtin() -> Self {
        let presets = presets::builtin()
            .into_iter()
            .map(|(name, params)| (name.to_string(), params))
            .collect();
        Self {
            presets,
            neutral: EmotionParams::default(),
        }
    }

    /// Apply configured overrides on top of the current table
    #[must_use]
    pub fn with_overrides(mut self, overrides: &HashMap<String, EmotionParamsOverride>) -> Self {
        for (name, over) in overrides {
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let base = self.presets.get(&name).unwrap_or(&self.neutral);
            let merged = base.merged(over);
            tracing::debug!(emotion = %name, "Applied emotion preset override");
            self.presets.insert(name, merged);
        }
        self
    }

    /// Whether an emotion has its own preset
    #[must_use]
    pub fn contains(&self, emotion: &str) -> bool {
        self.presets.contains_key(emotion)
    }

    /// Parameters for an emotion, falling back to `happy` and then the
    /// neutral face
    #[must_use]
    pub fn get(&self, emotion: &str) -> &EmotionParams {
        self.presets
            .get(emotion)
            .or_else(|| self.presets.get(FALLBACK_EMOTION))
            .unwrap_or(&self.neutral)
    }

    /// Names of all known emotions
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    /// Number of presets
    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_has_twelve_presets() {
        let presets = EmotionPresets::builtin();
        assert_eq!(presets.len(), 12);
        for name in [
            "happy", "sad", "excited", "curious", "sleepy", "angry", "scared", "playful",
            "lonely", "bored", "surprised", "loving",
        ] {
            assert!(presets.contains(name), "missing preset {name}");
        }
    }

    #[test]
    fn test_unknown_emotion_falls_back_to_happy() {
        let presets = EmotionPresets::builtin();
        assert_eq!(presets.get("confused"), presets.get("happy"));
    }

    #[test]
    fn test_blend_endpoints_and_midpoint() {
        let presets = EmotionPresets::builtin();
        let happy = presets.get("happy");
        let sad = presets.get("sad");

        assert_eq!(&happy.blend(sad, 0.0), happy);
        assert_eq!(&happy.blend(sad, 1.0), sad);

        let mid = happy.blend(sad, 0.5);
        assert!((mid.eye_spacing - 87.5).abs() < 1e-4);
        assert!((mid.mouth_curve - (-0.05)).abs() < 1e-4);
        assert_eq!(mid.mouth_color, Rgb(220, 130, 150));
    }

    #[test]
    fn test_override_merges_per_field() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "happy".to_string(),
            EmotionParamsOverride {
                mouth_curve: Some(0.6),
                ..Default::default()
            },
        );
        let presets = EmotionPresets::builtin().with_overrides(&overrides);
        let happy = presets.get("happy");
        assert!((happy.mouth_curve - 0.6).abs() < f32::EPSILON);
        assert!((happy.eye_spacing - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_override_defines_new_emotion_on_neutral_face() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "Smug".to_string(),
            EmotionParamsOverride {
                pupil_offset: Some(6.0),
                ..Default::default()
            },
        );
        let presets = EmotionPresets::builtin().with_overrides(&overrides);
        assert!(presets.contains("smug"));
        let smug = presets.get("smug");
        assert!((smug.pupil_offset - 6.0).abs() < f32::EPSILON);
        assert_eq!(smug.eye_height, EmotionParams::default().eye_height);
    }
}
