//! Sprite Loading
//!
//! Emotion sprites live in one directory:
//!
//! - `<emotion>.png` - base frame
//! - `<emotion>_speaking.png` - optional speaking frame (base is reused
//!   when missing)
//! - `listening.png` - listening overlay, not an emotion
//!
//! Files containing `_active` are ignored. Every frame is scaled to the
//! screen resolution at load time so compositing never resizes.

use std::collections::HashMap;
use std::path::Path;

use image::imageops::FilterType;

use crate::error::SpriteError;
use crate::frame::Frame;

/// Base and speaking frames for one emotion
#[derive(Clone, Debug)]
pub struct SpritePair {
    /// Mouth-closed frame
    pub base: Frame,
    /// Mouth-open frame
    pub speaking: Frame,
}

/// All loaded sprites
#[derive(Clone, Debug, Default)]
pub struct SpriteSet {
    emotions: HashMap<String, SpritePair>,
    listening: Option<Frame>,
}

/// Decode a PNG and scale it to `size`
///
/// # Errors
///
/// Returns [`SpriteError::Decode`] if the file cannot be read or decoded.
pub fn load_frame(path: &Path, size: (u32, u32)) -> Result<Frame, SpriteError> {
    let decoded = image::open(path).map_err(|source| SpriteError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let mut rgba = decoded.to_rgba8();
    if rgba.dimensions() != size {
        rgba = image::imageops::resize(&rgba, size.0, size.1, FilterType::Triangle);
    }
    Ok(Frame::from_rgba_image(&rgba))
}

impl SpriteSet {
    /// Load every sprite in `dir`
    ///
    /// Individual failures are logged and skipped; a missing directory
    /// yields an empty set.
    #[must_use]
    pub fn load(dir: &Path, size: (u32, u32)) -> Self {
        let mut set = Self::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(source) => {
                let err = SpriteError::Directory {
                    path: dir.to_path_buf(),
                    source,
                };
                tracing::warn!(error = %err, "Sprite directory unavailable");
                return set;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".png"))
            .filter(|name| !name.contains("_speaking") && !name.contains("_active"))
            .collect();
        names.sort();

        for file_name in names {
            let emotion = file_name.trim_end_matches(".png").to_string();
            let path = dir.join(&file_name);

            if emotion == "listening" {
                match load_frame(&path, size) {
                    Ok(frame) => set.listening = Some(frame),
                    Err(e) => tracing::error!(error = %e, "Failed to load listening sprite"),
                }
                continue;
            }

            let base = match load_frame(&path, size) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(emotion = %emotion, error = %e, "Failed to load sprite");
                    continue;
                }
            };

            let speaking_path = dir.join(format!("{emotion}_speaking.png"));
            let speaking = if speaking_path.exists() {
                load_frame(&speaking_path, size).unwrap_or_else(|e| {
                    tracing::warn!(emotion = %emotion, error = %e, "Bad speaking sprite, using base frame");
                    base.clone()
                })
            } else {
                tracing::warn!(emotion = %emotion, "No speaking frame, using base frame");
                base.clone()
            };

            tracing::debug!(emotion = %emotion, "Loaded emotion sprites");
            set.emotions.insert(emotion, SpritePair { base, speaking });
        }

        tracing::info!(
            count = set.emotions.len(),
            listening = set.listening.is_some(),
            "Loaded emotion sprites"
        );
        set
    }

    /// Add or replace an emotion's frames
    pub fn insert(&mut self, emotion: impl Into<String>, pair: SpritePair) {
        self.emotions.insert(emotion.into(), pair);
    }

    /// Set the listening frame
    pub fn set_listening(&mut self, frame: Frame) {
        self.listening = Some(frame);
    }

    /// Frames for an emotion, if loaded
    #[must_use]
    pub fn get(&self, emotion: &str) -> Option<&SpritePair> {
        self.emotions.get(emotion)
    }

    /// Listening frame, if loaded
    #[must_use]
    pub fn listening(&self) -> Option<&Frame> {
        self.listening.as_ref()
    }

    /// Whether an emotion has sprites
    #[must_use]
    pub fn contains(&self, emotion: &str) -> bool {
        self.emotions.contains_key(emotion)
    }

    /// Loaded emotion names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.emotions.keys().map(String::as_str)
    }

    /// Whether no emotion loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emotions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba as ImgRgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, color: [u8; 4], size: (u32, u32)) {
        let img = RgbaImage::from_pixel(size.0, size.1, ImgRgba(color));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_load_pairs_and_listening() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "happy.png", [255, 0, 0, 255], (8, 6));
        write_png(dir.path(), "happy_speaking.png", [0, 255, 0, 255], (8, 6));
        write_png(dir.path(), "sad.png", [0, 0, 255, 255], (16, 12));
        write_png(dir.path(), "sad_active.png", [9, 9, 9, 255], (8, 6));
        write_png(dir.path(), "listening.png", [1, 2, 3, 255], (8, 6));

        let set = SpriteSet::load(dir.path(), (8, 6));
        assert!(set.contains("happy"));
        assert!(set.contains("sad"));
        assert!(!set.contains("listening"));
        assert!(!set.contains("sad_active"));
        assert!(set.listening().is_some());

        let happy = set.get("happy").unwrap();
        assert_eq!(happy.speaking.get(0, 0).map(|p| p.g), Some(255));

        // Missing speaking frame reuses the base; oversized frames are scaled
        let sad = set.get("sad").unwrap();
        assert_eq!(sad.speaking, sad.base);
        assert_eq!((sad.base.width(), sad.base.height()), (8, 6));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = SpriteSet::load(&dir.path().join("missing"), (8, 6));
        assert!(set.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("angry.png"), b"not a png").unwrap();
        write_png(dir.path(), "happy.png", [255, 0, 0, 255], (4, 4));
        let set = SpriteSet::load(dir.path(), (4, 4));
        assert!(set.contains("happy"));
        assert!(!set.contains("angry"));
    }
}
