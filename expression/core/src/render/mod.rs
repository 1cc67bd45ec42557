//! Renderer
//!
//! Produces one frame per tick from a [`RenderPlan`] and presents it on the
//! [`DisplayBackend`]. Two modes:
//!
//! - **Sprite**: discrete per-emotion frames, cross-faded during transitions
//! - **Procedural**: a face drawn from blended [`EmotionParams`]
//!
//! Procedural mode is used when configured, or when no sprites could be
//! loaded. A missing emotion falls back to `happy`; if that is missing too
//! the tick draws nothing.

mod procedural;
mod sprites;

use std::time::Duration;

pub use procedural::ProceduralFaceRenderer;
pub use sprites::{load_frame, SpritePair, SpriteSet};

use crate::backend::DisplayBackend;
use crate::config::ExpressionConfig;
use crate::emotion::{EmotionParams, EmotionPresets, FALLBACK_EMOTION};
use crate::error::DisplayError;
use crate::frame::Frame;

/// Minimum speaking level fed to the procedural mouth while speaking
const MIN_SPEAKING_LEVEL: f32 = 0.1;

/// What the render loop decided to draw this tick
///
/// Built under the state lock by strict priority: listening, then
/// speaking, then an active transition, then the static emotion.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderPlan {
    /// Listening indicator over the current emotion
    Listening {
        /// Current emotion
        emotion: String,
    },
    /// Speaking animation
    Speaking {
        /// Current emotion
        emotion: String,
        /// Sprite alternation flag
        alternate: bool,
        /// Smoothed speaking level
        level: f32,
    },
    /// Mid-transition blend
    Transition {
        /// Emotion being left
        from: String,
        /// Emotion being entered
        to: String,
        /// Blend factor
        alpha: f32,
    },
    /// Resting on one emotion
    Static {
        /// Current emotion
        emotion: String,
    },
}

impl RenderPlan {
    /// Short name for logs and stats
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RenderPlan::Listening { .. } => "listening",
            RenderPlan::Speaking { .. } => "speaking",
            RenderPlan::Transition { .. } => "transition",
            RenderPlan::Static { .. } => "static",
        }
    }
}

/// Rendering mode in use
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Sprite frames
    Sprite,
    /// Procedural face
    Procedural,
}

/// Draws frames and owns the display surface
pub struct Renderer {
    backend: Box<dyn DisplayBackend>,
    resolution: (u32, u32),
    presets: EmotionPresets,
    sprites: SpriteSet,
    procedural: Option<ProceduralFaceRenderer>,
    present_failures: u64,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("resolution", &self.resolution)
            .field("mode", &self.mode())
            .field("present_failures", &self.present_failures)
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Build a renderer from configuration
    ///
    /// Sprites are loaded here unless procedural mode is configured.
    #[must_use]
    pub fn new(config: &ExpressionConfig, backend: Box<dyn DisplayBackend>) -> Self {
        let resolution = config.display.resolution;
        let presets = EmotionPresets::builtin().with_overrides(&config.presets);

        let sprites = if config.display.procedural {
            SpriteSet::default()
        } else {
            SpriteSet::load(&config.display.image_dir, resolution)
        };

        let procedural = if config.display.procedural || sprites.is_empty() {
            if !config.display.procedural {
                tracing::warn!(
                    dir = %config.display.image_dir.display(),
                    "No emotion sprites loaded, falling back to procedural face"
                );
            }
            Some(ProceduralFaceRenderer::new(resolution, config.procedural.clone()))
        } else {
            None
        };

        Self {
            backend,
            resolution,
            presets,
            sprites,
            procedural,
            present_failures: 0,
        }
    }

    /// Sprite-mode renderer over an already loaded sprite set
    #[must_use]
    pub fn with_sprites(
        resolution: (u32, u32),
        sprites: SpriteSet,
        backend: Box<dyn DisplayBackend>,
    ) -> Self {
        Self {
            backend,
            resolution,
            presets: EmotionPresets::builtin(),
            sprites,
            procedural: None,
            present_failures: 0,
        }
    }

    /// Active rendering mode
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        if self.procedural.is_some() {
            RenderMode::Procedural
        } else {
            RenderMode::Sprite
        }
    }

    /// Screen size
    #[must_use]
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Whether `emotion` can be drawn as itself (without fallback)
    #[must_use]
    pub fn knows(&self, emotion: &str) -> bool {
        match self.mode() {
            RenderMode::Procedural => self.presets.contains(emotion),
            RenderMode::Sprite => self.sprites.contains(emotion),
        }
    }

    /// Every emotion this renderer can draw as itself
    #[must_use]
    pub fn known_emotions(&self) -> Vec<String> {
        match self.mode() {
            RenderMode::Procedural => self.presets.names().map(str::to_string).collect(),
            RenderMode::Sprite => self.sprites.names().map(str::to_string).collect(),
        }
    }

    /// Presets used by procedural mode
    #[must_use]
    pub fn presets(&self) -> &EmotionPresets {
        &self.presets
    }

    /// Bring the display surface up
    ///
    /// # Errors
    ///
    /// Propagates the backend's initialization failure.
    pub fn init(&mut self) -> Result<(), DisplayError> {
        self.backend.init(self.resolution.0, self.resolution.1)
    }

    /// The display surface
    pub fn backend_mut(&mut self) -> &mut dyn DisplayBackend {
        self.backend.as_mut()
    }

    /// Whether the display delivers pointer input
    #[must_use]
    pub fn supports_pointer(&self) -> bool {
        self.backend.supports_pointer()
    }

    /// Cached sprite for an emotion (`happy` fallback)
    #[must_use]
    pub fn get_emotion_frame(&self, emotion: &str, speaking: bool) -> Option<&Frame> {
        emotion_frame(&self.sprites, emotion, speaking)
    }

    /// Listening sprite, if loaded
    #[must_use]
    pub fn get_listening_frame(&self) -> Option<&Frame> {
        self.sprites.listening()
    }

    /// Cross-fade two frames; a missing side yields the other one
    #[must_use]
    pub fn create_blended_frame(a: Option<&Frame>, b: Option<&Frame>, alpha: f32) -> Option<Frame> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Frame::cross_fade(a, b, alpha)),
            (Some(only), None) | (None, Some(only)) => Some(only.clone()),
            (None, None) => None,
        }
    }

    /// Draw a procedural face and present it
    ///
    /// Does nothing in sprite mode.
    pub fn render_procedural(
        &mut self,
        current: &EmotionParams,
        target: Option<&EmotionParams>,
        blend_alpha: f32,
        speaking_level: f32,
        listening: bool,
        dt: Duration,
    ) -> bool {
        let Some(face) = self.procedural.as_mut() else {
            return false;
        };
        face.update_state(dt.as_secs_f32(), speaking_level, listening);
        let frame = face.render(current, target, blend_alpha, listening);
        present(self.backend.as_mut(), &mut self.present_failures, frame)
    }

    /// Present a finished frame
    pub fn render_frame(&mut self, frame: &Frame) -> bool {
        present(self.backend.as_mut(), &mut self.present_failures, frame)
    }

    /// Draw whatever the plan calls for; returns whether a frame was shown
    pub fn draw(&mut self, plan: &RenderPlan, dt: Duration) -> bool {
        match self.mode() {
            RenderMode::Procedural => self.draw_procedural(plan, dt),
            RenderMode::Sprite => self.draw_sprites(plan),
        }
    }

    fn draw_procedural(&mut self, plan: &RenderPlan, dt: Duration) -> bool {
        // Presets are cloned so the face renderer can be borrowed mutably
        match plan {
            RenderPlan::Listening { emotion } => {
                let params = self.presets.get(emotion).clone();
                self.render_procedural(&params, None, 0.0, 0.0, true, dt)
            }
            RenderPlan::Speaking { emotion, level, .. } => {
                let params = self.presets.get(emotion).clone();
                let level = level.max(MIN_SPEAKING_LEVEL);
                self.render_procedural(&params, None, 0.0, level, false, dt)
            }
            RenderPlan::Transition { from, to, alpha } => {
                let from = self.presets.get(from).clone();
                let to = self.presets.get(to).clone();
                self.render_procedural(&from, Some(&to), *alpha, 0.0, false, dt)
            }
            RenderPlan::Static { emotion } => {
                let params = self.presets.get(emotion).clone();
                self.render_procedural(&params, None, 0.0, 0.0, false, dt)
            }
        }
    }

    fn draw_sprites(&mut self, plan: &RenderPlan) -> bool {
        let backend = self.backend.as_mut();
        let failures = &mut self.present_failures;
        let sprites = &self.sprites;

        match plan {
            RenderPlan::Listening { emotion } => {
                // Without a listening sprite the resting emotion stands in;
                // speaking or transition frames never show while listening
                let frame = sprites
                    .listening()
                    .or_else(|| emotion_frame(sprites, emotion, false));
                frame.is_some_and(|f| present(backend, failures, f))
            }
            RenderPlan::Speaking {
                emotion, alternate, ..
            } => emotion_frame(sprites, emotion, *alternate)
                .is_some_and(|f| present(backend, failures, f)),
            RenderPlan::Transition { from, to, alpha } => {
                let blended = Self::create_blended_frame(
                    emotion_frame(sprites, from, false),
                    emotion_frame(sprites, to, false),
                    *alpha,
                );
                blended.is_some_and(|f| present(backend, failures, &f))
            }
            RenderPlan::Static { emotion } => emotion_frame(sprites, emotion, false)
                .is_some_and(|f| present(backend, failures, f)),
        }
    }

    /// Release the display surface
    pub fn cleanup(&mut self) {
        self.backend.cleanup();
    }
}

fn emotion_frame<'a>(sprites: &'a SpriteSet, emotion: &str, speaking: bool) -> Option<&'a Frame> {
    let pair = sprites
        .get(emotion)
        .or_else(|| sprites.get(FALLBACK_EMOTION))?;
    Some(if speaking { &pair.speaking } else { &pair.base })
}

fn present(backend: &mut dyn DisplayBackend, failures: &mut u64, frame: &Frame) -> bool {
    match backend.present(frame) {
        Ok(()) => true,
        Err(e) => {
            *failures += 1;
            if *failures == 1 {
                tracing::warn!(error = %e, "Failed to present frame");
            } else {
                tracing::debug!(error = %e, failures = *failures, "Failed to present frame");
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{HeadlessDisplay, HeadlessHandle};
    use crate::frame::Rgba;

    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const BLUE: Rgba = Rgba::new(0, 0, 255, 255);
    const GREEN: Rgba = Rgba::new(0, 255, 0, 255);

    fn pair(base: Rgba, speaking: Rgba) -> SpritePair {
        SpritePair {
            base: Frame::filled(4, 4, base),
            speaking: Frame::filled(4, 4, speaking),
        }
    }

    fn sprite_renderer() -> (Renderer, HeadlessHandle) {
        let mut sprites = SpriteSet::default();
        sprites.insert("happy", pair(RED, GREEN));
        sprites.insert("sad", pair(BLUE, BLUE));
        let (display, handle) = HeadlessDisplay::new();
        (Renderer::with_sprites((4, 4), sprites, Box::new(display)), handle)
    }

    fn shown(handle: &HeadlessHandle) -> Rgba {
        handle.last_frame().and_then(|f| f.get(0, 0)).unwrap()
    }

    #[test]
    fn test_unknown_emotion_falls_back_to_happy() {
        let (renderer, _) = sprite_renderer();
        let frame = renderer.get_emotion_frame("confused", false).unwrap();
        assert_eq!(frame.get(1, 1), Some(RED));
        assert!(!renderer.knows("confused"));
    }

    #[test]
    fn test_missing_fallback_draws_nothing() {
        let mut sprites = SpriteSet::default();
        sprites.insert("sad", pair(BLUE, BLUE));
        let (display, handle) = HeadlessDisplay::new();
        let mut renderer = Renderer::with_sprites((4, 4), sprites, Box::new(display));
        let plan = RenderPlan::Static {
            emotion: "angry".into(),
        };
        assert!(!renderer.draw(&plan, Duration::ZERO));
        assert_eq!(handle.frames_presented(), 0);
    }

    #[test]
    fn test_blended_frame_with_one_side_missing() {
        let a = Frame::filled(2, 2, RED);
        let out = Renderer::create_blended_frame(Some(&a), None, 0.7).unwrap();
        assert_eq!(out, a);
        assert!(Renderer::create_blended_frame(None, None, 0.5).is_none());
    }

    #[test]
    fn test_speaking_plan_uses_alternate_frame() {
        let (mut renderer, handle) = sprite_renderer();
        let plan = RenderPlan::Speaking {
            emotion: "happy".into(),
            alternate: true,
            level: 1.0,
        };
        assert!(renderer.draw(&plan, Duration::ZERO));
        assert_eq!(shown(&handle), GREEN);
    }

    #[test]
    fn test_transition_plan_cross_fades() {
        let (mut renderer, handle) = sprite_renderer();
        let plan = RenderPlan::Transition {
            from: "happy".into(),
            to: "sad".into(),
            alpha: 0.5,
        };
        renderer.draw(&plan, Duration::ZERO);
        assert_eq!(shown(&handle), Rgba::new(128, 0, 128, 255));
    }

    #[test]
    fn test_listening_without_sprite_shows_base_emotion() {
        let (mut renderer, handle) = sprite_renderer();
        let plan = RenderPlan::Listening {
            emotion: "happy".into(),
        };
        renderer.draw(&plan, Duration::ZERO);
        assert_eq!(shown(&handle), RED);
    }

    #[test]
    fn test_empty_sprite_dir_selects_procedural() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ExpressionConfig::default();
        config.display.image_dir = dir.path().to_path_buf();
        config.display.resolution = (64, 48);
        let (display, _) = HeadlessDisplay::new();
        let renderer = Renderer::new(&config, Box::new(display));
        assert_eq!(renderer.mode(), RenderMode::Procedural);
        assert!(renderer.knows("sleepy"));
    }
}
