//! Display State Model
//!
//! Everything the render loop mutates lives in [`DisplayModel`], guarded by
//! a single mutex in the orchestrator. Methods here are plain state
//! transitions with explicit `now`/`dt` arguments; nothing reads a clock or
//! touches the display, which keeps the priority and arbitration rules
//! testable without threads.

use std::collections::HashSet;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use crate::command::DisplayCommand;
use crate::config::{ExpressionConfig, TouchConfig};
use crate::effects::Effect;
use crate::emotion::FALLBACK_EMOTION;
use crate::gesture::Gesture;
use crate::render::RenderPlan;
use crate::transition::TransitionController;

/// Transition length used when an effect changes the emotion
pub const EFFECT_TRANSITION: Duration = Duration::from_millis(400);

/// Mutable display state
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    /// Committed emotion; always one the renderer knows
    pub current_emotion: String,
    /// Transition target, set only while transitioning
    pub target_emotion: Option<String>,
    /// Listening indicator on
    pub is_listening: bool,
    /// Speaking animation on
    pub is_speaking: bool,
    /// Sprite alternation flag
    pub speaking_frame_toggle: bool,
    /// When the alternation flag last flipped
    pub last_toggle: Option<Instant>,
    /// Smoothed speaking level
    pub speaking_level: f32,
    /// Requested speaking level
    pub speaking_level_target: f32,
    /// Speaking wave phase in radians
    pub speaking_phase: f32,
    /// Last gesture that passed the cooldown gate
    pub last_gesture_time: Option<Instant>,
    /// Held-back single tap (mirrors the classifier)
    pub pending_tap_time: Option<Instant>,
    /// Gestures are ignored until this instant
    pub gesture_busy_until: Option<Instant>,
    /// Petting lock: an effect is playing
    pub petting_active: bool,
    /// When the petting lock was taken
    pub petting_since: Option<Instant>,
    /// Last effect actually delivered
    pub last_effect_time: Option<Instant>,
}

impl DisplayState {
    fn new(initial: &str) -> Self {
        Self {
            current_emotion: initial.to_string(),
            target_emotion: None,
            is_listening: false,
            is_speaking: false,
            speaking_frame_toggle: false,
            last_toggle: None,
            speaking_level: 0.0,
            speaking_level_target: 0.0,
            speaking_phase: 0.0,
            last_gesture_time: None,
            pending_tap_time: None,
            gesture_busy_until: None,
            petting_active: false,
            petting_since: None,
            last_effect_time: None,
        }
    }
}

/// Point-in-time copy of the observable display state
#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySnapshot {
    /// Committed emotion
    pub current_emotion: String,
    /// Transition target, if transitioning
    pub target_emotion: Option<String>,
    /// Transition blend (1.0 when idle)
    pub transition_alpha: f32,
    /// Listening indicator on
    pub is_listening: bool,
    /// Speaking animation on
    pub is_speaking: bool,
    /// Smoothed speaking level
    pub speaking_level: f32,
    /// Petting lock held
    pub petting_active: bool,
    /// Time left in the gesture busy window
    pub busy_remaining: Duration,
    /// A single tap is waiting on the double-tap window
    pub tap_pending: bool,
    /// What the renderer would draw right now
    pub render_plan: &'static str,
}

/// Per-tick animation settings
#[derive(Clone, Debug, PartialEq)]
pub struct MotionTuning {
    /// Sprite alternation interval
    pub toggle_interval: Duration,
    /// Smooth the speaking level (procedural mode)
    pub smooth_speaking: bool,
    /// Speaking level smoothing rate
    pub speaking_smooth: f32,
    /// Fraction of the level kept at the wave trough
    pub rest_factor: f32,
    /// Wave frequency
    pub wave_hz: f32,
}

impl MotionTuning {
    /// Tuning from configuration
    #[must_use]
    pub fn from_config(config: &ExpressionConfig, procedural: bool) -> Self {
        Self {
            toggle_interval: config.display.toggle_interval,
            smooth_speaking: procedural,
            speaking_smooth: config.procedural.speaking_smooth,
            rest_factor: config.procedural.speaking_rest_factor,
            wave_hz: config.procedural.speaking_wave_hz,
        }
    }
}

/// Outcome of offering a gesture to the arbiter
#[derive(Clone, Debug, PartialEq)]
pub enum Arbitration {
    /// Within the cooldown of the previous gesture
    Cooldown,
    /// Inside the busy window of a previous effect
    Busy,
    /// An effect is still playing
    Petting,
    /// No effect configured for the gesture
    Unmapped,
    /// Accepted, but too soon after the last delivered effect
    Suppressed,
    /// Accepted; the effect must be delivered
    Accepted(Effect),
}

/// Display state plus its transition controller
#[derive(Debug)]
pub struct DisplayModel {
    /// Raw state
    pub state: DisplayState,
    transition: TransitionController,
    known: HashSet<String>,
}

impl DisplayModel {
    /// Create a model resting on `happy` (or the first known emotion)
    #[must_use]
    pub fn new(known: impl IntoIterator<Item = String>) -> Self {
        let known: HashSet<String> = known.into_iter().collect();
        let initial = if known.contains(FALLBACK_EMOTION) || known.is_empty() {
            FALLBACK_EMOTION.to_string()
        } else {
            let mut names: Vec<&String> = known.iter().collect();
            names.sort();
            names[0].clone()
        };
        Self {
            state: DisplayState::new(&initial),
            transition: TransitionController::new(initial),
            known,
        }
    }

    /// Map a requested emotion onto one the renderer can draw
    #[must_use]
    pub fn resolve_emotion(&self, requested: &str) -> String {
        if self.known.contains(requested) {
            return requested.to_string();
        }
        tracing::warn!(emotion = requested, fallback = FALLBACK_EMOTION, "Unknown emotion");
        FALLBACK_EMOTION.to_string()
    }

    /// The transition controller
    #[must_use]
    pub fn transition(&self) -> &TransitionController {
        &self.transition
    }

    /// Begin a transition unless already resting on `emotion`
    ///
    /// Returns whether a transition was started.
    pub fn start_emotion_transition(&mut self, emotion: &str, duration: Duration) -> bool {
        let emotion = self.resolve_emotion(emotion);
        if emotion == self.state.current_emotion && !self.transition.is_transitioning() {
            return false;
        }
        self.transition
            .start_transition(&self.state.current_emotion, &emotion, duration);
        tracing::debug!(
            from = %self.state.current_emotion,
            to = %emotion,
            ?duration,
            "Emotion transition started"
        );
        self.state.target_emotion = Some(emotion);
        true
    }

    /// Apply one queued command
    pub fn apply(&mut self, command: DisplayCommand, now: Instant) {
        match command {
            DisplayCommand::SetEmotion { emotion, duration } => {
                self.start_emotion_transition(&emotion, duration);
            }
            DisplayCommand::SetListening { active } => {
                self.state.is_listening = active;
                tracing::debug!(active, "Listening");
            }
            DisplayCommand::SetSpeaking { active, level } => {
                let level = level.unwrap_or(if active { 1.0 } else { 0.0 });
                self.state.is_speaking = active;
                self.state.speaking_level_target = level.clamp(0.0, 1.0);
                self.state.speaking_phase = 0.0;
                if !active {
                    self.state.speaking_frame_toggle = false;
                }
                tracing::debug!(active, level, "Speaking");
            }
            DisplayCommand::SetPetting { active } => self.set_petting(active, now),
            DisplayCommand::ApplyEffect { effect } => {
                if let Some(sound) = effect.sound() {
                    tracing::info!(sound, "Gesture sound requested");
                }
                if let Some(text) = effect.speak() {
                    tracing::info!(text, "Gesture speech requested");
                }
                if let Some(action) = effect.hardware() {
                    tracing::info!(action, "Gesture hardware action requested");
                }
                // Nothing plays locally, so nothing will release the lock later
                self.set_petting(false, now);
            }
        }
    }

    /// Set or clear the petting lock
    pub fn set_petting(&mut self, active: bool, now: Instant) {
        self.state.petting_active = active;
        self.state.petting_since = active.then_some(now);
    }

    /// Advance transitions and animation by one tick
    pub fn advance(&mut self, dt: Duration, now: Instant, tuning: &MotionTuning) {
        if self.transition.is_transitioning() {
            self.transition.update(dt);
            if !self.transition.is_transitioning() {
                self.state.current_emotion = self.transition.committed().to_string();
                self.state.target_emotion = None;
            }
        }

        if self.state.is_speaking || self.state.is_listening {
            let due = self
                .state
                .last_toggle
                .map_or(true, |t| now.saturating_duration_since(t) >= tuning.toggle_interval);
            if due {
                self.state.speaking_frame_toggle = !self.state.speaking_frame_toggle;
                self.state.last_toggle = Some(now);
            }
        }

        if tuning.smooth_speaking {
            let dt = dt.as_secs_f32();
            let blend = 1.0 - (-tuning.speaking_smooth.max(1e-3) * dt).exp();
            let mut target = 0.0;
            if self.state.is_speaking {
                self.state.speaking_phase += TAU * tuning.wave_hz * dt;
                let wave = 0.5 + 0.5 * self.state.speaking_phase.sin();
                let rest = tuning.rest_factor;
                target = self.state.speaking_level_target * (rest + (1.0 - rest) * wave);
            }
            self.state.speaking_level += (target - self.state.speaking_level) * blend;
        }
    }

    /// Release a petting lock held longer than `timeout`
    pub fn release_stale_petting(&mut self, now: Instant, timeout: Option<Duration>) -> bool {
        let (Some(timeout), Some(since)) = (timeout, self.state.petting_since) else {
            return false;
        };
        if self.state.petting_active && now.saturating_duration_since(since) > timeout {
            tracing::warn!(?timeout, "Petting lock held too long, releasing it");
            self.set_petting(false, now);
            return true;
        }
        false
    }

    /// Decide what to draw, by strict priority
    #[must_use]
    pub fn render_plan(&self) -> RenderPlan {
        let emotion = self.state.current_emotion.clone();
        if self.state.is_listening {
            return RenderPlan::Listening { emotion };
        }
        if self.state.is_speaking {
            return RenderPlan::Speaking {
                emotion,
                alternate: self.state.speaking_frame_toggle,
                level: self.state.speaking_level,
            };
        }
        if self.transition.is_transitioning() {
            let sample = self.transition.sample();
            return RenderPlan::Transition {
                from: sample.from.to_string(),
                to: sample.to.to_string(),
                alpha: sample.alpha,
            };
        }
        RenderPlan::Static { emotion }
    }

    /// Offer a recognized gesture to the effect arbiter
    ///
    /// On acceptance the petting lock is taken, the busy window is set
    /// (stretched for speech) and an effect emotion starts its transition.
    pub fn arbitrate(&mut self, gesture: Gesture, now: Instant, touch: &TouchConfig) -> Arbitration {
        let t = &touch.thresholds;
        let since = |at: Option<Instant>| at.map(|at| now.saturating_duration_since(at));

        if since(self.state.last_gesture_time).is_some_and(|d| d < t.cooldown) {
            tracing::trace!(%gesture, "Gesture inside cooldown");
            return Arbitration::Cooldown;
        }
        if self.state.gesture_busy_until.is_some_and(|until| now < until) {
            tracing::trace!(%gesture, "Gesture inside busy window");
            return Arbitration::Busy;
        }
        if self.state.petting_active {
            tracing::trace!(%gesture, "Gesture while petting lock held");
            return Arbitration::Petting;
        }
        self.state.last_gesture_time = Some(now);

        let Some(effect) = touch.effects.get(&gesture).filter(|e| !e.is_empty()) else {
            tracing::debug!(%gesture, "Gesture has no configured effect");
            return Arbitration::Unmapped;
        };

        self.set_petting(true, now);
        self.state.gesture_busy_until = Some(now + t.effect_busy_window);

        if since(self.state.last_effect_time).is_some_and(|d| d < t.effect_cooldown) {
            self.set_petting(false, now);
            tracing::debug!(%gesture, "Effect suppressed by cooldown");
            return Arbitration::Suppressed;
        }
        self.state.last_effect_time = Some(now);

        if let Some(emotion) = effect.emotion() {
            self.start_emotion_transition(emotion, EFFECT_TRANSITION);
        }

        let busy = effect.busy_duration(t.effect_busy_window);
        self.state.gesture_busy_until = Some(now + busy);
        tracing::info!(%gesture, busy_ms = busy.as_millis() as u64, "Gesture effect accepted");

        Arbitration::Accepted(effect.clone())
    }

    /// Observable copy of the state
    #[must_use]
    pub fn snapshot(&self, now: Instant) -> DisplaySnapshot {
        DisplaySnapshot {
            current_emotion: self.state.current_emotion.clone(),
            target_emotion: self.state.target_emotion.clone(),
            transition_alpha: self.transition.sample().alpha,
            is_listening: self.state.is_listening,
            is_speaking: self.state.is_speaking,
            speaking_level: self.state.speaking_level,
            petting_active: self.state.petting_active,
            busy_remaining: self
                .state
                .gesture_busy_until
                .map_or(Duration::ZERO, |until| until.saturating_duration_since(now)),
            tap_pending: self.state.pending_tap_time.is_some(),
            render_plan: self.render_plan().kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectMap;
    use crate::emotion::EmotionPresets;

    fn model() -> DisplayModel {
        DisplayModel::new(EmotionPresets::builtin().names().map(str::to_string))
    }

    fn tuning() -> MotionTuning {
        MotionTuning::from_config(&ExpressionConfig::default(), true)
    }

    fn touch_with(gesture: Gesture, effect: Effect) -> TouchConfig {
        let mut effects = EffectMap::new();
        effects.insert(gesture, effect);
        TouchConfig {
            effects,
            ..TouchConfig::default()
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_starts_on_happy() {
        let m = model();
        assert_eq!(m.state.current_emotion, "happy");
        assert_eq!(m.render_plan(), RenderPlan::Static { emotion: "happy".into() });
    }

    #[test]
    fn test_set_emotion_is_idempotent_when_resting() {
        let mut m = model();
        assert!(!m.start_emotion_transition("happy", ms(500)));
        assert!(!m.transition().is_transitioning());
    }

    #[test]
    fn test_unknown_emotion_resolves_to_happy() {
        let mut m = model();
        m.start_emotion_transition("sad", ms(100));
        m.advance(ms(200), Instant::now(), &tuning());
        assert!(m.start_emotion_transition("confused", ms(100)));
        assert_eq!(m.state.target_emotion.as_deref(), Some("happy"));
    }

    #[test]
    fn test_transition_commits_and_clears_target() {
        let mut m = model();
        let now = Instant::now();
        m.apply(
            DisplayCommand::SetEmotion {
                emotion: "sad".into(),
                duration: ms(500),
            },
            now,
        );
        m.advance(ms(250), now, &tuning());
        assert_eq!(m.state.target_emotion.as_deref(), Some("sad"));
        assert!(matches!(m.render_plan(), RenderPlan::Transition { alpha, .. } if (alpha - 0.5).abs() < 1e-6));

        m.advance(ms(300), now, &tuning());
        assert_eq!(m.state.current_emotion, "sad");
        assert_eq!(m.state.target_emotion, None);
    }

    #[test]
    fn test_listening_outranks_speaking_and_transition() {
        let mut m = model();
        let now = Instant::now();
        m.start_emotion_transition("angry", ms(1000));
        m.apply(DisplayCommand::SetSpeaking { active: true, level: None }, now);
        m.apply(DisplayCommand::SetListening { active: true }, now);
        assert_eq!(m.render_plan().kind(), "listening");

        m.apply(DisplayCommand::SetListening { active: false }, now);
        assert_eq!(m.render_plan().kind(), "speaking");

        m.apply(DisplayCommand::SetSpeaking { active: false, level: None }, now);
        assert_eq!(m.render_plan().kind(), "transition");
    }

    #[test]
    fn test_speaking_level_clamped_and_toggle_reset() {
        let mut m = model();
        let now = Instant::now();
        m.apply(DisplayCommand::SetSpeaking { active: true, level: Some(3.0) }, now);
        assert!((m.state.speaking_level_target - 1.0).abs() < f32::EPSILON);

        m.advance(ms(16), now, &tuning());
        assert!(m.state.speaking_frame_toggle);
        m.apply(DisplayCommand::SetSpeaking { active: false, level: None }, now);
        assert!(!m.state.speaking_frame_toggle);
        assert!(m.state.speaking_level_target.abs() < f32::EPSILON);
    }

    #[test]
    fn test_toggle_flips_every_interval() {
        let mut m = model();
        let base = Instant::now();
        m.apply(DisplayCommand::SetListening { active: true }, base);
        m.advance(ms(16), base, &tuning());
        assert!(m.state.speaking_frame_toggle);
        m.advance(ms(16), base + ms(100), &tuning());
        assert!(m.state.speaking_frame_toggle);
        m.advance(ms(16), base + ms(150), &tuning());
        assert!(!m.state.speaking_frame_toggle);
    }

    #[test]
    fn test_speaking_level_rises_and_decays() {
        let mut m = model();
        let now = Instant::now();
        m.apply(DisplayCommand::SetSpeaking { active: true, level: Some(1.0) }, now);
        for _ in 0..60 {
            m.advance(ms(16), now, &tuning());
        }
        assert!(m.state.speaking_level > 0.3);
        m.apply(DisplayCommand::SetSpeaking { active: false, level: None }, now);
        for _ in 0..120 {
            m.advance(ms(16), now, &tuning());
        }
        assert!(m.state.speaking_level < 0.01);
    }

    #[test]
    fn test_arbitration_accepts_and_locks() {
        let mut m = model();
        let now = Instant::now();
        let effect = Effect {
            emotion: Some("excited".into()),
            ..Default::default()
        };
        let touch = touch_with(Gesture::DoubleTap, effect.clone());

        assert_eq!(m.arbitrate(Gesture::DoubleTap, now, &touch), Arbitration::Accepted(effect));
        assert!(m.state.petting_active);
        assert_eq!(m.state.target_emotion.as_deref(), Some("excited"));
        assert_eq!(m.state.gesture_busy_until, Some(now + ms(1200)));

        // Past the cooldown but still petting
        assert_eq!(
            m.arbitrate(Gesture::DoubleTap, now + ms(900), &touch),
            Arbitration::Busy
        );
        assert_eq!(
            m.arbitrate(Gesture::DoubleTap, now + ms(1300), &touch),
            Arbitration::Petting
        );
    }

    #[test]
    fn test_arbitration_cooldown_and_unmapped() {
        let mut m = model();
        let now = Instant::now();
        let touch = TouchConfig::default();
        assert_eq!(m.arbitrate(Gesture::Tap, now, &touch), Arbitration::Unmapped);
        assert_eq!(m.arbitrate(Gesture::Tap, now + ms(500), &touch), Arbitration::Cooldown);
        assert!(!m.state.petting_active);
    }

    #[test]
    fn test_empty_effect_is_unmapped() {
        let mut m = model();
        let now = Instant::now();
        let touch = touch_with(Gesture::Tap, Effect {
            speak: Some("   ".into()),
            ..Default::default()
        });
        assert_eq!(m.arbitrate(Gesture::Tap, now, &touch), Arbitration::Unmapped);
        assert!(!m.state.petting_active);
        assert_eq!(m.state.gesture_busy_until, None);
    }

    #[test]
    fn test_effect_cooldown_suppresses() {
        let mut m = model();
        let now = Instant::now();
        let mut touch = touch_with(Gesture::Tap, Effect {
            sound: Some("chirp.wav".into()),
            ..Default::default()
        });
        touch.thresholds.cooldown = Duration::ZERO;
        touch.thresholds.effect_busy_window = Duration::ZERO;
        touch.thresholds.effect_cooldown = ms(400);

        assert!(matches!(m.arbitrate(Gesture::Tap, now, &touch), Arbitration::Accepted(_)));
        m.set_petting(false, now);
        assert_eq!(m.arbitrate(Gesture::Tap, now + ms(100), &touch), Arbitration::Suppressed);
        assert!(!m.state.petting_active);
    }

    #[test]
    fn test_speech_stretches_busy_window() {
        let mut m = model();
        let now = Instant::now();
        let touch = touch_with(Gesture::LongPress, Effect {
            speak: Some("x".repeat(40)),
            ..Default::default()
        });
        m.arbitrate(Gesture::LongPress, now, &touch);
        assert_eq!(m.state.gesture_busy_until, Some(now + ms(5500)));
    }

    #[test]
    fn test_local_apply_effect_releases_petting() {
        let mut m = model();
        let now = Instant::now();
        m.set_petting(true, now);
        m.apply(
            DisplayCommand::ApplyEffect {
                effect: Effect {
                    sound: Some("purr.wav".into()),
                    ..Default::default()
                },
            },
            now,
        );
        assert!(!m.state.petting_active);
    }

    #[test]
    fn test_stale_petting_released_only_when_configured() {
        let mut m = model();
        let now = Instant::now();
        m.set_petting(true, now);
        assert!(!m.release_stale_petting(now + Duration::from_secs(600), None));
        assert!(m.state.petting_active);
        assert!(!m.release_stale_petting(now + ms(500), Some(ms(1000))));
        assert!(m.release_stale_petting(now + ms(1500), Some(ms(1000))));
        assert!(!m.state.petting_active);
    }

    #[test]
    fn test_snapshot_reports_busy_remaining() {
        let mut m = model();
        let now = Instant::now();
        let touch = touch_with(Gesture::Drag, Effect {
            hardware: Some("wiggle".into()),
            ..Default::default()
        });
        m.arbitrate(Gesture::Drag, now, &touch);
        let snap = m.snapshot(now + ms(200));
        assert_eq!(snap.busy_remaining, ms(1000));
        assert!(snap.petting_active);
        assert_eq!(snap.render_plan, "static");
    }
}
