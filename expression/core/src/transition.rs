//! Emotion Transitions
//!
//! Time-driven interpolation between two emotions. The controller is a
//! small two-state machine:
//!
//! ```text
//!   Idle ──start_transition──► Transitioning ──alpha reaches 1.0──► Idle
//!                                    │                               ▲
//!                                    └──────────skip_to_end──────────┘
//! ```
//!
//! The controller is deterministic: given the same `start_transition` call
//! and the same sequence of `update` deltas it yields the same alphas. It
//! never reads a clock itself.

use std::time::Duration;

/// Shortest transition accepted; shorter requests are clamped up
pub const MIN_TRANSITION: Duration = Duration::from_millis(100);

/// One interpolation sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionSample<'a> {
    /// Emotion being left
    pub from: &'a str,
    /// Emotion being entered
    pub to: &'a str,
    /// Blend factor in [0, 1]
    pub alpha: f32,
}

#[derive(Clone, Debug)]
struct ActiveTransition {
    from: String,
    to: String,
    duration: Duration,
    elapsed: Duration,
    alpha: f32,
}

/// Interpolation state machine between two emotions
#[derive(Clone, Debug)]
pub struct TransitionController {
    current: String,
    active: Option<ActiveTransition>,
}

impl TransitionController {
    /// Create an idle controller resting on `initial`
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: initial.into(),
            active: None,
        }
    }

    /// Begin interpolating from `from` to `to`
    ///
    /// Any transition already in progress is replaced. The duration is
    /// clamped to at least [`MIN_TRANSITION`].
    pub fn start_transition(&mut self, from: &str, to: &str, duration: Duration) {
        let duration = duration.max(MIN_TRANSITION);
        tracing::trace!(from, to, ?duration, "Starting emotion transition");
        self.active = Some(ActiveTransition {
            from: from.to_string(),
            to: to.to_string(),
            duration,
            elapsed: Duration::ZERO,
            alpha: 0.0,
        });
    }

    /// Advance by `dt` and report the blend
    ///
    /// When alpha reaches 1.0 the target is committed as the current emotion
    /// and the controller goes idle within this same call. Idle controllers
    /// report `(current, current, 1.0)`.
    pub fn update(&mut self, dt: Duration) -> TransitionSample<'_> {
        let finished = match self.active.as_mut() {
            Some(active) => {
                active.elapsed += dt;
                let ratio = active.elapsed.as_secs_f32() / active.duration.as_secs_f32();
                active.alpha = ratio.min(1.0).max(active.alpha);
                active.alpha >= 1.0
            }
            None => false,
        };

        if finished {
            if let Some(done) = self.active.take() {
                self.current = done.to;
            }
            return TransitionSample {
                from: &self.current,
                to: &self.current,
                alpha: 1.0,
            };
        }

        self.sample()
    }

    /// Current blend without advancing time
    #[must_use]
    pub fn sample(&self) -> TransitionSample<'_> {
        match &self.active {
            Some(active) => TransitionSample {
                from: &active.from,
                to: &active.to,
                alpha: active.alpha,
            },
            None => TransitionSample {
                from: &self.current,
                to: &self.current,
                alpha: 1.0,
            },
        }
    }

    /// Commit the target immediately
    pub fn skip_to_end(&mut self) {
        if let Some(done) = self.active.take() {
            self.current = done.to;
        }
    }

    /// Whether a transition is in progress
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.active.is_some()
    }

    /// The last committed emotion
    #[must_use]
    pub fn committed(&self) -> &str {
        &self.current
    }

    /// The emotion a viewer would name right now
    ///
    /// While transitioning this is the target once the blend passes the
    /// halfway point, the source before that.
    #[must_use]
    pub fn current_emotion(&self) -> &str {
        match &self.active {
            Some(active) if active.alpha >= 0.5 => &active.to,
            Some(active) => &active.from,
            None => &self.current,
        }
    }

    /// Target of the active transition, if any
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.to.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_idle_reports_current() {
        let mut tc = TransitionController::new("happy");
        let sample = tc.update(secs(0.1));
        assert_eq!(sample.from, "happy");
        assert_eq!(sample.to, "happy");
        assert!((sample.alpha - 1.0).abs() < f32::EPSILON);
        assert!(!tc.is_transitioning());
    }

    #[test]
    fn test_transition_progress_and_commit() {
        let mut tc = TransitionController::new("happy");
        tc.start_transition("happy", "sad", secs(0.5));

        let sample = tc.update(secs(0.25));
        assert_eq!((sample.from, sample.to), ("happy", "sad"));
        assert!((sample.alpha - 0.5).abs() < 1e-6);
        assert!(tc.is_transitioning());

        let sample = tc.update(secs(0.3));
        assert_eq!((sample.from, sample.to), ("sad", "sad"));
        assert!((sample.alpha - 1.0).abs() < f32::EPSILON);
        assert!(!tc.is_transitioning());
        assert_eq!(tc.committed(), "sad");
    }

    #[test]
    fn test_duration_clamped_to_minimum() {
        let mut tc = TransitionController::new("happy");
        tc.start_transition("happy", "angry", Duration::ZERO);
        let sample = tc.update(secs(0.05));
        assert!((sample.alpha - 0.5).abs() < 1e-4);
        tc.update(secs(0.05));
        assert_eq!(tc.committed(), "angry");
    }

    #[test]
    fn test_skip_to_end_commits() {
        let mut tc = TransitionController::new("happy");
        tc.start_transition("happy", "sleepy", secs(2.0));
        tc.update(secs(0.1));
        tc.skip_to_end();
        assert!(!tc.is_transitioning());
        assert_eq!(tc.committed(), "sleepy");
    }

    #[test]
    fn test_current_emotion_switches_at_halfway() {
        let mut tc = TransitionController::new("happy");
        tc.start_transition("happy", "curious", secs(1.0));
        tc.update(secs(0.4));
        assert_eq!(tc.current_emotion(), "happy");
        tc.update(secs(0.2));
        assert_eq!(tc.current_emotion(), "curious");
        assert_eq!(tc.target(), Some("curious"));
    }

    #[test]
    fn test_restart_replaces_active_transition() {
        let mut tc = TransitionController::new("happy");
        tc.start_transition("happy", "sad", secs(1.0));
        tc.update(secs(0.8));
        tc.start_transition("happy", "bored", secs(1.0));
        let sample = tc.sample();
        assert_eq!(sample.to, "bored");
        assert!(sample.alpha.abs() < f32::EPSILON);
    }
}
