//! Property tests for the timing-sensitive state machines

use std::time::{Duration, Instant};

use proptest::prelude::*;

use expression_core::config::TouchConfig;
use expression_core::display::{Arbitration, DisplayModel};
use expression_core::{
    Effect, EmotionPresets, Gesture, GestureClassifier, GestureThresholds, Point, PointerEvent,
    TransitionController,
};

fn pointer_trace() -> impl Strategy<Value = (Vec<(f32, f32)>, u64)> {
    (
        prop::collection::vec((0.0f32..320.0, 0.0f32..240.0), 1..12),
        10u64..1500,
    )
}

fn replay(path: &[(f32, f32)], held_ms: u64, t0: Instant) -> Option<Gesture> {
    let mut classifier = GestureClassifier::new(GestureThresholds::default());
    let (x0, y0) = path[0];
    classifier.handle(PointerEvent::Down {
        pos: Point::new(x0, y0),
        at: t0,
    });
    for &(x, y) in &path[1..] {
        classifier.handle(PointerEvent::Move {
            pos: Point::new(x, y),
        });
    }
    let (xn, yn) = path[path.len() - 1];
    classifier.handle(PointerEvent::Up {
        pos: Point::new(xn, yn),
        at: t0 + Duration::from_millis(held_ms),
    })
}

proptest! {
    #[test]
    fn prop_transition_alpha_is_monotonic_and_commits(
        duration_ms in 1u64..3000,
        steps in prop::collection::vec(1u64..200, 1..100),
    ) {
        let mut tc = TransitionController::new("happy");
        tc.start_transition("happy", "sad", Duration::from_millis(duration_ms));

        let mut last = 0.0f32;
        for dt in steps {
            let alpha = tc.update(Duration::from_millis(dt)).alpha;
            prop_assert!(alpha >= last);
            prop_assert!(alpha <= 1.0);
            last = alpha;
        }

        // Drive to completion
        for _ in 0..100 {
            if !tc.is_transitioning() {
                break;
            }
            tc.update(Duration::from_millis(100));
        }
        prop_assert!(!tc.is_transitioning());
        prop_assert_eq!(tc.committed(), "sad");
    }

    #[test]
    fn prop_gesture_classification_is_deterministic((path, held_ms) in pointer_trace()) {
        let t0 = Instant::now();
        let first = replay(&path, held_ms, t0);
        let second = replay(&path, held_ms, t0);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_accepted_effects_never_overlap_busy_window(
        gaps in prop::collection::vec(50u64..2000, 1..40),
    ) {
        let mut touch = TouchConfig::default();
        touch.effects.insert(Gesture::Drag, Effect {
            emotion: Some("playful".into()),
            ..Default::default()
        });
        let busy = touch.thresholds.effect_busy_window;
        let mut model = DisplayModel::new(EmotionPresets::builtin().names().map(str::to_string));

        let t0 = Instant::now();
        let mut now = t0;
        let mut last_accepted: Option<Instant> = None;
        for gap in gaps {
            now += Duration::from_millis(gap);
            if let Arbitration::Accepted(_) = model.arbitrate(Gesture::Drag, now, &touch) {
                if let Some(previous) = last_accepted {
                    prop_assert!(now.duration_since(previous) >= busy);
                }
                last_accepted = Some(now);
                // Playback finishes immediately
                model.set_petting(false, now);
            }
        }
    }
}
