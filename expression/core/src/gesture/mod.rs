//! Gesture Classification
//!
//! Turns raw pointer down/move/up events into named gestures. The
//! classifier is a pure state machine: every event carries the timestamps it
//! needs, so identical event sequences always classify identically.
//!
//! Classification happens on pointer-up, in this order:
//!
//! 1. `long_press` - held at least `long_press` and moved less than the drag
//!    distance
//! 2. `tap` / `double_tap` - short and nearly still; a single tap is held
//!    back for `double_tap_window` in case a second one follows
//! 3. `scroll` - a long path that returns close to where it started
//!    (a circular rub)
//! 4. `drag` - anything else that travelled far enough
//!
//! Travel distance is the Manhattan length of the path, accumulated over
//! move events only.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Pointer position in frame pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

impl Point {
    /// Create a point
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another point
    #[must_use]
    pub fn manhattan(self, other: Point) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

/// A raw pointer event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// Contact started
    Down {
        /// Where
        pos: Point,
        /// When
        at: Instant,
    },
    /// Contact moved (only meaningful while held)
    Move {
        /// New position
        pos: Point,
    },
    /// Contact ended
    Up {
        /// Where
        pos: Point,
        /// When
        at: Instant,
    },
}

/// A recognized gesture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// Single short touch
    Tap,
    /// Two taps in quick succession
    DoubleTap,
    /// Touch held in place
    LongPress,
    /// Touch moved in one direction
    Drag,
    /// Circular rubbing motion
    Scroll,
}

impl Gesture {
    /// All gestures, in classification order
    pub const ALL: [Gesture; 5] = [
        Gesture::LongPress,
        Gesture::Tap,
        Gesture::DoubleTap,
        Gesture::Scroll,
        Gesture::Drag,
    ];

    /// Configuration key for this gesture
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Gesture::Tap => "tap",
            Gesture::DoubleTap => "double_tap",
            Gesture::LongPress => "long_press",
            Gesture::Drag => "drag",
            Gesture::Scroll => "scroll",
        }
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized gesture name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown gesture: {0}")]
pub struct UnknownGesture(pub String);

impl FromStr for Gesture {
    type Err = UnknownGesture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gesture::ALL
            .into_iter()
            .find(|g| g.as_str() == s.trim())
            .ok_or_else(|| UnknownGesture(s.to_string()))
    }
}

/// Thresholds for classification and effect arbitration
#[derive(Clone, Debug, PartialEq)]
pub struct GestureThresholds {
    /// Max travel for a tap
    pub tap_distance: f32,
    /// Min hold for a long press
    pub long_press: Duration,
    /// Min travel for a drag (and max travel for a long press)
    pub drag_distance: f32,
    /// Max gap between two taps of a double tap
    pub double_tap_window: Duration,
    /// Min path length for a scroll
    pub circle_distance: f32,
    /// Max start-to-end distance for a scroll
    pub circle_return: f32,
    /// Max closure/path ratio for a scroll
    pub circle_ratio: f32,
    /// Min gap between accepted gestures
    pub cooldown: Duration,
    /// Min gap between delivered effects
    pub effect_cooldown: Duration,
    /// Base busy window after an effect is dispatched
    pub effect_busy_window: Duration,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            tap_distance: 20.0,
            long_press: Duration::from_millis(600),
            drag_distance: 60.0,
            double_tap_window: Duration::from_millis(350),
            circle_distance: 140.0,
            circle_return: 45.0,
            circle_ratio: 0.25,
            cooldown: Duration::from_millis(800),
            effect_cooldown: Duration::from_millis(400),
            effect_busy_window: Duration::from_millis(1200),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Press {
    down_pos: Point,
    last_pos: Point,
    down_time: Instant,
    travel: f32,
}

/// Pointer event state machine
#[derive(Clone, Debug)]
pub struct GestureClassifier {
    thresholds: GestureThresholds,
    press: Option<Press>,
    pending_tap: Option<Instant>,
}

impl GestureClassifier {
    /// Create a classifier
    #[must_use]
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            press: None,
            pending_tap: None,
        }
    }

    /// Thresholds in use
    #[must_use]
    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    /// Feed one pointer event
    ///
    /// Returns a gesture when the event completes one. A single tap is never
    /// returned here; it is reported by [`Self::resolve_pending`] once the
    /// double-tap window has passed.
    pub fn handle(&mut self, event: PointerEvent) -> Option<Gesture> {
        match event {
            PointerEvent::Down { pos, at } => {
                self.press = Some(Press {
                    down_pos: pos,
                    last_pos: pos,
                    down_time: at,
                    travel: 0.0,
                });
                None
            }
            PointerEvent::Move { pos } => {
                if let Some(press) = self.press.as_mut() {
                    press.travel += press.last_pos.manhattan(pos);
                    press.last_pos = pos;
                }
                None
            }
            PointerEvent::Up { pos, at } => {
                let press = self.press.take()?;
                self.classify(&press, pos, at)
            }
        }
    }

    fn classify(&mut self, press: &Press, up_pos: Point, up_at: Instant) -> Option<Gesture> {
        let t = &self.thresholds;
        let duration = up_at.saturating_duration_since(press.down_time);
        let dist = press.travel;

        if duration >= t.long_press && dist < t.drag_distance {
            return Some(Gesture::LongPress);
        }

        if dist < t.tap_distance && duration < t.long_press {
            if let Some(pending) = self.pending_tap {
                if up_at.saturating_duration_since(pending) <= t.double_tap_window {
                    self.pending_tap = None;
                    return Some(Gesture::DoubleTap);
                }
            }
            self.pending_tap = Some(up_at);
            return None;
        }

        let closure = press.down_pos.manhattan(up_pos);
        let ratio = closure / dist.max(1e-6);
        if dist >= t.circle_distance && closure <= t.circle_return && ratio <= t.circle_ratio {
            return Some(Gesture::Scroll);
        }

        if dist >= t.drag_distance {
            return Some(Gesture::Drag);
        }

        None
    }

    /// Report a held-back single tap once its double-tap window has expired
    pub fn resolve_pending(&mut self, now: Instant) -> Option<Gesture> {
        let pending = self.pending_tap?;
        if now.saturating_duration_since(pending) > self.thresholds.double_tap_window {
            self.pending_tap = None;
            return Some(Gesture::Tap);
        }
        None
    }

    /// Time of the held-back single tap, if any
    #[must_use]
    pub fn pending_tap(&self) -> Option<Instant> {
        self.pending_tap
    }

    /// Whether a press is in progress
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        self.press.is_some()
    }

    /// Drop a half-finished press
    ///
    /// A pending single tap survives; it still resolves (and is then
    /// arbitrated) once its window expires.
    pub fn reset(&mut self) {
        self.press = None;
    }
}
