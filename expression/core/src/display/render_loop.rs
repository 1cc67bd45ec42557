//! Render Loop
//!
//! One tick of the expression engine, in order:
//!
//! ```text
//!  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   ┌────────┐   ┌─────────────┐
//!  │ drain queue │──►│ poll hard    │──►│ update model │──►│ render │──►│ poll input, │
//!  │ (locked)    │   │ stop signal  │   │ + plan       │   │        │   │ arbitrate   │
//!  └─────────────┘   └──────────────┘   │ (locked)     │   └────────┘   └─────────────┘
//!                                       └──────────────┘
//! ```
//!
//! The state lock is never held while drawing, polling input or running
//! callbacks. [`RenderLoop::tick_at`] takes the tick instant explicitly so
//! the whole sequence can be driven synchronously in tests; [`RenderLoop::run`]
//! wraps it with frame pacing on the dedicated render thread.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::dispatch::{EffectCallback, EffectDispatcher};
use super::state::{Arbitration, DisplayModel, MotionTuning};
use crate::backend::InputEvent;
use crate::command::{CommandReceiver, CommandSender, DisplayCommand};
use crate::config::TouchConfig;
use crate::error::DisplayError;
use crate::gesture::{Gesture, GestureClassifier};
use crate::hardware::HardwareSignal;
use crate::render::Renderer;

/// Callback invoked when the hardware stop control fires
pub type ExitCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// Callbacks shared between the public API and the render thread
#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) effect: Mutex<Option<EffectCallback>>,
    pub(crate) exit: Mutex<Option<ExitCallback>>,
}

/// Counters updated by the render loop
#[derive(Debug, Default)]
pub struct LoopStats {
    ticks: AtomicU64,
    frames_presented: AtomicU64,
    commands_applied: AtomicU64,
    gestures_recognized: AtomicU64,
    effects_dispatched: AtomicU64,
    effects_refused: AtomicU64,
    pointer_discards: AtomicU64,
}

/// Point-in-time copy of [`LoopStats`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Ticks run
    pub ticks: u64,
    /// Frames handed to the display
    pub frames_presented: u64,
    /// Commands applied
    pub commands_applied: u64,
    /// Commands dropped on a full queue
    pub commands_dropped: u64,
    /// Gestures recognized
    pub gestures_recognized: u64,
    /// Effects handed to the callback or local handler
    pub effects_dispatched: u64,
    /// Effects accepted but not dispatched (dispatch bound, spawn failure)
    pub effects_refused: u64,
    /// Pointer batches thrown away under the petting lock
    pub pointer_discards: u64,
}

impl LoopStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    #[must_use]
    pub fn snapshot(&self, commands_dropped: u64) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            frames_presented: self.frames_presented.load(Ordering::Relaxed),
            commands_applied: self.commands_applied.load(Ordering::Relaxed),
            commands_dropped,
            gestures_recognized: self.gestures_recognized.load(Ordering::Relaxed),
            effects_dispatched: self.effects_dispatched.load(Ordering::Relaxed),
            effects_refused: self.effects_refused.load(Ordering::Relaxed),
            pointer_discards: self.pointer_discards.load(Ordering::Relaxed),
        }
    }
}

/// Why the loop stopped on its own
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    /// Hardware stop control asserted
    HardwareStop,
    /// Display backend reported a quit request
    QuitRequested,
}

/// Result of one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep going
    Continue,
    /// Terminate the loop
    Exit(ExitReason),
}

/// Clears the running flag however the loop ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The render loop and everything it owns
pub struct RenderLoop {
    model: Arc<Mutex<DisplayModel>>,
    commands: CommandReceiver,
    loopback: CommandSender,
    renderer: Renderer,
    exit_signal: Box<dyn HardwareSignal>,
    classifier: GestureClassifier,
    dispatcher: EffectDispatcher,
    callbacks: Arc<Callbacks>,
    stats: Arc<LoopStats>,
    touch: TouchConfig,
    touch_enabled: bool,
    tuning: MotionTuning,
    frame_duration: Duration,
    last_tick: Option<Instant>,
    signal_errors: u64,
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("renderer", &self.renderer)
            .field("touch_enabled", &self.touch_enabled)
            .field("frame_duration", &self.frame_duration)
            .finish_non_exhaustive()
    }
}

/// Shared handles the orchestrator keeps alongside the loop
pub(crate) struct LoopParts {
    pub(crate) model: Arc<Mutex<DisplayModel>>,
    pub(crate) commands: CommandReceiver,
    pub(crate) loopback: CommandSender,
    pub(crate) callbacks: Arc<Callbacks>,
    pub(crate) stats: Arc<LoopStats>,
}

impl RenderLoop {
    pub(crate) fn new(
        parts: LoopParts,
        renderer: Renderer,
        exit_signal: Box<dyn HardwareSignal>,
        touch: TouchConfig,
        tuning: MotionTuning,
        frame_duration: Duration,
    ) -> Self {
        let touch_enabled = touch.enabled && renderer.supports_pointer();
        if touch.enabled && !touch_enabled {
            tracing::info!("Display has no pointer input, touch gestures disabled");
        }
        Self {
            model: parts.model,
            commands: parts.commands,
            loopback: parts.loopback,
            classifier: GestureClassifier::new(touch.thresholds.clone()),
            dispatcher: EffectDispatcher::new(touch.max_pending_effects),
            renderer,
            exit_signal,
            callbacks: parts.callbacks,
            stats: parts.stats,
            touch,
            touch_enabled,
            tuning,
            frame_duration,
            last_tick: None,
            signal_errors: 0,
        }
    }

    /// Bring the display surface up
    pub(crate) fn init(&mut self) -> Result<(), DisplayError> {
        self.renderer.init()
    }

    /// The renderer
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Whether pointer input is being classified
    #[must_use]
    pub fn touch_enabled(&self) -> bool {
        self.touch_enabled
    }

    /// Forget the previous tick time (first tick after a restart gets dt = 0)
    pub fn reset_clock(&mut self) {
        self.last_tick = None;
    }

    /// Run one tick at `now`
    pub fn tick_at(&mut self, now: Instant) -> TickOutcome {
        let dt = self
            .last_tick
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_tick = Some(now);
        LoopStats::bump(&self.stats.ticks);

        self.apply_commands(now);

        if self.poll_exit_signal() {
            return TickOutcome::Exit(ExitReason::HardwareStop);
        }

        let (plan, resolved_tap) = {
            let mut model = self.model.lock();
            model.advance(dt, now, &self.tuning);
            model.release_stale_petting(now, self.touch.petting_timeout);
            let resolved = self
                .classifier
                .resolve_pending(now)
                .map(|tap| (tap, model.arbitrate(tap, now, &self.touch)));
            model.state.pending_tap_time = self.classifier.pending_tap();
            (model.render_plan(), resolved)
        };

        if let Some((tap, arbitration)) = resolved_tap {
            LoopStats::bump(&self.stats.gestures_recognized);
            self.deliver(tap, arbitration, now);
        }

        if self.renderer.draw(&plan, dt) {
            LoopStats::bump(&self.stats.frames_presented);
        }

        self.handle_input(now)
    }

    fn apply_commands(&mut self, now: Instant) {
        let mut model = self.model.lock();
        while let Some(command) = self.commands.try_next() {
            tracing::trace!(command = command.kind(), "Applying command");
            model.apply(command, now);
            LoopStats::bump(&self.stats.commands_applied);
        }
    }

    fn poll_exit_signal(&mut self) -> bool {
        match self.exit_signal.stop_requested() {
            Ok(false) => false,
            Ok(true) => {
                tracing::info!("Hardware stop requested");
                self.run_exit_callback();
                true
            }
            Err(e) => {
                self.signal_errors += 1;
                if self.signal_errors == 1 {
                    tracing::warn!(error = %e, "Failed to read hardware stop signal");
                }
                false
            }
        }
    }

    fn run_exit_callback(&mut self) {
        // Taken out so the callback may register a new one without deadlock
        let Some(mut callback) = self.callbacks.exit.lock().take() else {
            return;
        };
        match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
            Ok(Ok(())) => tracing::debug!("Exit callback finished"),
            Ok(Err(e)) => tracing::error!(error = %e, "Exit callback failed"),
            Err(_) => tracing::error!("Exit callback panicked"),
        }

        // Kept for the next start unless a replacement was registered meanwhile
        let mut slot = self.callbacks.exit.lock();
        if slot.is_none() {
            *slot = Some(callback);
        }
    }

    fn handle_input(&mut self, now: Instant) -> TickOutcome {
        let events = self.renderer.backend_mut().poll_input();
        let mut discarded = false;

        for event in events {
            let pointer = match event {
                InputEvent::Quit => {
                    tracing::info!("Display requested quit");
                    return TickOutcome::Exit(ExitReason::QuitRequested);
                }
                InputEvent::Pointer(pointer) => pointer,
            };
            if !self.touch_enabled {
                continue;
            }

            if self.model.lock().state.petting_active {
                if !discarded {
                    self.discard_pointer_input();
                    discarded = true;
                }
                continue;
            }

            if let Some(gesture) = self.classifier.handle(pointer) {
                LoopStats::bump(&self.stats.gestures_recognized);
                tracing::debug!(%gesture, "Gesture recognized");
                let arbitration = self.model.lock().arbitrate(gesture, now, &self.touch);
                self.deliver(gesture, arbitration, now);
            }
        }

        self.model.lock().state.pending_tap_time = self.classifier.pending_tap();
        TickOutcome::Continue
    }

    fn discard_pointer_input(&mut self) {
        self.renderer.backend_mut().discard_pointer_input();
        self.classifier.reset();
        LoopStats::bump(&self.stats.pointer_discards);
    }

    fn deliver(&mut self, gesture: Gesture, arbitration: Arbitration, now: Instant) {
        let Arbitration::Accepted(effect) = arbitration else {
            return;
        };
        self.discard_pointer_input();

        let callback = self.callbacks.effect.lock().clone();
        let Some(callback) = callback else {
            if self.loopback.send(DisplayCommand::ApplyEffect { effect }) {
                LoopStats::bump(&self.stats.effects_dispatched);
            } else {
                self.model.lock().set_petting(false, now);
                LoopStats::bump(&self.stats.effects_refused);
            }
            return;
        };

        match self.dispatcher.dispatch(callback, gesture, effect) {
            Ok(()) => LoopStats::bump(&self.stats.effects_dispatched),
            Err(e) => {
                tracing::warn!(%gesture, error = %e, "Effect not dispatched, releasing petting lock");
                self.model.lock().set_petting(false, now);
                LoopStats::bump(&self.stats.effects_refused);
            }
        }
    }

    /// Tick at the configured frame rate until `running` clears or the loop
    /// exits on its own
    pub fn run(mut self, running: &AtomicBool) -> Self {
        let _guard = RunningGuard(running);
        tracing::info!(frame_ms = self.frame_duration.as_millis() as u64, "Render loop started");

        while running.load(Ordering::Acquire) {
            let frame_start = Instant::now();

            if let TickOutcome::Exit(reason) = self.tick_at(frame_start) {
                tracing::info!(?reason, "Render loop exiting");
                break;
            }

            // Frame pacing
            let elapsed = frame_start.elapsed();
            if let Some(remaining) = self.frame_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }

        tracing::info!("Render loop stopped");
        self
    }

    /// Release the display surface and hardware handles
    pub fn cleanup(&mut self) {
        self.renderer.cleanup();
        self.exit_signal.cleanup();
    }
}
