//! Emotion Display
//!
//! [`EmotionDisplay`] is the public face of the engine. It owns the render
//! thread and hands out the command API:
//!
//! ```text
//!   callers (any thread)                      render thread
//!  ┌──────────────────────┐  bounded queue  ┌────────────────────────┐
//!  │ set_emotion()        │ ──────────────► │ RenderLoop::tick_at()  │
//!  │ set_listening()      │                 │   drain → model        │
//!  │ set_speaking()       │                 │   plan → Renderer      │
//!  │ set_petting()        │                 │   input → arbitration  │
//!  └──────────────────────┘                 └───────────┬────────────┘
//!            ▲                                          │ accepted effect
//!            │ set_petting(false)                       ▼
//!            └────────────────────────────── effect callback thread
//! ```
//!
//! Between `stop()` and the next `start()` the loop is parked inside the
//! display, so it can also be ticked by hand through
//! [`EmotionDisplay::render_loop_mut`].

mod dispatch;
mod render_loop;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub use dispatch::{DispatchError, EffectCallback, EffectDispatcher};
pub use render_loop::{ExitCallback, ExitReason, LoopStats, RenderLoop, StatsSnapshot, TickOutcome};
pub use state::{
    Arbitration, DisplayModel, DisplaySnapshot, DisplayState, MotionTuning, EFFECT_TRANSITION,
};

use crate::backend::{DisplayBackend, HeadlessDisplay, HeadlessHandle};
use crate::command::{command_queue, CommandSender};
use crate::config::ExpressionConfig;
use crate::effects::Effect;
use crate::error::{ExpressionError, Result};
use crate::hardware::{exit_signal_from_config, HardwareSignal};
use crate::render::{RenderMode, Renderer};
use render_loop::{Callbacks, LoopParts};

/// Render thread name
const RENDER_THREAD_NAME: &str = "expression-render";

struct Worker {
    handle: JoinHandle<RenderLoop>,
    done: mpsc::Receiver<()>,
}

/// The expression engine
pub struct EmotionDisplay {
    config: ExpressionConfig,
    model: Arc<Mutex<DisplayModel>>,
    sender: CommandSender,
    callbacks: Arc<Callbacks>,
    stats: Arc<LoopStats>,
    running: Arc<AtomicBool>,
    mode: RenderMode,
    parked: Option<RenderLoop>,
    worker: Option<Worker>,
    initialized: bool,
    cleaned_up: bool,
}

impl std::fmt::Debug for EmotionDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmotionDisplay")
            .field("mode", &self.mode)
            .field("running", &self.is_running())
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl EmotionDisplay {
    /// Build the engine over a display backend
    ///
    /// The exit button is opened from `config.gpio`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn new(config: ExpressionConfig, backend: Box<dyn DisplayBackend>) -> Result<Self> {
        let exit_signal = exit_signal_from_config(&config.gpio);
        Self::with_exit_signal(config, backend, exit_signal)
    }

    /// Build the engine with an explicit hardware stop signal
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn with_exit_signal(
        config: ExpressionConfig,
        backend: Box<dyn DisplayBackend>,
        exit_signal: Box<dyn HardwareSignal>,
    ) -> Result<Self> {
        config.validate()?;

        let renderer = Renderer::new(&config, backend);
        let mode = renderer.mode();
        let model = Arc::new(Mutex::new(DisplayModel::new(renderer.known_emotions())));
        let (sender, commands) = command_queue(config.display.command_queue_capacity);
        let callbacks = Arc::new(Callbacks::default());
        let stats = Arc::new(LoopStats::default());

        let parts = LoopParts {
            model: Arc::clone(&model),
            commands,
            loopback: sender.clone(),
            callbacks: Arc::clone(&callbacks),
            stats: Arc::clone(&stats),
        };
        let render_loop = RenderLoop::new(
            parts,
            renderer,
            exit_signal,
            config.touch.clone(),
            MotionTuning::from_config(&config, mode == RenderMode::Procedural),
            config.display.frame_duration(),
        );

        tracing::info!(
            ?mode,
            fps = config.display.fps,
            width = config.display.resolution.0,
            height = config.display.resolution.1,
            "Expression display created"
        );

        Ok(Self {
            config,
            model,
            sender,
            callbacks,
            stats,
            running: Arc::new(AtomicBool::new(false)),
            mode,
            parked: Some(render_loop),
            worker: None,
            initialized: false,
            cleaned_up: false,
        })
    }

    /// Build the engine over an in-memory display
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate.
    pub fn headless(config: ExpressionConfig) -> Result<(Self, HeadlessHandle)> {
        let (display, handle) = HeadlessDisplay::new();
        let exit_signal: Box<dyn HardwareSignal> = Box::new(crate::hardware::NoExitSignal);
        let engine = Self::with_exit_signal(config, Box::new(display), exit_signal)?;
        Ok((engine, handle))
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &ExpressionConfig {
        &self.config
    }

    /// Rendering mode chosen at construction
    #[must_use]
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Whether the render thread is running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::Acquire)
    }

    /// Initialize the display (first start only) and spawn the render thread
    ///
    /// # Errors
    ///
    /// [`ExpressionError::AlreadyRunning`] if the loop is live,
    /// [`ExpressionError::Display`] if the surface fails to come up and
    /// [`ExpressionError::ThreadSpawn`] if the thread cannot be created.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            tracing::warn!("start() called while the render loop is running");
            return Err(ExpressionError::AlreadyRunning);
        }
        // The loop may have exited by itself (quit or exit button)
        self.reap_worker();

        let Some(mut render_loop) = self.parked.take() else {
            tracing::error!("Previous render thread never stopped, cannot restart");
            return Err(ExpressionError::AlreadyRunning);
        };

        if !self.initialized {
            if let Err(e) = render_loop.init() {
                tracing::error!(error = %e, "Display initialization failed");
                self.parked = Some(render_loop);
                return Err(e.into());
            }
            self.initialized = true;
        }
        render_loop.reset_clock();

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let (done_tx, done_rx) = mpsc::sync_channel(1);

        let spawned = std::thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || {
                let render_loop = render_loop.run(&running);
                let _ = done_tx.send(());
                render_loop
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker {
                    handle,
                    done: done_rx,
                });
                tracing::info!("Expression display started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                Err(ExpressionError::ThreadSpawn(e))
            }
        }
    }

    /// Ask the render thread to finish and wait up to `stop_timeout`
    ///
    /// A thread that does not finish in time is detached.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(worker) = self.worker.take() else {
            return;
        };

        match worker.done.recv_timeout(self.config.display.stop_timeout) {
            Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => self.join(worker.handle),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    timeout_ms = self.config.display.stop_timeout.as_millis() as u64,
                    "Render thread did not stop in time, detaching"
                );
            }
        }
    }

    fn reap_worker(&mut self) {
        if self.running.load(Ordering::Acquire) {
            return;
        }
        if let Some(worker) = self.worker.take() {
            self.join(worker.handle);
        }
    }

    fn join(&mut self, handle: JoinHandle<RenderLoop>) {
        match handle.join() {
            Ok(render_loop) => {
                self.parked = Some(render_loop);
                tracing::info!("Expression display stopped");
            }
            Err(_) => tracing::error!("Render thread panicked"),
        }
    }

    /// Stop and release the display surface and exit button
    pub fn cleanup(&mut self) {
        if self.cleaned_up {
            return;
        }
        self.stop();
        if let Some(render_loop) = self.parked.as_mut() {
            render_loop.cleanup();
        }
        self.cleaned_up = true;
        tracing::debug!("Expression display cleaned up");
    }

    /// The parked render loop, for driving ticks by hand
    ///
    /// `None` while the render thread owns it.
    pub fn render_loop_mut(&mut self) -> Option<&mut RenderLoop> {
        if self.worker.is_some() {
            return None;
        }
        self.parked.as_mut()
    }

    /// Command sender for other threads and tasks
    #[must_use]
    pub fn controller(&self) -> CommandSender {
        self.sender.clone()
    }

    /// Transition to `emotion` over `duration`
    pub fn set_emotion(&self, emotion: &str, duration: Duration) -> bool {
        self.sender.set_emotion(emotion, duration)
    }

    /// Toggle the listening indicator
    pub fn set_listening(&self, active: bool) -> bool {
        self.sender.set_listening(active)
    }

    /// Toggle the speaking animation; `level` defaults to 1.0/0.0
    pub fn set_speaking(&self, active: bool, level: Option<f32>) -> bool {
        self.sender.set_speaking(active, level)
    }

    /// Set or release the petting lock
    pub fn set_petting(&self, active: bool) -> bool {
        self.sender.set_petting(active)
    }

    /// Register the callback that plays accepted gesture effects
    ///
    /// The petting lock stays held after the callback returns; send
    /// `set_petting(false)` once playback ends. Without a callback, effects
    /// are only logged on the render thread and the lock is released on the
    /// next tick, so no `set_petting(false)` is needed.
    pub fn set_effect_callback<F>(&self, callback: F)
    where
        F: Fn(&Effect) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        *self.callbacks.effect.lock() = Some(Arc::new(callback));
    }

    /// Remove the effect callback
    pub fn clear_effect_callback(&self) {
        *self.callbacks.effect.lock() = None;
    }

    /// Register the callback run once when the exit button is pressed
    pub fn set_exit_callback<F>(&self, callback: F)
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        *self.callbacks.exit.lock() = Some(Box::new(callback));
    }

    /// Observable state right now
    #[must_use]
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.model.lock().snapshot(Instant::now())
    }

    /// Observable state at `now`
    #[must_use]
    pub fn snapshot_at(&self, now: Instant) -> DisplaySnapshot {
        self.model.lock().snapshot(now)
    }

    /// Render loop counters
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.sender.dropped())
    }
}

impl Drop for EmotionDisplay {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Point, PointerEvent};

    fn procedural_config() -> ExpressionConfig {
        let mut config = ExpressionConfig::default();
        config.display.procedural = true;
        config.display.resolution = (64, 48);
        config
    }

    #[test]
    fn test_headless_starts_on_happy() {
        let (display, _handle) = EmotionDisplay::headless(procedural_config()).unwrap();
        let snap = display.snapshot();
        assert_eq!(snap.current_emotion, "happy");
        assert_eq!(snap.render_plan, "static");
        assert_eq!(display.mode(), RenderMode::Procedural);
    }

    #[test]
    fn test_commands_apply_on_next_tick() {
        let (mut display, handle) = EmotionDisplay::headless(procedural_config()).unwrap();
        display.set_emotion("sad", Duration::from_millis(200));
        display.set_listening(true);
        assert!(!display.snapshot().is_listening);

        let t0 = Instant::now();
        let outcome = display.render_loop_mut().unwrap().tick_at(t0);
        assert_eq!(outcome, TickOutcome::Continue);

        let snap = display.snapshot_at(t0);
        assert!(snap.is_listening);
        assert_eq!(snap.target_emotion.as_deref(), Some("sad"));
        assert_eq!(snap.render_plan, "listening");
        assert_eq!(handle.frames_presented(), 1);
        assert_eq!(display.stats().commands_applied, 2);
    }

    #[test]
    fn test_quit_event_ends_tick() {
        let (mut display, handle) = EmotionDisplay::headless(procedural_config()).unwrap();
        handle.request_quit();
        let outcome = display.render_loop_mut().unwrap().tick_at(Instant::now());
        assert_eq!(outcome, TickOutcome::Exit(ExitReason::QuitRequested));
    }

    #[test]
    fn test_touch_disabled_ignores_pointer() {
        let mut config = procedural_config();
        config.touch.enabled = false;
        let (mut display, handle) = EmotionDisplay::headless(config).unwrap();
        let t0 = Instant::now();
        handle.push_pointer(PointerEvent::Down {
            pos: Point::new(10.0, 10.0),
            at: t0,
        });
        handle.push_pointer(PointerEvent::Up {
            pos: Point::new(10.0, 10.0),
            at: t0 + Duration::from_millis(50),
        });
        let render_loop = display.render_loop_mut().unwrap();
        assert!(!render_loop.touch_enabled());
        render_loop.tick_at(t0 + Duration::from_millis(60));
        assert!(!display.snapshot_at(t0).tap_pending);
        assert_eq!(display.stats().gestures_recognized, 0);
    }

    #[test]
    fn test_start_twice_is_rejected_and_stop_parks_loop() {
        let (mut display, handle) = EmotionDisplay::headless(procedural_config()).unwrap();
        display.start().unwrap();
        assert!(display.is_running());
        assert!(display.render_loop_mut().is_none());
        assert!(matches!(display.start(), Err(ExpressionError::AlreadyRunning)));

        display.stop();
        assert!(!display.is_running());
        assert!(display.render_loop_mut().is_some());
        assert!(handle.is_initialized());

        display.cleanup();
        assert!(handle.is_cleaned_up());
    }

    #[test]
    fn test_failed_init_surfaces_error() {
        let (mut display, handle) = EmotionDisplay::headless(procedural_config()).unwrap();
        handle.fail_next_init();
        assert!(matches!(display.start(), Err(ExpressionError::Display(_))));
        assert!(!display.is_running());
        // Loop is still parked and a retry succeeds
        display.start().unwrap();
        display.stop();
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = procedural_config();
        config.display.fps = 0;
        assert!(matches!(
            EmotionDisplay::headless(config),
            Err(ExpressionError::Config(_))
        ));
    }
}
