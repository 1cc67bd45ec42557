//! Effect Dispatch
//!
//! Delivers accepted effects to the registered callback on a detached
//! thread so the render loop never waits on playback. Callback errors and
//! panics stop at this boundary and are logged. The number of callbacks in
//! flight is bounded; past the bound a dispatch is refused.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::effects::Effect;
use crate::gesture::Gesture;

/// Callback invoked with each accepted effect
///
/// Runs on its own thread. Call `set_petting(false)` on the display's
/// command sender when playback finishes.
pub type EffectCallback = Arc<dyn Fn(&Effect) -> anyhow::Result<()> + Send + Sync>;

/// Why a dispatch did not happen
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Too many callbacks still running
    #[error("{in_flight} effect callbacks already in flight")]
    Saturated {
        /// Callbacks currently running
        in_flight: usize,
    },

    /// The OS refused a new thread
    #[error("failed to spawn effect thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Decrements the in-flight counter when the callback thread ends
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Spawns bounded fire-and-forget effect callbacks
#[derive(Debug)]
pub struct EffectDispatcher {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: usize,
    sequence: u64,
}

impl EffectDispatcher {
    /// Create a dispatcher allowing `max_in_flight` concurrent callbacks
    #[must_use]
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: max_in_flight.max(1),
            sequence: 0,
        }
    }

    /// Callbacks currently running
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run `callback(effect)` on a new thread
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Saturated`] at the in-flight bound and
    /// [`DispatchError::Spawn`] if the thread cannot be created.
    pub fn dispatch(
        &mut self,
        callback: EffectCallback,
        gesture: Gesture,
        effect: Effect,
    ) -> Result<(), DispatchError> {
        let in_flight = self.in_flight.load(Ordering::Acquire);
        if in_flight >= self.max_in_flight {
            return Err(DispatchError::Saturated { in_flight });
        }

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        self.sequence += 1;

        let spawned = std::thread::Builder::new()
            .name(format!("effect-{}", self.sequence))
            .spawn(move || {
                let _guard = guard;
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(&effect)));
                match outcome {
                    Ok(Ok(())) => tracing::debug!(%gesture, "Effect callback finished"),
                    Ok(Err(e)) => {
                        tracing::error!(%gesture, error = %e, "Effect callback failed");
                    }
                    Err(_) => tracing::error!(%gesture, "Effect callback panicked"),
                }
            });

        // On spawn failure the closure (and its guard) is dropped, which
        // undoes the increment above
        spawned.map(|_| ()).map_err(DispatchError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_callback_runs_with_effect() {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let callback: EffectCallback = Arc::new(move |effect: &Effect| -> anyhow::Result<()> {
            tx.lock().send(effect.emotion.clone())?;
            Ok(())
        });
        let mut dispatcher = EffectDispatcher::new(4);
        let effect = Effect {
            emotion: Some("loving".into()),
            ..Default::default()
        };
        dispatcher.dispatch(callback, Gesture::Tap, effect).unwrap();
        let got = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(got.as_deref(), Some("loving"));
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let (tx, rx) = mpsc::channel::<()>();
        let tx = parking_lot::Mutex::new(tx);
        let callback: EffectCallback = Arc::new(move |_: &Effect| -> anyhow::Result<()> {
            let _keep = &tx;
            panic!("speaker on fire");
        });
        let mut dispatcher = EffectDispatcher::new(1);
        dispatcher
            .dispatch(callback, Gesture::Drag, Effect::default())
            .unwrap();
        // Sender is dropped when the thread unwinds
        assert!(rx.recv_timeout(Duration::from_secs(2)).is_err());
        // The slot is released again
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while dispatcher.in_flight() > 0 && std::time::Instant::now() < deadline {
            std::thread::yield_now();
        }
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[test]
    fn test_saturation_refuses_dispatch() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Arc::new(parking_lot::Mutex::new(release_rx));
        let callback: EffectCallback = Arc::new(move |_: &Effect| -> anyhow::Result<()> {
            let _ = release_rx.lock().recv();
            Ok(())
        });
        let mut dispatcher = EffectDispatcher::new(1);
        dispatcher
            .dispatch(Arc::clone(&callback), Gesture::Tap, Effect::default())
            .unwrap();
        let err = dispatcher
            .dispatch(callback, Gesture::Tap, Effect::default())
            .unwrap_err();
        assert!(matches!(err, DispatchError::Saturated { in_flight: 1 }));
        drop(release_tx);
    }
}
