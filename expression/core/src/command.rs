//! Display Commands
//!
//! Producers on any thread enqueue [`DisplayCommand`]s; only the render loop
//! consumes them, in FIFO order. The queue is a bounded tokio channel used
//! from synchronous code (`try_send` / `try_recv`) so producers never block
//! and the loop never waits.
//!
//! When the queue is full the newest command is dropped, a warning is
//! logged and the drop counter is incremented.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

use crate::effects::Effect;

/// Default command queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Default emotion transition length for `set_emotion`
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(500);

/// A state change requested of the render loop
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayCommand {
    /// Transition to an emotion
    SetEmotion {
        /// Target emotion name
        emotion: String,
        /// Transition length (clamped to at least 0.1s)
        duration: Duration,
    },
    /// Toggle the listening indicator
    SetListening {
        /// On or off
        active: bool,
    },
    /// Toggle speaking animation
    SetSpeaking {
        /// On or off
        active: bool,
        /// Speech intensity in [0, 1]; defaults to 1.0 when active
        level: Option<f32>,
    },
    /// Set or clear the petting lock
    SetPetting {
        /// On or off
        active: bool,
    },
    /// Handle an effect locally (no effect callback registered)
    ApplyEffect {
        /// The effect
        effect: Effect,
    },
}

impl DisplayCommand {
    /// Short name for logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayCommand::SetEmotion { .. } => "set_emotion",
            DisplayCommand::SetListening { .. } => "set_listening",
            DisplayCommand::SetSpeaking { .. } => "set_speaking",
            DisplayCommand::SetPetting { .. } => "set_petting",
            DisplayCommand::ApplyEffect { .. } => "apply_effect",
        }
    }
}

/// Create a bounded command queue
#[must_use]
pub fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        CommandSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        CommandReceiver { rx },
    )
}

/// Cloneable producer handle
///
/// Every control method enqueues and returns immediately; the change
/// becomes visible on the next render tick.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: mpsc::Sender<DisplayCommand>,
    dropped: Arc<AtomicU64>,
}

impl CommandSender {
    /// Enqueue a command
    ///
    /// Returns `false` when the command was dropped (queue full or the
    /// render loop is gone).
    pub fn send(&self, command: DisplayCommand) -> bool {
        match self.tx.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(cmd)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::warn!(
                    command = cmd.kind(),
                    dropped_total = total,
                    "Command queue full, dropping newest command"
                );
                false
            }
            Err(TrySendError::Closed(cmd)) => {
                tracing::debug!(command = cmd.kind(), "Command queue closed");
                false
            }
        }
    }

    /// Transition to an emotion
    pub fn set_emotion(&self, emotion: impl Into<String>, duration: Duration) -> bool {
        self.send(DisplayCommand::SetEmotion {
            emotion: emotion.into(),
            duration,
        })
    }

    /// Show or hide the listening indicator
    pub fn set_listening(&self, active: bool) -> bool {
        self.send(DisplayCommand::SetListening { active })
    }

    /// Start or stop speaking animation
    ///
    /// `level` defaults to 1.0 when starting and 0.0 when stopping; it is
    /// clamped to [0, 1] when applied.
    pub fn set_speaking(&self, active: bool, level: Option<f32>) -> bool {
        self.send(DisplayCommand::SetSpeaking { active, level })
    }

    /// Set or clear the petting lock
    ///
    /// Effect consumers call `set_petting(false)` when playback finishes.
    pub fn set_petting(&self, active: bool) -> bool {
        self.send(DisplayCommand::SetPetting { active })
    }

    /// Commands dropped because the queue was full
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer end, owned by the render loop
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::Receiver<DisplayCommand>,
}

impl CommandReceiver {
    /// Next queued command, if any (never blocks)
    pub fn try_next(&mut self) -> Option<DisplayCommand> {
        match self.rx.try_recv() {
            Ok(cmd) => Some(cmd),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Take everything currently queued, in order
    pub fn drain(&mut self) -> Vec<DisplayCommand> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
