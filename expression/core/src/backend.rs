//! Display Backends
//!
//! The render loop talks to its output surface through [`DisplayBackend`]:
//! present a finished frame, hand back whatever input arrived since the
//! last tick. The engine itself has no idea whether that is a framebuffer,
//! a terminal or a test harness.
//!
//! [`HeadlessDisplay`] keeps frames in memory and takes scripted input from
//! its [`HeadlessHandle`], which is how the engine is exercised in tests and
//! on devices without a screen.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::DisplayError;
use crate::frame::Frame;
use crate::gesture::PointerEvent;

/// Input delivered by a display backend
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Touch or mouse activity
    Pointer(PointerEvent),
    /// Window closed or quit key pressed
    Quit,
}

/// An output surface with optional pointer input
pub trait DisplayBackend: Send {
    /// Bring the surface up at the given resolution
    ///
    /// Called once from `start()`; an error aborts startup.
    fn init(&mut self, width: u32, height: u32) -> Result<(), DisplayError>;

    /// Show a finished frame
    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError>;

    /// Input received since the last call, oldest first (never blocks)
    fn poll_input(&mut self) -> Vec<InputEvent>;

    /// Throw away queued pointer input (quit requests are kept)
    fn discard_pointer_input(&mut self);

    /// Whether this surface can produce pointer events at all
    fn supports_pointer(&self) -> bool {
        true
    }

    /// Release the surface
    fn cleanup(&mut self) {}
}

#[derive(Debug, Default)]
struct HeadlessShared {
    input: VecDeque<InputEvent>,
    last_frame: Option<Frame>,
    frames_presented: u64,
    pointer_discards: u64,
    initialized: bool,
    cleaned_up: bool,
    fail_init: bool,
}

/// In-memory display surface
#[derive(Debug)]
pub struct HeadlessDisplay {
    shared: Arc<Mutex<HeadlessShared>>,
    pointer: bool,
}

/// Test/automation handle onto a [`HeadlessDisplay`]
#[derive(Clone, Debug)]
pub struct HeadlessHandle {
    shared: Arc<Mutex<HeadlessShared>>,
}

impl HeadlessDisplay {
    /// Create a headless surface and its control handle
    #[must_use]
    pub fn new() -> (Self, HeadlessHandle) {
        let shared = Arc::new(Mutex::new(HeadlessShared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
                pointer: true,
            },
            HeadlessHandle { shared },
        )
    }

    /// Report no pointer support (touch input disabled at startup)
    #[must_use]
    pub fn without_pointer(mut self) -> Self {
        self.pointer = false;
        self
    }
}

impl DisplayBackend for HeadlessDisplay {
    fn init(&mut self, width: u32, height: u32) -> Result<(), DisplayError> {
        let mut shared = self.shared.lock();
        if std::mem::take(&mut shared.fail_init) {
            return Err(DisplayError::Init("headless init failure requested".into()));
        }
        shared.initialized = true;
        tracing::debug!(width, height, "Headless display initialized");
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let mut shared = self.shared.lock();
        shared.frames_presented += 1;
        shared.last_frame = Some(frame.clone());
        Ok(())
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        self.shared.lock().input.drain(..).collect()
    }

    fn discard_pointer_input(&mut self) {
        let mut shared = self.shared.lock();
        let before = shared.input.len();
        shared.input.retain(|e| matches!(e, InputEvent::Quit));
        if shared.input.len() != before {
            shared.pointer_discards += 1;
        }
    }

    fn supports_pointer(&self) -> bool {
        self.pointer
    }

    fn cleanup(&mut self) {
        self.shared.lock().cleaned_up = true;
    }
}

impl HeadlessHandle {
    /// Queue a pointer event for the next tick
    pub fn push_pointer(&self, event: PointerEvent) {
        self.shared.lock().input.push_back(InputEvent::Pointer(event));
    }

    /// Queue a quit request
    pub fn request_quit(&self) {
        self.shared.lock().input.push_back(InputEvent::Quit);
    }

    /// Make the next `init` fail
    pub fn fail_next_init(&self) {
        self.shared.lock().fail_init = true;
    }

    /// Copy of the most recently presented frame
    #[must_use]
    pub fn last_frame(&self) -> Option<Frame> {
        self.shared.lock().last_frame.clone()
    }

    /// Frames presented so far
    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.shared.lock().frames_presented
    }

    /// Times queued pointer input was thrown away
    #[must_use]
    pub fn pointer_discards(&self) -> u64 {
        self.shared.lock().pointer_discards
    }

    /// Pointer events still waiting to be polled
    #[must_use]
    pub fn pending_input(&self) -> usize {
        self.shared.lock().input.len()
    }

    /// Whether `init` succeeded
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.lock().initialized
    }

    /// Whether `cleanup` ran
    #[must_use]
    pub fn is_cleaned_up(&self) -> bool {
        self.shared.lock().cleaned_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Point;
    use std::time::Instant;

    #[test]
    fn test_present_records_frame() {
        let (mut display, handle) = HeadlessDisplay::new();
        display.init(4, 4).unwrap();
        display.present(&Frame::new(4, 4)).unwrap();
        assert_eq!(handle.frames_presented(), 1);
        assert_eq!(handle.last_frame().map(|f| f.width()), Some(4));
    }

    #[test]
    fn test_discard_keeps_quit() {
        let (mut display, handle) = HeadlessDisplay::new();
        handle.push_pointer(PointerEvent::Down {
            pos: Point::new(1.0, 1.0),
            at: Instant::now(),
        });
        handle.request_quit();
        display.discard_pointer_input();
        assert_eq!(display.poll_input(), vec![InputEvent::Quit]);
        assert_eq!(handle.pointer_discards(), 1);
    }

    #[test]
    fn test_requested_init_failure() {
        let (mut display, handle) = HeadlessDisplay::new();
        handle.fail_next_init();
        assert!(matches!(display.init(1, 1), Err(DisplayError::Init(_))));
    }
}
