//! Terminal Display Surface
//!
//! [`TerminalDisplay`] is a [`DisplayBackend`] over a ratatui terminal. The
//! face fills the screen above a one-line status bar; mouse presses on the
//! face become pointer events, and Esc / q / Ctrl-C request quit.
//!
//! Two flavours:
//! - [`TerminalDisplay::interactive`] owns the real terminal: raw mode,
//!   alternate screen and mouse capture are set up in `init` and undone in
//!   `cleanup`, and crossterm is polled for input every tick.
//! - [`TerminalDisplay::new`] only draws. Input is fed through
//!   [`TerminalDisplay::handle_event`] or a channel attached with
//!   [`TerminalDisplay::with_events`], which is how the tests drive it.

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::Backend;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::Terminal;

use expression_core::{DisplayBackend, DisplayError, Frame, InputEvent, Point, PointerEvent};

use crate::theme::{STATUS_BG, STATUS_FG};
use crate::widgets::{cell_to_pixel, FaceWidget};

/// Default status bar text
const DEFAULT_STATUS: &str = " companion-face  \u{00b7}  click: tap / hold / drag / circle  \u{00b7}  q: quit";

/// A terminal event stamped with when it happened
pub type TimedEvent = (Event, Instant);

/// Where terminal events come from
enum EventSource {
    /// Nothing is polled
    None,
    /// The real terminal
    Crossterm,
    /// Events sent by another thread
    Channel(mpsc::Receiver<TimedEvent>),
}

/// Terminal-backed display surface
pub struct TerminalDisplay<B: Backend + Send> {
    terminal: Terminal<B>,
    interactive: bool,
    source: EventSource,
    mouse: bool,
    frame_size: (u32, u32),
    status: String,
    pending: VecDeque<InputEvent>,
    raw_mode: bool,
}

impl<B: Backend + Send> std::fmt::Debug for TerminalDisplay<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalDisplay")
            .field("interactive", &self.interactive)
            .field("mouse", &self.mouse)
            .field("frame_size", &self.frame_size)
            .finish_non_exhaustive()
    }
}

impl<B: Backend + Send> TerminalDisplay<B> {
    /// Draw-only surface; input arrives through [`Self::handle_event`]
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            interactive: false,
            source: EventSource::None,
            mouse: true,
            frame_size: (0, 0),
            status: DEFAULT_STATUS.to_string(),
            pending: VecDeque::new(),
            raw_mode: false,
        }
    }

    /// Surface that owns the real terminal and polls crossterm for input
    pub fn interactive(terminal: Terminal<B>, mouse: bool) -> Self {
        Self {
            interactive: true,
            source: EventSource::Crossterm,
            mouse,
            ..Self::new(terminal)
        }
    }

    /// Take terminal events from a channel instead of the real terminal
    #[must_use]
    pub fn with_events(mut self, events: mpsc::Receiver<TimedEvent>) -> Self {
        self.source = EventSource::Channel(events);
        self
    }

    /// Replace the status bar text
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// The underlying terminal
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    /// Area the face is drawn into (everything above the status bar)
    fn face_area(&self) -> io::Result<Rect> {
        let size = self.terminal.size()?;
        Ok(Rect::new(0, 0, size.width, size.height.saturating_sub(1)))
    }

    /// Translate one terminal event and queue it for the next poll
    pub fn handle_event(&mut self, event: &Event, at: Instant) {
        match event {
            Event::Key(key) => {
                if let Some(input) = key_to_input(key) {
                    self.pending.push_back(input);
                }
            }
            Event::Mouse(mouse) if self.mouse => {
                let Ok(area) = self.face_area() else {
                    return;
                };
                if let Some(pointer) = mouse_to_pointer(mouse, area, self.frame_size, at) {
                    self.pending.push_back(InputEvent::Pointer(pointer));
                }
            }
            _ => {}
        }
    }

    fn pump_events(&mut self) -> io::Result<()> {
        let mut events = Vec::new();
        match &self.source {
            EventSource::None => {}
            EventSource::Crossterm => {
                while event::poll(Duration::ZERO)? {
                    events.push((event::read()?, Instant::now()));
                }
            }
            EventSource::Channel(rx) => events.extend(rx.try_iter()),
        }
        for (event, at) in &events {
            self.handle_event(event, *at);
        }
        Ok(())
    }

    fn restore_terminal(&mut self) -> io::Result<()> {
        if !self.raw_mode {
            return Ok(());
        }
        self.raw_mode = false;
        if self.mouse {
            execute!(io::stdout(), DisableMouseCapture)?;
        }
        execute!(io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        self.terminal.show_cursor()
    }
}

impl<B: Backend + Send> DisplayBackend for TerminalDisplay<B> {
    fn init(&mut self, width: u32, height: u32) -> Result<(), DisplayError> {
        self.frame_size = (width, height);

        if self.interactive {
            enable_raw_mode().map_err(|e| DisplayError::Init(format!("raw mode: {e}")))?;
            self.raw_mode = true;
            execute!(io::stdout(), EnterAlternateScreen)
                .map_err(|e| DisplayError::Init(format!("alternate screen: {e}")))?;
            if self.mouse {
                execute!(io::stdout(), EnableMouseCapture)
                    .map_err(|e| DisplayError::Init(format!("mouse capture: {e}")))?;
            }
        }

        self.terminal.clear()?;
        tracing::info!(width, height, interactive = self.interactive, "Terminal display ready");
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        let status = &self.status;
        self.terminal
            .draw(|f| {
                let full = f.area();
                let face = Rect::new(0, 0, full.width, full.height.saturating_sub(1));
                f.render_widget(FaceWidget::new(frame), face);
                if full.height > 0 {
                    let y = full.height - 1;
                    let bar = Style::default().fg(STATUS_FG).bg(STATUS_BG);
                    let buf = f.buffer_mut();
                    buf.set_style(Rect::new(0, y, full.width, 1), bar);
                    buf.set_stringn(0, y, status, usize::from(full.width), bar);
                }
            })
            .map_err(|e| DisplayError::Present(e.to_string()))?;
        Ok(())
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        if let Err(e) = self.pump_events() {
            tracing::warn!(error = %e, "Failed to read terminal input");
        }
        self.pending.drain(..).collect()
    }

    fn discard_pointer_input(&mut self) {
        if let Err(e) = self.pump_events() {
            tracing::debug!(error = %e, "Failed to drain terminal input");
        }
        self.pending.retain(|e| matches!(e, InputEvent::Quit));
    }

    fn supports_pointer(&self) -> bool {
        self.mouse
    }

    fn cleanup(&mut self) {
        if let Err(e) = self.restore_terminal() {
            tracing::error!(error = %e, "Failed to restore terminal");
        }
    }
}

/// Keys that end the session
pub fn key_to_input(key: &KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(InputEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        _ => None,
    }
}

/// Left-button mouse activity as a pointer event in frame pixels
pub fn mouse_to_pointer(
    mouse: &MouseEvent,
    area: Rect,
    frame_size: (u32, u32),
    at: Instant,
) -> Option<PointerEvent> {
    let (x, y) = cell_to_pixel(area, mouse.column, mouse.row, frame_size);
    let pos = Point::new(x, y);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(PointerEvent::Down { pos, at }),
        MouseEventKind::Drag(MouseButton::Left) => Some(PointerEvent::Move { pos }),
        MouseEventKind::Up(MouseButton::Left) => Some(PointerEvent::Up { pos, at }),
        _ => None,
    }
}
