//! Face TUI - Terminal surface for the companion face
//!
//! Runs the expression engine inside a terminal so the face can be
//! developed and demoed without the device's framebuffer.
//!
//! # Architecture
//!
//! - **Surface**: [`TerminalDisplay`], a `DisplayBackend` over ratatui
//! - **Widgets**: half-block rendering of engine frames
//! - **Script**: a looping demo that drives emotions, listening and speech
//! - **Theme**: status bar colors

pub mod script;
pub mod surface;
pub mod theme;
pub mod widgets;

pub use surface::{TerminalDisplay, TimedEvent};
