//! Expression Core - Headless Emotion Display Engine for the companion face
//!
//! This crate animates the companion's face: it turns high-level requests
//! ("look sad", "you're speaking", "you're listening") into frames at a fixed
//! rate, and turns touches on the screen into gesture effects. It knows
//! nothing about terminals or framebuffers; a [`DisplayBackend`] supplies the
//! surface.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      Callers (any thread)                         │
//! │     set_emotion / set_listening / set_speaking / set_petting      │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │ DisplayCommand (bounded queue)
//! ┌───────────────────────────────┼──────────────────────────────────┐
//! │                        EXPRESSION CORE                            │
//! │  ┌────────────────────────────┴───────────────────────────────┐  │
//! │  │                       RenderLoop                            │  │
//! │  │  ┌────────────┐  ┌────────────┐  ┌──────────┐  ┌─────────┐ │  │
//! │  │  │  Display   │  │ Transition │  │ Gesture  │  │ Effect  │ │  │
//! │  │  │  Model     │  │ Controller │  │ Classif. │  │ Dispatch│ │  │
//! │  │  └────────────┘  └────────────┘  └──────────┘  └─────────┘ │  │
//! │  └────────────────────────────┬───────────────────────────────┘  │
//! │                               │ RenderPlan                        │
//! │  ┌────────────────────────────┴───────────────────────────────┐  │
//! │  │   Renderer:  sprites (cross-fade)  |  procedural face      │  │
//! │  └────────────────────────────┬───────────────────────────────┘  │
//! └───────────────────────────────┼──────────────────────────────────┘
//!                                 │ Frame / InputEvent
//!                        ┌────────┴────────┐
//!                        │ DisplayBackend  │  headless, terminal, ...
//!                        └─────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use expression_core::{load_config, EmotionDisplay, HeadlessDisplay};
//!
//! let config = load_config()?;
//! let (surface, _handle) = HeadlessDisplay::new();
//! let mut display = EmotionDisplay::new(config, Box::new(surface))?;
//!
//! let controller = display.controller();
//! display.set_effect_callback(move |effect| {
//!     // play sound / speech here, then release the lock
//!     controller.set_petting(false);
//!     Ok(())
//! });
//!
//! display.start()?;
//! display.set_emotion("curious", Duration::from_millis(500));
//! display.set_speaking(true, Some(0.8));
//! // ...
//! display.cleanup();
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Display surface trait and the headless surface
//! - [`command`]: Command queue between callers and the render thread
//! - [`config`]: TOML + environment configuration
//! - [`display`]: The engine: state model, render loop, effect dispatch
//! - [`effects`]: Gesture effect descriptors
//! - [`emotion`]: Procedural face parameters and presets
//! - [`frame`]: RGBA frames and drawing primitives
//! - [`gesture`]: Pointer events and the gesture classifier
//! - [`hardware`]: Hardware stop signal (GPIO exit button)
//! - [`render`]: Sprite and procedural rendering
//! - [`transition`]: Emotion transition timing
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]

pub mod backend;
pub mod command;
pub mod config;
pub mod display;
pub mod effects;
pub mod emotion;
pub mod error;
pub mod frame;
pub mod gesture;
pub mod hardware;
pub mod render;
pub mod transition;

// Re-exports for convenience
pub use backend::{DisplayBackend, HeadlessDisplay, HeadlessHandle, InputEvent};
pub use command::{command_queue, CommandReceiver, CommandSender, DisplayCommand};
pub use display::{
    DisplaySnapshot, EmotionDisplay, ExitReason, RenderLoop, StatsSnapshot, TickOutcome,
};
pub use effects::{Effect, EffectMap};
pub use emotion::{EmotionParams, EmotionPresets, FALLBACK_EMOTION};
pub use error::{DisplayError, ExpressionError, Result, SpriteError};
pub use frame::{Frame, Rgb, Rgba};
pub use gesture::{Gesture, GestureClassifier, GestureThresholds, Point, PointerEvent};
pub use hardware::{GpioExitButton, HardwareSignal, NoExitSignal};
pub use render::{RenderMode, RenderPlan, Renderer};
pub use transition::TransitionController;

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, ExpressionConfig,
};
