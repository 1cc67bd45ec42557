//! Theme and Colors
//!
//! The face itself is drawn in the engine's own colors; the terminal only
//! adds the status bar and the log banner.

use ratatui::style::Color;

// ============================================================================
// Status Bar
// ============================================================================

/// Status bar text
pub const STATUS_FG: Color = Color::Rgb(200, 200, 210);

/// Status bar background
pub const STATUS_BG: Color = Color::Rgb(30, 30, 40);

// ============================================================================
// Console
// ============================================================================

/// ANSI prefix for the goodbye line printed after the terminal is restored
pub const ACCENT_ANSI: &str = "\x1b[35m";

/// ANSI reset
pub const RESET_ANSI: &str = "\x1b[0m";
