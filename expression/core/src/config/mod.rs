//! TOML Configuration File Support
//!
//! Configuration for the expression engine, read from
//! `~/.config/companion-face/expression.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI overrides ([`ConfigOverrides`], applied by the caller)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [display]
//! fps = 60
//! resolution = [320, 240]
//! image_dir = "assets/emotions"
//! procedural = true
//! toggle_interval_secs = 0.15
//!
//! [procedural]
//! blink_interval_secs = [3.0, 6.0]
//! listening_glow_color = [0, 200, 255]
//!
//! [procedural.presets.happy]
//! mouth_curve = 0.5
//!
//! [touch]
//! enabled = true
//! max_pending_effects = 4
//!
//! [touch.thresholds]
//! long_press_secs = 0.6
//!
//! [touch.effects.long_press]
//! emotion = "loving"
//! speak = "That feels nice."
//!
//! [gpio]
//! enabled = true
//! exit_button_pin = 27
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::{Effect, EffectMap};
use crate::emotion::EmotionParamsOverride;
use crate::frame::Rgb;
use crate::gesture::{Gesture, GestureThresholds};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where the configuration came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line override
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Defaults only
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[display]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Target frame rate
    pub fps: Option<u32>,

    /// Screen size as `[width, height]`
    pub resolution: Option<(u32, u32)>,

    /// Directory holding emotion sprites
    pub image_dir: Option<PathBuf>,

    /// Draw the face procedurally instead of from sprites
    pub procedural: Option<bool>,

    /// Sprite alternation interval while speaking or listening
    pub toggle_interval_secs: Option<f64>,

    /// Command queue capacity
    pub command_queue_capacity: Option<usize>,

    /// How long `stop()` waits for the render thread
    pub stop_timeout_secs: Option<f64>,
}

/// `[procedural]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProceduralToml {
    /// Random blink interval range `[min, max]`
    pub blink_interval_secs: Option<(f32, f32)>,
    /// Blink length
    pub blink_duration_secs: Option<f32>,
    /// Random eye jitter amplitude in pixels
    pub eye_jitter: Option<f32>,
    /// Mouth openness smoothing rate
    pub mouth_smooth: Option<f32>,
    /// Speaking level smoothing rate
    pub speaking_smooth: Option<f32>,
    /// Fraction of the speaking level held at the bottom of the wave
    pub speaking_rest_factor: Option<f32>,
    /// Speaking wave frequency
    pub speaking_wave_hz: Option<f32>,
    /// Listening pulse phase speed
    pub listening_pulse_speed: Option<f32>,
    /// Listening pulse scale amplitude
    pub listening_pulse_strength: Option<f32>,
    /// Listening glow color
    pub listening_glow_color: Option<Rgb>,
    /// Listening glow peak opacity
    pub listening_glow_alpha: Option<f32>,
    /// Listening glow stroke width
    pub listening_glow_thickness: Option<u32>,
    /// Background fill
    pub background: Option<Rgb>,
    /// Per-emotion parameter overrides
    pub presets: HashMap<String, EmotionParamsOverride>,
}

/// `[touch.thresholds]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ThresholdsToml {
    pub tap_distance: Option<f32>,
    pub long_press_secs: Option<f64>,
    pub drag_distance: Option<f32>,
    pub double_tap_window_secs: Option<f64>,
    pub circle_distance: Option<f32>,
    pub circle_return: Option<f32>,
    pub circle_ratio: Option<f32>,
    pub cooldown_secs: Option<f64>,
    pub effect_cooldown_secs: Option<f64>,
    pub effect_busy_secs: Option<f64>,
}

/// `[touch]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchToml {
    /// Enable gesture input
    pub enabled: Option<bool>,
    /// Release a petting lock held longer than this
    pub petting_timeout_secs: Option<f64>,
    /// Max effect callbacks in flight
    pub max_pending_effects: Option<usize>,
    /// Classification and arbitration thresholds
    pub thresholds: ThresholdsToml,
    /// Effects keyed by gesture name; parsed leniently field by field
    pub effects: HashMap<String, toml::Value>,
}

/// `[gpio]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioToml {
    /// Enable the exit button
    pub enabled: Option<bool>,
    /// BCM pin number of the exit button
    pub exit_button_pin: Option<u32>,
}

/// Root of the TOML file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpressionToml {
    /// `[display]`
    pub display: DisplayToml,
    /// `[procedural]`
    pub procedural: ProceduralToml,
    /// `[touch]`
    pub touch: TouchToml,
    /// `[gpio]`
    pub gpio: GpioToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Display and render loop settings
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayConfig {
    /// Target frame rate (1..=240)
    pub fps: u32,
    /// Screen size
    pub resolution: (u32, u32),
    /// Sprite directory
    pub image_dir: PathBuf,
    /// Procedural face instead of sprites
    pub procedural: bool,
    /// Sprite alternation interval
    pub toggle_interval: Duration,
    /// Command queue capacity
    pub command_queue_capacity: usize,
    /// Bounded join in `stop()`
    pub stop_timeout: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            resolution: (320, 240),
            image_dir: PathBuf::from("assets/emotions"),
            procedural: false,
            toggle_interval: Duration::from_millis(150),
            command_queue_capacity: crate::command::DEFAULT_QUEUE_CAPACITY,
            stop_timeout: Duration::from_secs(2),
        }
    }
}

impl DisplayConfig {
    /// Length of one render tick
    #[must_use]
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Procedural face settings
#[derive(Clone, Debug, PartialEq)]
pub struct ProceduralConfig {
    /// Blink interval range in seconds
    pub blink_interval: (f32, f32),
    /// Blink length in seconds
    pub blink_duration: f32,
    /// Eye jitter amplitude
    pub eye_jitter: f32,
    /// Mouth smoothing rate
    pub mouth_smooth: f32,
    /// Speaking level smoothing rate
    pub speaking_smooth: f32,
    /// Speaking rest factor
    pub speaking_rest_factor: f32,
    /// Speaking wave frequency
    pub speaking_wave_hz: f32,
    /// Listening pulse speed
    pub listening_pulse_speed: f32,
    /// Listening pulse strength
    pub listening_pulse_strength: f32,
    /// Listening glow color
    pub listening_glow_color: Rgb,
    /// Listening glow opacity
    pub listening_glow_alpha: f32,
    /// Listening glow stroke width
    pub listening_glow_thickness: u32,
    /// Background fill
    pub background: Rgb,
}

impl Default for ProceduralConfig {
    fn default() -> Self {
        Self {
            blink_interval: (3.0, 6.0),
            blink_duration: 0.12,
            eye_jitter: 1.5,
            mouth_smooth: 8.0,
            speaking_smooth: 8.0,
            speaking_rest_factor: 0.35,
            speaking_wave_hz: 6.0,
            listening_pulse_speed: 1.5,
            listening_pulse_strength: 0.08,
            listening_glow_color: Rgb(0, 200, 255),
            listening_glow_alpha: 0.35,
            listening_glow_thickness: 6,
            background: Rgb::BLACK,
        }
    }
}

/// Touch input settings
#[derive(Clone, Debug, PartialEq)]
pub struct TouchConfig {
    /// Gesture input enabled
    pub enabled: bool,
    /// Thresholds
    pub thresholds: GestureThresholds,
    /// Gesture effects
    pub effects: EffectMap,
    /// Release a stale petting lock after this long (disabled by default)
    pub petting_timeout: Option<Duration>,
    /// Max effect callbacks in flight
    pub max_pending_effects: usize,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thresholds: GestureThresholds::default(),
            effects: EffectMap::new(),
            petting_timeout: None,
            max_pending_effects: 4,
        }
    }
}

/// Exit button settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GpioConfig {
    /// Exit button enabled
    pub enabled: bool,
    /// BCM pin number
    pub exit_button_pin: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            exit_button_pin: 27,
        }
    }
}

/// Fully resolved engine configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionConfig {
    /// Display settings
    pub display: DisplayConfig,
    /// Procedural face settings
    pub procedural: ProceduralConfig,
    /// Emotion preset overrides
    pub presets: HashMap<String, EmotionParamsOverride>,
    /// Touch settings
    pub touch: TouchConfig,
    /// Exit button settings
    pub gpio: GpioConfig,
    /// File the configuration was read from
    pub config_file_path: Option<PathBuf>,
    source: ConfigSource,
}

impl Default for ExpressionConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            procedural: ProceduralConfig::default(),
            presets: HashMap::new(),
            touch: TouchConfig::default(),
            gpio: GpioConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ExpressionConfig {
    /// Parse a TOML document over the defaults (no environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let toml: ExpressionToml = toml::from_str(content)?;
        let mut config = Self::default();
        apply_toml_config(&mut config, &toml)?;
        config.source = ConfigSource::File;
        config.validate()?;
        Ok(config)
    }

    /// Where the configuration came from
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=240).contains(&self.display.fps) {
            return Err(ConfigError::ValidationError(format!(
                "display.fps must be within 1..=240, got {}",
                self.display.fps
            )));
        }
        let (w, h) = self.display.resolution;
        if w == 0 || h == 0 {
            return Err(ConfigError::ValidationError(format!(
                "display.resolution must be non-zero, got {w}x{h}"
            )));
        }
        let t = &self.touch.thresholds;
        for (name, value) in [
            ("tap_distance", t.tap_distance),
            ("drag_distance", t.drag_distance),
            ("circle_distance", t.circle_distance),
            ("circle_return", t.circle_return),
            ("circle_ratio", t.circle_ratio),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "touch.thresholds.{name} must be non-negative, got {value}"
                )));
            }
        }
        let p = &self.procedural;
        for (name, value) in [
            ("blink_duration_secs", p.blink_duration),
            ("eye_jitter", p.eye_jitter),
            ("mouth_smooth", p.mouth_smooth),
            ("speaking_smooth", p.speaking_smooth),
            ("speaking_rest_factor", p.speaking_rest_factor),
            ("speaking_wave_hz", p.speaking_wave_hz),
            ("listening_pulse_speed", p.listening_pulse_speed),
            ("listening_pulse_strength", p.listening_pulse_strength),
            ("listening_glow_alpha", p.listening_glow_alpha),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "procedural.{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        let (lo, hi) = p.blink_interval;
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || hi < lo {
            return Err(ConfigError::ValidationError(format!(
                "procedural.blink_interval_secs must be an ordered non-negative range, got [{lo}, {hi}]"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/companion-face/expression.toml` or
/// `~/.config/companion-face/expression.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("companion-face").join("expression.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<ExpressionConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ExpressionConfig, ConfigError> {
    let mut config = ExpressionConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ExpressionToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());
    config.validate()?;

    Ok(config)
}

fn secs(field: &str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        ConfigError::ValidationError(format!("{field} must be a non-negative duration, got {value}"))
    })
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ExpressionConfig, toml: &ExpressionToml) -> Result<(), ConfigError> {
    // Display settings
    let display = &toml.display;
    if let Some(fps) = display.fps {
        config.display.fps = fps;
    }
    if let Some(resolution) = display.resolution {
        config.display.resolution = resolution;
    }
    if let Some(ref dir) = display.image_dir {
        config.display.image_dir = dir.clone();
    }
    if let Some(procedural) = display.procedural {
        config.display.procedural = procedural;
    }
    if let Some(interval) = display.toggle_interval_secs {
        config.display.toggle_interval = secs("display.toggle_interval_secs", interval)?;
    }
    if let Some(capacity) = display.command_queue_capacity {
        config.display.command_queue_capacity = capacity.max(1);
    }
    if let Some(timeout) = display.stop_timeout_secs {
        config.display.stop_timeout = secs("display.stop_timeout_secs", timeout)?;
    }

    // Procedural settings
    let procedural = &toml.procedural;
    let target = &mut config.procedural;
    if let Some(range) = procedural.blink_interval_secs {
        target.blink_interval = range;
    }
    if let Some(v) = procedural.blink_duration_secs {
        target.blink_duration = v;
    }
    if let Some(v) = procedural.eye_jitter {
        target.eye_jitter = v;
    }
    if let Some(v) = procedural.mouth_smooth {
        target.mouth_smooth = v;
    }
    if let Some(v) = procedural.speaking_smooth {
        target.speaking_smooth = v;
    }
    if let Some(v) = procedural.speaking_rest_factor {
        target.speaking_rest_factor = v.clamp(0.0, 1.0);
    }
    if let Some(v) = procedural.speaking_wave_hz {
        target.speaking_wave_hz = v;
    }
    if let Some(v) = procedural.listening_pulse_speed {
        target.listening_pulse_speed = v;
    }
    if let Some(v) = procedural.listening_pulse_strength {
        target.listening_pulse_strength = v;
    }
    if let Some(v) = procedural.listening_glow_color {
        target.listening_glow_color = v;
    }
    if let Some(v) = procedural.listening_glow_alpha {
        target.listening_glow_alpha = v.clamp(0.0, 1.0);
    }
    if let Some(v) = procedural.listening_glow_thickness {
        target.listening_glow_thickness = v;
    }
    if let Some(v) = procedural.background {
        target.background = v;
    }
    for (name, over) in &procedural.presets {
        config.presets.insert(name.clone(), over.clone());
    }

    // Touch settings
    let touch = &toml.touch;
    if let Some(enabled) = touch.enabled {
        config.touch.enabled = enabled;
    }
    if let Some(timeout) = touch.petting_timeout_secs {
        config.touch.petting_timeout = Some(secs("touch.petting_timeout_secs", timeout)?);
    }
    if let Some(max) = touch.max_pending_effects {
        config.touch.max_pending_effects = max;
    }
    apply_thresholds(&mut config.touch.thresholds, &touch.thresholds)?;
    for (name, value) in &touch.effects {
        match name.parse::<Gesture>() {
            Ok(gesture) => {
                let effect = parse_effect(name, value);
                if effect.is_empty() {
                    tracing::warn!(gesture = %name, "Effect has nothing to play, leaving gesture unmapped");
                    continue;
                }
                config.touch.effects.insert(gesture, effect);
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring effect for unknown gesture"),
        }
    }

    // GPIO settings
    if let Some(enabled) = toml.gpio.enabled {
        config.gpio.enabled = enabled;
    }
    if let Some(pin) = toml.gpio.exit_button_pin {
        config.gpio.exit_button_pin = pin;
    }

    Ok(())
}

fn apply_thresholds(t: &mut GestureThresholds, toml: &ThresholdsToml) -> Result<(), ConfigError> {
    if let Some(v) = toml.tap_distance {
        t.tap_distance = v;
    }
    if let Some(v) = toml.long_press_secs {
        t.long_press = secs("touch.thresholds.long_press_secs", v)?;
    }
    if let Some(v) = toml.drag_distance {
        t.drag_distance = v;
    }
    if let Some(v) = toml.double_tap_window_secs {
        t.double_tap_window = secs("touch.thresholds.double_tap_window_secs", v)?;
    }
    if let Some(v) = toml.circle_distance {
        t.circle_distance = v;
    }
    if let Some(v) = toml.circle_return {
        t.circle_return = v;
    }
    if let Some(v) = toml.circle_ratio {
        t.circle_ratio = v;
    }
    if let Some(v) = toml.cooldown_secs {
        t.cooldown = secs("touch.thresholds.cooldown_secs", v)?;
    }
    if let Some(v) = toml.effect_cooldown_secs {
        t.effect_cooldown = secs("touch.thresholds.effect_cooldown_secs", v)?;
    }
    if let Some(v) = toml.effect_busy_secs {
        t.effect_busy_window = secs("touch.thresholds.effect_busy_secs", v)?;
    }
    Ok(())
}

/// Read one effect table, skipping fields that are not strings
fn parse_effect(gesture: &str, value: &toml::Value) -> Effect {
    let Some(table) = value.as_table() else {
        tracing::warn!(gesture, "Effect entry is not a table, ignoring it");
        return Effect::default();
    };

    let field = |key: &str| -> Option<String> {
        match table.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            other => {
                tracing::warn!(
                    gesture,
                    field = key,
                    found = other.type_str(),
                    "Effect field is not a string, skipping it"
                );
                None
            }
        }
    };

    Effect {
        emotion: field("emotion"),
        speak: field("speak"),
        sound: field("sound"),
        hardware: field("hardware"),
    }
}

fn parse_flag(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false")
}

/// Apply environment variable overrides to the config
///
/// `lookup` resolves a variable name; production passes `std::env::var`.
fn apply_env_config(config: &mut ExpressionConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(fps) = lookup("EXPRESSION_FPS") {
        if let Ok(fps) = fps.parse::<u32>() {
            config.display.fps = fps;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(dir) = lookup("EXPRESSION_IMAGE_DIR") {
        config.display.image_dir = PathBuf::from(dir);
        config.source = ConfigSource::Env;
    }
    if let Some(flag) = lookup("EXPRESSION_PROCEDURAL") {
        config.display.procedural = parse_flag(&flag);
        config.source = ConfigSource::Env;
    }
    if let Some(flag) = lookup("EXPRESSION_TOUCH") {
        config.touch.enabled = parse_flag(&flag);
        config.source = ConfigSource::Env;
    }
    if let Some(pin) = lookup("EXPRESSION_GPIO_PIN") {
        if let Ok(pin) = pin.parse::<u32>() {
            config.gpio.enabled = true;
            config.gpio.exit_button_pin = pin;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Frame rate override
    pub fps: Option<u32>,

    /// Sprite directory override
    pub image_dir: Option<PathBuf>,

    /// Procedural mode override
    pub procedural: Option<bool>,

    /// Touch input override
    pub touch_enabled: Option<bool>,
}

impl ConfigOverrides {
    /// Create an empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set frame rate override
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set sprite directory override
    #[must_use]
    pub fn with_image_dir(mut self, dir: PathBuf) -> Self {
        self.image_dir = Some(dir);
        self
    }

    /// Set procedural mode override
    #[must_use]
    pub fn with_procedural(mut self, procedural: bool) -> Self {
        self.procedural = Some(procedural);
        self
    }

    /// Set touch input override
    #[must_use]
    pub fn with_touch_enabled(mut self, enabled: bool) -> Self {
        self.touch_enabled = Some(enabled);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fps.is_none()
            && self.image_dir.is_none()
            && self.procedural.is_none()
            && self.touch_enabled.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an override leaves the configuration invalid.
    pub fn apply(&self, config: &mut ExpressionConfig) -> Result<(), ConfigError> {
        if let Some(fps) = self.fps {
            config.display.fps = fps;
        }
        if let Some(ref dir) = self.image_dir {
            config.display.image_dir = dir.clone();
        }
        if let Some(procedural) = self.procedural {
            config.display.procedural = procedural;
        }
        if let Some(enabled) = self.touch_enabled {
            config.touch.enabled = enabled;
        }
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }
        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
