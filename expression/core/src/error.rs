//! Error types for the expression engine

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Display surface failures
#[derive(Debug, Error)]
pub enum DisplayError {
    /// Surface could not be brought up; aborts `start()`
    #[error("failed to initialize display: {0}")]
    Init(String),

    /// A single frame could not be presented; logged, the loop continues
    #[error("failed to present frame: {0}")]
    Present(String),

    /// Underlying I/O failure
    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure loading one sprite asset
#[derive(Debug, Error)]
pub enum SpriteError {
    /// File could not be decoded
    #[error("failed to load sprite {path}: {source}")]
    Decode {
        /// Offending file
        path: PathBuf,
        /// Decoder error
        #[source]
        source: image::ImageError,
    },

    /// Sprite directory could not be listed
    #[error("failed to read sprite directory {path}: {source}")]
    Directory {
        /// Directory
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Top-level engine errors
#[derive(Debug, Error)]
pub enum ExpressionError {
    /// `start()` called while the render loop is running
    #[error("render loop already running")]
    AlreadyRunning,

    /// Display surface failure
    #[error(transparent)]
    Display(#[from] DisplayError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Render thread could not be spawned
    #[error("failed to spawn render thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

/// Result alias for engine operations
pub type Result<T> = std::result::Result<T, ExpressionError>;
