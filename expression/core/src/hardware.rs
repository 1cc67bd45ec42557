//! Hardware Signals
//!
//! A physical "stop" control polled once per tick. On Linux boards this is
//! a push button wired to a GPIO line (active low, pulled up externally)
//! read through sysfs. Availability is decided once when the signal is
//! opened; if the line cannot be read the feature is simply off.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::GpioConfig;

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// A hard-stop input polled by the render loop
pub trait HardwareSignal: Send {
    /// Whether a stop is being requested right now
    fn stop_requested(&mut self) -> io::Result<bool>;

    /// Release the underlying hardware
    fn cleanup(&mut self) {}
}

/// Signal for devices without a stop control
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExitSignal;

impl HardwareSignal for NoExitSignal {
    fn stop_requested(&mut self) -> io::Result<bool> {
        Ok(false)
    }
}

/// Active-low push button on a sysfs GPIO line
#[derive(Debug)]
pub struct GpioExitButton {
    value: File,
    path: PathBuf,
    exported: Option<u32>,
}

impl GpioExitButton {
    /// Open the button on `pin`, exporting the line if needed
    pub fn open(pin: u32) -> io::Result<Self> {
        let root = Path::new(SYSFS_GPIO_ROOT);
        let line = root.join(format!("gpio{pin}"));
        let mut exported = None;

        if !line.exists() {
            fs::write(root.join("export"), pin.to_string())?;
            exported = Some(pin);
        }
        // Direction may already be fixed by the board overlay
        if let Err(e) = fs::write(line.join("direction"), "in") {
            tracing::debug!(pin, error = %e, "Could not set GPIO direction");
        }

        let mut button = Self::with_value_file(line.join("value"))?;
        button.exported = exported;
        Ok(button)
    }

    /// Read an arbitrary value file (`"0"` = pressed)
    pub fn with_value_file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let value = File::open(&path)?;
        Ok(Self {
            value,
            path,
            exported: None,
        })
    }

    /// Path of the value file being polled
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HardwareSignal for GpioExitButton {
    fn stop_requested(&mut self) -> io::Result<bool> {
        let mut buf = String::with_capacity(4);
        self.value.seek(SeekFrom::Start(0))?;
        self.value.read_to_string(&mut buf)?;
        Ok(buf.trim() == "0")
    }

    fn cleanup(&mut self) {
        if let Some(pin) = self.exported.take() {
            let unexport = Path::new(SYSFS_GPIO_ROOT).join("unexport");
            if let Err(e) = fs::write(unexport, pin.to_string()) {
                tracing::debug!(pin, error = %e, "Failed to unexport GPIO line");
            }
        }
    }
}

/// Build the stop signal described by configuration
///
/// Falls back to [`NoExitSignal`] when GPIO is disabled or the line cannot
/// be opened.
#[must_use]
pub fn exit_signal_from_config(config: &GpioConfig) -> Box<dyn HardwareSignal> {
    if !config.enabled {
        return Box::new(NoExitSignal);
    }
    match GpioExitButton::open(config.exit_button_pin) {
        Ok(button) => {
            tracing::info!(pin = config.exit_button_pin, "GPIO exit button enabled");
            Box::new(button)
        }
        Err(e) => {
            tracing::info!(
                pin = config.exit_button_pin,
                error = %e,
                "GPIO exit button unavailable, hard stop disabled"
            );
            Box::new(NoExitSignal)
        }
    }
}
