//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section except `[scale]` is optional; `scale.max_displacement_per_second`
//! has no default and must be set.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TeleopError};
use crate::joystick::deadzone::MAX_DEADZONE;
use crate::teleop::mapping::{Axis, AxisMapping, ButtonMapping};
use crate::teleop::scaler::VelocityScaler;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub buttons: ButtonConfig,
    #[serde(default)]
    pub axes: AxesConfig,
    pub scale: ScaleConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Button assignment. `-1` leaves a button unassigned.
#[derive(Debug, Deserialize, Clone)]
pub struct ButtonConfig {
    #[serde(default = "default_enable_move")]
    pub enable_move: i64,

    #[serde(default = "default_unassigned")]
    pub increment_speed: i64,

    #[serde(default = "default_unassigned")]
    pub decrement_speed: i64,
}

/// Axis assignment, name to frame index.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AxesConfig {
    /// Translational axes, keys `x` and `y`.
    #[serde(default)]
    pub position: BTreeMap<String, usize>,

    /// Rotational axis, key `z`.
    #[serde(default)]
    pub orientation: BTreeMap<String, usize>,
}

/// Velocity scale configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ScaleConfig {
    /// Upper scale bound.
    pub max_displacement_per_second: f64,

    #[serde(default = "default_min_scale")]
    pub min_scale: f64,

    #[serde(default = "default_initial_scale")]
    pub initial_scale: f64,

    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

/// Where input frames come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Linux joystick via evdev.
    Evdev,
    /// JSON lines on stdin.
    Stdin,
}

/// Input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_input_source")]
    pub source: InputSource,

    /// evdev device path; empty means auto-detect.
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone")]
    pub deadzone: f64,

    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
}

/// Where velocity commands go
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputSink {
    /// JSON lines on stdout.
    Stdout,
    /// JSON lines over a serial link to the base controller.
    Serial,
}

/// Output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_sink")]
    pub sink: OutputSink,

    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_enable_move() -> i64 { 0 }
fn default_unassigned() -> i64 { -1 }

fn default_min_scale() -> f64 { crate::teleop::scaler::DEFAULT_MIN_SCALE }
fn default_initial_scale() -> f64 { crate::teleop::scaler::DEFAULT_INITIAL_SCALE }
fn default_cooldown_ms() -> u64 { 500 }

fn default_input_source() -> InputSource { InputSource::Evdev }
fn default_deadzone() -> f64 { 0.05 }
fn default_queue_size() -> usize { 16 }

fn default_output_sink() -> OutputSink { OutputSink::Stdout }
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

/// Baud rates accepted for the serial sink
const SUPPORTED_BAUD_RATES: [u32; 8] = [9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600];

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            enable_move: default_enable_move(),
            increment_speed: default_unassigned(),
            decrement_speed: default_unassigned(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: default_input_source(),
            device_path: String::new(),
            deadzone: default_deadzone(),
            queue_size: default_queue_size(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sink: default_output_sink(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails (including a missing `max_displacement_per_second`)
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::config::Config;
    ///
    /// let config = Config::from_toml_str("[scale]\nmax_displacement_per_second = 1.0\n")?;
    /// assert_eq!(config.buttons.enable_move, 0);
    /// assert_eq!(config.scale.initial_scale, 0.5);
    /// # Ok::<(), joy_teleop::error::TeleopError>(())
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Validate button indices (-1 = unassigned)
        for (name, value) in [
            ("enable_move", self.buttons.enable_move),
            ("increment_speed", self.buttons.increment_speed),
            ("decrement_speed", self.buttons.decrement_speed),
        ] {
            if value < -1 {
                return Err(TeleopError::config(format!(
                    "{} must be a button index or -1 (got {})",
                    name, value
                )));
            }
        }

        // Validate axis names
        self.position_mapping()?;
        self.orientation_mapping()?;

        // Validate scale bounds
        let scale = &self.scale;
        let max = scale.max_displacement_per_second;
        if !max.is_finite() || max <= 0.0 {
            return Err(TeleopError::config("max_displacement_per_second must be greater than 0"));
        }

        if !scale.min_scale.is_finite() || scale.min_scale <= 0.0 {
            return Err(TeleopError::config("min_scale must be greater than 0"));
        }

        if scale.min_scale > scale.max_displacement_per_second {
            return Err(TeleopError::config(
                "min_scale must be less than or equal to max_displacement_per_second",
            ));
        }

        if !scale.initial_scale.is_finite() || scale.initial_scale <= 0.0 {
            return Err(TeleopError::config("initial_scale must be greater than 0"));
        }

        if scale.cooldown_ms > 60000 {
            return Err(TeleopError::config("cooldown_ms must be between 0 and 60000"));
        }

        // Validate input
        if !(0.0..=MAX_DEADZONE).contains(&self.input.deadzone) {
            return Err(TeleopError::config(format!(
                "deadzone must be between 0.0 and {}",
                MAX_DEADZONE
            )));
        }

        if self.input.queue_size == 0 || self.input.queue_size > 1024 {
            return Err(TeleopError::config("queue_size must be between 1 and 1024"));
        }

        // Validate output
        if self.output.sink == OutputSink::Serial {
            if self.output.serial_port.is_empty() {
                return Err(TeleopError::config("serial_port cannot be empty when sink is serial"));
            }

            if !SUPPORTED_BAUD_RATES.contains(&self.output.baud_rate) {
                return Err(TeleopError::config(format!(
                    "baud_rate must be one of: {:?}",
                    SUPPORTED_BAUD_RATES
                )));
            }
        }

        // Validate telemetry
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(TeleopError::config("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(TeleopError::config("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(TeleopError::config("max_files_to_keep must be greater than 0"));
        }

        Ok(())
    }

    /// Button indices with `-1` resolved to unassigned
    #[must_use]
    pub fn button_mapping(&self) -> ButtonMapping {
        ButtonMapping::from_raw(
            self.buttons.enable_move,
            self.buttons.increment_speed,
            self.buttons.decrement_speed,
        )
    }

    /// Translational axis mapping (`x`, `y`)
    ///
    /// # Errors
    ///
    /// Returns error if the `[axes.position]` table names anything else
    pub fn position_mapping(&self) -> Result<AxisMapping> {
        AxisMapping::from_names(
            self.axes.position.iter().map(|(name, &index)| (name.as_str(), index)),
            &Axis::TRANSLATIONAL,
        )
    }

    /// Rotational axis mapping (`z`)
    ///
    /// # Errors
    ///
    /// Returns error if the `[axes.orientation]` table names anything else
    pub fn orientation_mapping(&self) -> Result<AxisMapping> {
        AxisMapping::from_names(
            self.axes.orientation.iter().map(|(name, &index)| (name.as_str(), index)),
            &Axis::ROTATIONAL,
        )
    }

    /// Minimum time between scale adjustments
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.scale.cooldown_ms)
    }

    /// Velocity scaler seeded from `[scale]`
    ///
    /// # Errors
    ///
    /// Returns error if the bounds are inconsistent
    pub fn scaler(&self) -> Result<VelocityScaler> {
        VelocityScaler::new(
            self.scale.initial_scale,
            self.scale.min_scale,
            self.scale.max_displacement_per_second,
            self.cooldown(),
        )
    }
}
