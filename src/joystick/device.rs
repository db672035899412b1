//! # Joystick Device Module
//!
//! Joystick detection, connection and frame reading using the Linux evdev
//! interface.
//!
//! ## Detection
//!
//! With no configured path, all `/dev/input/event*` devices are scanned in
//! sorted order and the first one that reports an `ABS_X` axis and at least
//! one joystick/gamepad button is used.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::deadzone::Deadzone;
use super::frame_builder::{AxisRange, FrameBuilder};
use crate::error::{Result, TeleopError};
use crate::teleop::frame::InputFrame;

/// First evdev key code in the joystick/gamepad button range (`BTN_MISC`).
const FIRST_BUTTON_CODE: u16 = 0x100;

/// Joystick handle
///
/// Represents an open evdev joystick plus the builder that turns its events
/// into frames.
pub struct JoystickDevice {
    device: Device,
    device_path: String,
    builder: FrameBuilder,
}

impl std::fmt::Debug for JoystickDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoystickDevice")
            .field("device_path", &self.device_path)
            .field("axes", &self.builder.axis_count())
            .field("buttons", &self.builder.button_count())
            .finish_non_exhaustive()
    }
}

impl JoystickDevice {
    /// Open a joystick
    ///
    /// Opens `path` if it is non-empty, otherwise auto-detects.
    ///
    /// # Errors
    ///
    /// - `DeviceNotFound`: no joystick found on the system
    /// - `Device`: the device could not be opened or queried
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::joystick::deadzone::Deadzone;
    /// use joy_teleop::joystick::device::JoystickDevice;
    ///
    /// let joystick = JoystickDevice::open("", Deadzone::default())?;
    /// println!("Connected to joystick at: {}", joystick.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, deadzone: Deadzone) -> Result<Self> {
        if path.is_empty() {
            return Self::detect(deadzone);
        }

        let device = Device::open(path)
            .map_err(|e| TeleopError::Device(format!("Failed to open {}: {}", path, e)))?;
        Self::from_device(device, path.to_string(), deadzone)
    }

    /// Scan `/dev/input` for the first joystick
    fn detect(deadzone: Deadzone) -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(TeleopError::Device("/dev/input directory not found".to_string()));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Device(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| TeleopError::Device(format!("Failed to read directory entry: {}", e)))?;

        // Deterministic selection when several joysticks are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_joystick(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found joystick at: {}", device_path);
                        return Self::from_device(device, device_path, deadzone);
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::DeviceNotFound)
    }

    fn from_device(device: Device, device_path: String, deadzone: Deadzone) -> Result<Self> {
        let abs_state = device
            .get_abs_state()
            .map_err(|e| TeleopError::Device(format!("Failed to read axis ranges: {}", e)))?;

        let axes: Vec<AxisRange> = device
            .supported_absolute_axes()
            .map(|set| {
                set.iter()
                    .filter_map(|axis| {
                        abs_state
                            .get(usize::from(axis.0))
                            .map(|info| AxisRange::new(axis.0, info.minimum, info.maximum))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let buttons: Vec<u16> = device
            .supported_keys()
            .map(|keys| {
                keys.iter()
                    .map(|key| key.code())
                    .filter(|&code| code >= FIRST_BUTTON_CODE)
                    .collect()
            })
            .unwrap_or_default();

        let codes: Vec<u16> = axes.iter().map(|range| range.code).collect();
        let mut builder = FrameBuilder::new(axes, buttons, deadzone);

        // Sticks already off-center at startup
        for code in codes {
            if let Some(info) = abs_state.get(usize::from(code)) {
                builder.set_axis(code, info.value);
            }
        }

        info!(
            "Joystick {} ({}): {} axes, {} buttons, deadzone {:.2}",
            device_path,
            device.name().unwrap_or("unnamed"),
            builder.axis_count(),
            builder.button_count(),
            deadzone.threshold()
        );

        Ok(Self {
            device,
            device_path,
            builder,
        })
    }

    /// Get the device path of this joystick
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get the joystick name from evdev
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Read pending events and return every completed frame
    ///
    /// This call blocks until the device has events.
    ///
    /// # Errors
    ///
    /// Returns `Device` error if fetching events fails (e.g. joystick unplugged).
    pub fn fetch_frames(&mut self) -> Result<Vec<InputFrame>> {
        let events = self
            .device
            .fetch_events()
            .map_err(|e| TeleopError::Device(format!("Failed to fetch events: {}", e)))?;

        let mut frames = Vec::new();
        for event in events {
            if let Some(frame) = self.builder.process_event(&event) {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    /// Forward frames into `tx` until the device fails or the receiver is gone
    ///
    /// Blocking; run it on a dedicated thread (e.g. `spawn_blocking`).
    pub fn run(mut self, tx: mpsc::Sender<InputFrame>) {
        loop {
            match self.fetch_frames() {
                Ok(frames) => {
                    for frame in frames {
                        if tx.blocking_send(frame).is_err() {
                            debug!("Frame receiver dropped, joystick reader exiting");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("Joystick {} lost: {}", self.device_path, e);
                    // Report everything released before the channel closes
                    self.builder.reset();
                    let _ = tx.blocking_send(self.builder.frame().clone());
                    return;
                }
            }
        }
    }
}

/// Whether a device looks like a joystick or gamepad
fn is_joystick(device: &Device) -> bool {
    let has_stick = device
        .supported_absolute_axes()
        .map(|axes| axes.contains(AbsoluteAxisType::ABS_X))
        .unwrap_or(false);

    let has_buttons = device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER))
        .unwrap_or(false);

    has_stick && has_buttons
}
