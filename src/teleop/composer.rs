//! # Command Composer
//!
//! Turns a frame, the current scale and the controller mode into a
//! [`VelocityCommand`].

use serde::Serialize;

use super::frame::{InputFrame, VelocityCommand};
use super::mapping::{resolve_axis, Axis, AxisMapping};

/// Per-frame controller mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Deadman released: stop.
    Idle,
    /// Deadman held: drive from the sticks.
    Active,
    /// Deadman held and a scale button pressed: adjust scale, keep last command.
    Scaling,
}

impl Mode {
    /// Lowercase name used in logs and telemetry.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Active => "active",
            Mode::Scaling => "scaling",
        }
    }
}

/// Builds velocity commands from the position and orientation axis mappings.
#[derive(Debug, Clone, Default)]
pub struct CommandComposer {
    position: AxisMapping,
    orientation: AxisMapping,
}

impl CommandComposer {
    /// Creates a composer from the translational (`x`, `y`) and rotational
    /// (`z`) mappings.
    #[must_use]
    pub fn new(position: AxisMapping, orientation: AxisMapping) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Composes the command for one frame.
    ///
    /// - [`Mode::Idle`]: zero command.
    /// - [`Mode::Scaling`]: `previous`, unchanged.
    /// - [`Mode::Active`]: each axis multiplied by `scale`.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::composer::{CommandComposer, Mode};
    /// use joy_teleop::teleop::frame::{InputFrame, VelocityCommand};
    /// use joy_teleop::teleop::mapping::{Axis, AxisMapping};
    ///
    /// let composer = CommandComposer::new(
    ///     AxisMapping::new().with(Axis::X, 0).with(Axis::Y, 1),
    ///     AxisMapping::new().with(Axis::Z, 2),
    /// );
    /// let frame = InputFrame::new(vec![0.5, -0.5, 1.0], vec![true]);
    ///
    /// let cmd = composer.compose(&frame, 0.5, Mode::Active, VelocityCommand::ZERO);
    /// assert_eq!(cmd, VelocityCommand::new(0.25, -0.25, 0.5));
    ///
    /// let stopped = composer.compose(&frame, 0.5, Mode::Idle, cmd);
    /// assert!(stopped.is_zero());
    /// ```
    #[must_use]
    pub fn compose(
        &self,
        frame: &InputFrame,
        scale: f64,
        mode: Mode,
        previous: VelocityCommand,
    ) -> VelocityCommand {
        match mode {
            Mode::Idle => VelocityCommand::ZERO,
            Mode::Scaling => previous,
            Mode::Active => self.motion(frame, scale),
        }
    }

    /// Scaled motion command straight from the sticks.
    #[must_use]
    pub fn motion(&self, frame: &InputFrame, scale: f64) -> VelocityCommand {
        VelocityCommand {
            linear_x: scale * resolve_axis(frame, &self.position, Axis::X),
            linear_y: scale * resolve_axis(frame, &self.position, Axis::Y),
            angular_z: scale * resolve_axis(frame, &self.orientation, Axis::Z),
        }
    }
}
