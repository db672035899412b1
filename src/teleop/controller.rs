//! # Teleop Controller
//!
//! Processes one [`InputFrame`] at a time and produces exactly one
//! [`VelocityCommand`] for it.
//!
//! ## Per-frame sequence
//!
//! 1. Evaluate the deadman gate.
//! 2. If open, check for an increment/decrement request.
//! 3. Requested: adjust the scale and keep the previous command.
//!    Not requested: compose a motion command from the sticks.
//! 4. If closed: zero command.
//! 5. Return the command (the caller publishes it) and log it.
//!
//! The mode is recomputed from scratch every frame. The only state carried
//! between frames is the scaler and the last emitted command.

use std::time::Instant;
use tracing::{debug, info};

use super::composer::{CommandComposer, Mode};
use super::frame::{InputFrame, VelocityCommand};
use super::gate;
use super::mapping::ButtonMapping;
use super::scaler::{Adjustment, VelocityScaler};
use crate::config::Config;
use crate::error::Result;

/// Deadman-gated teleoperation controller.
///
/// Owns the scale state exclusively; it is meant to be driven from a single
/// task.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use joy_teleop::teleop::composer::CommandComposer;
/// use joy_teleop::teleop::controller::TeleopController;
/// use joy_teleop::teleop::frame::{InputFrame, VelocityCommand};
/// use joy_teleop::teleop::mapping::{Axis, AxisMapping, ButtonMapping};
/// use joy_teleop::teleop::scaler::VelocityScaler;
///
/// let mut controller = TeleopController::new(
///     ButtonMapping::from_raw(0, -1, -1),
///     CommandComposer::new(AxisMapping::new().with(Axis::X, 0), AxisMapping::new()),
///     VelocityScaler::new(0.5, 0.1, 1.0, Duration::from_millis(500))?,
/// );
///
/// let held = InputFrame::new(vec![1.0], vec![true]);
/// assert_eq!(controller.process(&held, Instant::now()), VelocityCommand::new(0.5, 0.0, 0.0));
///
/// let released = InputFrame::new(vec![1.0], vec![false]);
/// assert!(controller.process(&released, Instant::now()).is_zero());
/// # Ok::<(), joy_teleop::error::TeleopError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TeleopController {
    buttons: ButtonMapping,
    composer: CommandComposer,
    scaler: VelocityScaler,
    last_command: VelocityCommand,
    mode: Mode,
}

impl TeleopController {
    /// Creates a controller in [`Mode::Idle`] with a zero last command.
    #[must_use]
    pub fn new(buttons: ButtonMapping, composer: CommandComposer, scaler: VelocityScaler) -> Self {
        Self {
            buttons,
            composer,
            scaler,
            last_command: VelocityCommand::ZERO,
            mode: Mode::Idle,
        }
    }

    /// Builds a controller from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the axis maps name unknown axes or the
    /// scale bounds are inconsistent.
    pub fn from_config(config: &Config) -> Result<Self> {
        let composer =
            CommandComposer::new(config.position_mapping()?, config.orientation_mapping()?);
        let controller = Self::new(config.button_mapping(), composer, config.scaler()?);

        info!(
            "Teleop controller ready: scale {:.3} in [{:.3}, {:.3}], cooldown {}ms, buttons {:?}",
            controller.scaler.scale(),
            controller.scaler.min_scale(),
            controller.scaler.max_scale(),
            controller.scaler.cooldown().as_millis(),
            controller.buttons
        );

        Ok(controller)
    }

    /// Processes one frame received at `now` and returns the command to publish.
    pub fn process(&mut self, frame: &InputFrame, now: Instant) -> VelocityCommand {
        let mode = if !gate::is_open(frame, &self.buttons) {
            Mode::Idle
        } else {
            match self.scaler.adjust(frame, &self.buttons, now) {
                Adjustment::NotRequested => Mode::Active,
                Adjustment::CoolingDown | Adjustment::Applied { .. } => Mode::Scaling,
            }
        };

        let command = self
            .composer
            .compose(frame, self.scaler.scale(), mode, self.last_command);

        if mode != self.mode {
            debug!("Teleop mode {} -> {}", self.mode.as_str(), mode.as_str());
        }
        self.mode = mode;
        self.last_command = command;

        debug!(
            mode = mode.as_str(),
            scale = self.scaler.scale(),
            "Velocity command - Linear (x, y): ({:.5}, {:.5}), Angular (z): ({:.5})",
            command.linear_x,
            command.linear_y,
            command.angular_z
        );

        command
    }

    /// Forces the controller to idle and returns the zero command.
    ///
    /// Used when the input stream ends or on shutdown; the scale is kept.
    pub fn stop(&mut self) -> VelocityCommand {
        self.mode = Mode::Idle;
        self.last_command = VelocityCommand::ZERO;
        self.last_command
    }

    /// Current scale factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scaler.scale()
    }

    /// Mode decided for the most recent frame.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Most recently emitted command.
    #[must_use]
    pub fn last_command(&self) -> VelocityCommand {
        self.last_command
    }

    /// Button assignment in use.
    #[must_use]
    pub fn buttons(&self) -> &ButtonMapping {
        &self.buttons
    }
}
