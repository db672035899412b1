//! # Frame and Command Types
//!
//! [`InputFrame`] is one joystick poll: an ordered list of axis readings and an
//! ordered list of button states. [`VelocityCommand`] is what the platform is
//! told to do for the current control cycle.

use serde::{Deserialize, Deserializer, Serialize};

/// A single joystick poll.
///
/// Axes are normalized floats (typically -1.0 to 1.0) and buttons are plain
/// pressed/released flags. Neither list has a fixed length; values are only
/// ever read through configured indices.
///
/// When deserialized from JSON, buttons may be given either as booleans or as
/// integers (`0` = released, anything else = pressed).
///
/// # Examples
///
/// ```
/// use joy_teleop::teleop::frame::InputFrame;
///
/// let frame = InputFrame::new(vec![0.5, -0.5], vec![true, false]);
/// assert_eq!(frame.axis(1), Some(-0.5));
/// assert_eq!(frame.axis(7), None);
/// assert!(frame.is_pressed(Some(0)));
/// assert!(!frame.is_pressed(Some(9)));
/// assert!(!frame.is_pressed(None));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Axis readings, in device order.
    #[serde(default)]
    pub axes: Vec<f64>,
    /// Button states, in device order.
    #[serde(default, deserialize_with = "deserialize_buttons")]
    pub buttons: Vec<bool>,
}

impl InputFrame {
    /// Creates a frame from raw axis and button lists.
    #[must_use]
    pub fn new(axes: Vec<f64>, buttons: Vec<bool>) -> Self {
        Self { axes, buttons }
    }

    /// Returns the axis at `index`, or `None` if the frame is too short.
    #[must_use]
    pub fn axis(&self, index: usize) -> Option<f64> {
        self.axes.get(index).copied()
    }

    /// Returns whether the button at `index` is held.
    ///
    /// An unassigned (`None`) or out-of-range index reads as released.
    #[must_use]
    pub fn is_pressed(&self, index: Option<usize>) -> bool {
        index
            .and_then(|i| self.buttons.get(i).copied())
            .unwrap_or(false)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ButtonValue {
    Flag(bool),
    Level(i64),
}

fn deserialize_buttons<'de, D>(deserializer: D) -> std::result::Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<ButtonValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| match value {
            ButtonValue::Flag(pressed) => pressed,
            ButtonValue::Level(level) => level != 0,
        })
        .collect())
}

/// Velocity command for an omnidirectional base.
///
/// Only the planar components exist: linear x/y and angular z. Angular x/y are
/// always zero on this platform and are not carried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityCommand {
    /// Forward velocity.
    pub linear_x: f64,
    /// Lateral velocity.
    pub linear_y: f64,
    /// Yaw rate.
    pub angular_z: f64,
}

impl VelocityCommand {
    /// The stop command.
    pub const ZERO: VelocityCommand = VelocityCommand {
        linear_x: 0.0,
        linear_y: 0.0,
        angular_z: 0.0,
    };

    /// Creates a command from its three components.
    #[must_use]
    pub fn new(linear_x: f64, linear_y: f64, angular_z: f64) -> Self {
        Self {
            linear_x,
            linear_y,
            angular_z,
        }
    }

    /// Returns true if every component is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}
