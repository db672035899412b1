//! # Joystick Module
//!
//! Produces [`InputFrame`](crate::teleop::frame::InputFrame)s for the controller.
//!
//! This module handles:
//! - Joystick detection and connection via evdev
//! - Normalizing axes and applying the deadzone
//! - Assembling evdev reports into frames
//! - Reading frames as JSON lines (stdin or any async reader)

pub mod deadzone;
pub mod device;
pub mod frame_builder;
pub mod stdin;

pub use deadzone::Deadzone;
pub use device::JoystickDevice;
pub use frame_builder::{AxisRange, FrameBuilder};
pub use stdin::read_frames;
