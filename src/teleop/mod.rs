//! # Teleop Module
//!
//! Deadman-gated joystick to velocity control law.
//!
//! This module handles:
//! - Resolving semantic axes (`x`, `y`, `z`) from raw frames
//! - The deadman gate
//! - The bounded, cooled-down velocity scale
//! - Composing one velocity command per frame

pub mod composer;
pub mod controller;
pub mod frame;
pub mod gate;
pub mod mapping;
pub mod scaler;

pub use composer::{CommandComposer, Mode};
pub use controller::TeleopController;
pub use frame::{InputFrame, VelocityCommand};
pub use mapping::{Axis, AxisMapping, ButtonMapping};
pub use scaler::VelocityScaler;
