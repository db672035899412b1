//! # Joy Teleop Library
//!
//! Drive an omnidirectional platform from a joystick, safely.
//!
//! Every joystick frame becomes exactly one velocity command. Motion is only
//! produced while the deadman button is held; two further buttons step a
//! bounded velocity scale up and down with a cooldown between steps.

pub mod config;
pub mod error;
pub mod joystick;
pub mod runtime;
pub mod sink;
pub mod telemetry;
pub mod teleop;
