//! # Deadzone Module
//!
//! Eliminates small stick movements near center to prevent drift.
//!
//! Values within the deadzone are mapped to 0.0, values outside are rescaled
//! so that full deflection still reads ±1.0.
//!
//! ```
//! use joy_teleop::joystick::deadzone::Deadzone;
//!
//! let dz = Deadzone::new(0.05);
//! assert_eq!(dz.apply(0.02), 0.0);
//! assert!((dz.apply(1.0) - 1.0).abs() < 1e-9);
//! assert!((dz.apply(-1.0) + 1.0).abs() < 1e-9);
//! ```

/// Maximum accepted deadzone fraction.
pub const MAX_DEADZONE: f64 = 0.25;

/// Per-axis deadzone for normalized input (-1.0 to 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deadzone {
    threshold: f64,
}

impl Default for Deadzone {
    fn default() -> Self {
        Self { threshold: 0.05 }
    }
}

impl Deadzone {
    /// Creates a deadzone. Values outside 0.0 to 0.25 are clamped; NaN means
    /// no deadzone.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        if threshold.is_nan() {
            return Self::none();
        }
        Self {
            threshold: threshold.clamp(0.0, MAX_DEADZONE),
        }
    }

    /// No deadzone.
    #[must_use]
    pub fn none() -> Self {
        Self { threshold: 0.0 }
    }

    /// Configured threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Applies the deadzone to a normalized input.
    #[must_use]
    pub fn apply(&self, input: f64) -> f64 {
        let magnitude = input.abs();
        if magnitude <= self.threshold {
            return 0.0;
        }
        let rescaled = ((magnitude - self.threshold) / (1.0 - self.threshold)).min(1.0);
        rescaled.copysign(input)
    }
}
