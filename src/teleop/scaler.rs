//! # Velocity Scaler
//!
//! Owns the speed multiplier applied to every velocity component and the rules
//! for changing it at run time.
//!
//! ## Adjustment
//!
//! - Increment: `scale = min(scale * 1.2, max_scale)`
//! - Decrement: `scale = max(scale / 1.2, min_scale)`
//! - If both buttons are held, increment wins.
//!
//! ## Cooldown
//!
//! A held button would otherwise ramp the scale at the full input rate. After an
//! adjustment is applied, further requests are dropped until `cooldown` has
//! elapsed. Dropped requests are not queued or retried. The check is a
//! timestamp comparison against the caller-supplied `now`; nothing sleeps.
//!
//! ## Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//! use joy_teleop::teleop::scaler::{ScaleRequest, VelocityScaler};
//!
//! let mut scaler = VelocityScaler::new(1.0, 0.1, 2.0, Duration::from_millis(500))?;
//! let t0 = Instant::now();
//!
//! scaler.apply(ScaleRequest::Increase, t0);
//! assert!((scaler.scale() - 1.2).abs() < 1e-12);
//!
//! // Still cooling down
//! scaler.apply(ScaleRequest::Increase, t0 + Duration::from_millis(100));
//! assert!((scaler.scale() - 1.2).abs() < 1e-12);
//! # Ok::<(), joy_teleop::error::TeleopError>(())
//! ```

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::frame::InputFrame;
use super::mapping::ButtonMapping;
use crate::error::{Result, TeleopError};

/// Multiplicative step applied per adjustment.
pub const SCALE_STEP: f64 = 1.2;

/// Default lower scale bound.
pub const DEFAULT_MIN_SCALE: f64 = 0.1;

/// Default starting scale.
pub const DEFAULT_INITIAL_SCALE: f64 = 0.5;

/// Default minimum time between two applied adjustments.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(500);

/// Direction of a requested scale change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleRequest {
    /// Scale up by [`SCALE_STEP`].
    Increase,
    /// Scale down by [`SCALE_STEP`].
    Decrease,
}

impl ScaleRequest {
    /// Reads the adjustment request carried by a frame, if any.
    ///
    /// Unassigned or out-of-range buttons never request anything.
    #[must_use]
    pub fn from_frame(frame: &InputFrame, buttons: &ButtonMapping) -> Option<Self> {
        if frame.is_pressed(buttons.increment_speed) {
            Some(ScaleRequest::Increase)
        } else if frame.is_pressed(buttons.decrement_speed) {
            Some(ScaleRequest::Decrease)
        } else {
            None
        }
    }
}

/// Result of one adjustment attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// The frame did not ask for a change.
    NotRequested,
    /// The request arrived inside the cooldown window and was dropped.
    CoolingDown,
    /// The scale moved (or was re-clamped) from `from` to `to`.
    Applied {
        /// Scale before the adjustment.
        from: f64,
        /// Scale after the adjustment.
        to: f64,
    },
}

/// Mutable speed scale with fixed bounds and cooldown.
///
/// Invariant: `min_scale <= scale() <= max_scale` at all times.
#[derive(Debug, Clone)]
pub struct VelocityScaler {
    current: f64,
    min_scale: f64,
    max_scale: f64,
    cooldown: Duration,
    last_adjustment: Option<Instant>,
}

impl VelocityScaler {
    /// Creates a scaler.
    ///
    /// An `initial` scale outside `[min_scale, max_scale]` is clamped into range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any bound is not finite, if `min_scale`
    /// is not positive, or if `max_scale < min_scale`.
    pub fn new(initial: f64, min_scale: f64, max_scale: f64, cooldown: Duration) -> Result<Self> {
        if !initial.is_finite() || !min_scale.is_finite() || !max_scale.is_finite() {
            return Err(TeleopError::config("scale values must be finite numbers"));
        }

        if min_scale <= 0.0 {
            return Err(TeleopError::config(format!(
                "min_scale must be greater than 0 (got {})",
                min_scale
            )));
        }

        if max_scale < min_scale {
            return Err(TeleopError::config(format!(
                "max scale ({}) must be greater than or equal to min_scale ({})",
                max_scale, min_scale
            )));
        }

        let current = initial.clamp(min_scale, max_scale);
        if current != initial {
            warn!(
                "Initial scale {} outside [{}, {}], using {}",
                initial, min_scale, max_scale, current
            );
        }

        Ok(Self {
            current,
            min_scale,
            max_scale,
            cooldown,
            last_adjustment: None,
        })
    }

    /// Current scale factor.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.current
    }

    /// Lower bound.
    #[must_use]
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    /// Upper bound.
    #[must_use]
    pub fn max_scale(&self) -> f64 {
        self.max_scale
    }

    /// Minimum time between applied adjustments.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Time of the last applied adjustment, `None` if never adjusted.
    #[must_use]
    pub fn last_adjustment(&self) -> Option<Instant> {
        self.last_adjustment
    }

    /// Applies the adjustment requested by `frame`, if any.
    pub fn adjust(
        &mut self,
        frame: &InputFrame,
        buttons: &ButtonMapping,
        now: Instant,
    ) -> Adjustment {
        match ScaleRequest::from_frame(frame, buttons) {
            Some(request) => self.apply(request, now),
            None => Adjustment::NotRequested,
        }
    }

    /// Applies a single request at time `now`, honouring the cooldown.
    pub fn apply(&mut self, request: ScaleRequest, now: Instant) -> Adjustment {
        if let Some(last) = self.last_adjustment {
            if now.saturating_duration_since(last) < self.cooldown {
                debug!("Scale {:?} dropped, cooldown active", request);
                return Adjustment::CoolingDown;
            }
        }

        let from = self.current;
        let to = match request {
            ScaleRequest::Increase => (from * SCALE_STEP).min(self.max_scale),
            ScaleRequest::Decrease => (from / SCALE_STEP).max(self.min_scale),
        };

        self.current = to;
        self.last_adjustment = Some(now);

        match request {
            ScaleRequest::Increase => info!("Velocity scale increased {:.4} -> {:.4}", from, to),
            ScaleRequest::Decrease => info!("Velocity scale decreased {:.4} -> {:.4}", from, to),
        }

        Adjustment::Applied { from, to }
    }
}
