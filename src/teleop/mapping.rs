//! # Axis and Button Mapping
//!
//! Maps the semantic motion axes (`x`, `y`, `z`) and the three control buttons
//! onto indices of an [`InputFrame`].
//!
//! Axis names are validated once when a mapping is built, so per-frame lookups
//! are plain array reads. The only check left for run time is whether the
//! mapped index actually exists in the frame, since that depends on the device.
//!
//! ## Usage
//!
//! ```
//! use joy_teleop::teleop::frame::InputFrame;
//! use joy_teleop::teleop::mapping::{resolve_axis, Axis, AxisMapping};
//!
//! let position = AxisMapping::new().with(Axis::X, 0).with(Axis::Y, 1);
//! let frame = InputFrame::new(vec![0.5, -0.5, 1.0], vec![]);
//!
//! assert_eq!(resolve_axis(&frame, &position, Axis::X), 0.5);
//! assert_eq!(resolve_axis(&frame, &position, Axis::Y), -0.5);
//! // Not mapped: neutral
//! assert_eq!(resolve_axis(&frame, &position, Axis::Z), 0.0);
//! ```

use std::fmt;

use super::frame::InputFrame;
use crate::error::{Result, TeleopError};

/// Semantic motion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Forward/backward translation.
    X,
    /// Lateral translation.
    Y,
    /// Rotation about the vertical axis.
    Z,
}

impl Axis {
    /// Axes driven by the position mapping.
    pub const TRANSLATIONAL: [Axis; 2] = [Axis::X, Axis::Y];
    /// Axes driven by the orientation mapping.
    pub const ROTATIONAL: [Axis; 1] = [Axis::Z];

    /// Configuration name of the axis.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    /// Parses a configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Axis> {
        match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed mapping from semantic axis to frame axis index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisMapping {
    slots: [Option<usize>; 3],
}

impl AxisMapping {
    /// Creates an empty mapping (every axis unmapped).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the mapping with `axis` bound to `index`.
    #[must_use]
    pub fn with(mut self, axis: Axis, index: usize) -> Self {
        self.slots[axis.slot()] = Some(index);
        self
    }

    /// Frame index for `axis`, if mapped.
    #[must_use]
    pub fn index(&self, axis: Axis) -> Option<usize> {
        self.slots[axis.slot()]
    }

    /// Builds a mapping from named entries, accepting only the `allowed` axes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a name is not an axis, names an axis
    /// outside `allowed`, or appears twice.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::mapping::{Axis, AxisMapping};
    ///
    /// let ok = AxisMapping::from_names([("x", 1), ("y", 0)], &Axis::TRANSLATIONAL);
    /// assert_eq!(ok.unwrap().index(Axis::X), Some(1));
    ///
    /// let bad = AxisMapping::from_names([("z", 3)], &Axis::TRANSLATIONAL);
    /// assert!(bad.is_err());
    /// ```
    pub fn from_names<'a, I>(entries: I, allowed: &[Axis]) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut mapping = Self::new();
        for (name, index) in entries {
            let axis = Axis::from_name(name)
                .ok_or_else(|| TeleopError::config(format!("unknown axis name '{}'", name)))?;

            if !allowed.contains(&axis) {
                let names: Vec<&str> = allowed.iter().map(|a| a.name()).collect();
                return Err(TeleopError::config(format!(
                    "axis '{}' is not allowed here (expected one of: {})",
                    name,
                    names.join(", ")
                )));
            }

            if mapping.index(axis).is_some() {
                return Err(TeleopError::config(format!("axis '{}' mapped twice", name)));
            }

            mapping = mapping.with(axis, index);
        }
        Ok(mapping)
    }
}

/// Reads the value of a semantic axis from a frame.
///
/// Returns `0.0` when the axis is not mapped or the mapped index is beyond the
/// end of `frame.axes`. A missing axis must never produce motion.
#[must_use]
pub fn resolve_axis(frame: &InputFrame, mapping: &AxisMapping, axis: Axis) -> f64 {
    mapping
        .index(axis)
        .and_then(|index| frame.axis(index))
        .unwrap_or(0.0)
}

/// Indices of the three control buttons.
///
/// `None` means the button is unassigned and the feature it drives is
/// disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonMapping {
    /// Deadman button; motion is only commanded while held.
    pub enable_move: Option<usize>,
    /// Scale-up button.
    pub increment_speed: Option<usize>,
    /// Scale-down button.
    pub decrement_speed: Option<usize>,
}

impl ButtonMapping {
    /// Builds a mapping from raw configured indices, where any negative value
    /// means unassigned.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::mapping::ButtonMapping;
    ///
    /// let buttons = ButtonMapping::from_raw(1, 4, -1);
    /// assert_eq!(buttons.enable_move, Some(1));
    /// assert_eq!(buttons.increment_speed, Some(4));
    /// assert_eq!(buttons.decrement_speed, None);
    /// ```
    #[must_use]
    pub fn from_raw(enable_move: i64, increment_speed: i64, decrement_speed: i64) -> Self {
        Self {
            enable_move: button_index(enable_move),
            increment_speed: button_index(increment_speed),
            decrement_speed: button_index(decrement_speed),
        }
    }
}

/// Converts a configured button index to `Some(index)`, or `None` when negative.
#[must_use]
pub fn button_index(raw: i64) -> Option<usize> {
    usize::try_from(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(axes: &[f64]) -> InputFrame {
        InputFrame::new(axes.to_vec(), vec![])
    }

    // ==================== Axis Tests ====================

    #[test]
    fn test_axis_names_round_trip() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            assert_eq!(Axis::from_name(axis.name()), Some(axis));
        }
        assert_eq!(Axis::from_name("w"), None);
        assert_eq!(Axis::from_name("X"), None);
    }

    // ==================== resolve_axis Tests ====================

    #[test]
    fn test_resolve_mapped_axis() {
        let mapping = AxisMapping::new().with(Axis::Z, 2);
        assert_eq!(resolve_axis(&frame(&[0.0, 0.0, -0.75]), &mapping, Axis::Z), -0.75);
    }

    #[test]
    fn test_resolve_unmapped_axis_is_zero() {
        let mapping = AxisMapping::new().with(Axis::X, 0);
        for axes in [&[][..], &[1.0][..], &[1.0, 1.0, 1.0][..]] {
            assert_eq!(resolve_axis(&frame(axes), &mapping, Axis::Y), 0.0);
        }
    }

    #[test]
    fn test_resolve_out_of_range_index_is_zero() {
        let mapping = AxisMapping::new().with(Axis::X, 3);
        assert_eq!(resolve_axis(&frame(&[1.0, 1.0, 1.0]), &mapping, Axis::X), 0.0);
        assert_eq!(resolve_axis(&frame(&[]), &mapping, Axis::X), 0.0);

        let far = AxisMapping::new().with(Axis::X, usize::MAX);
        assert_eq!(resolve_axis(&frame(&[1.0]), &far, Axis::X), 0.0);
    }

    #[test]
    fn test_resolve_does_not_scale() {
        let mapping = AxisMapping::new().with(Axis::X, 0);
        assert_eq!(resolve_axis(&frame(&[3.5]), &mapping, Axis::X), 3.5);
    }

    // ==================== from_names Tests ====================

    #[test]
    fn test_from_names_empty() {
        let entries = std::iter::empty::<(&str, usize)>();
        let mapping = AxisMapping::from_names(entries, &Axis::TRANSLATIONAL).unwrap();
        assert_eq!(mapping, AxisMapping::new());
    }

    #[test]
    fn test_from_names_unknown_axis() {
        let err = AxisMapping::from_names([("roll", 0)], &Axis::ROTATIONAL).unwrap_err();
        assert!(err.to_string().contains("unknown axis name 'roll'"));
    }

    #[test]
    fn test_from_names_wrong_group() {
        assert!(AxisMapping::from_names([("x", 0)], &Axis::ROTATIONAL).is_err());
        assert!(AxisMapping::from_names([("z", 0)], &Axis::TRANSLATIONAL).is_err());
    }

    #[test]
    fn test_from_names_duplicate() {
        assert!(AxisMapping::from_names([("x", 0), ("x", 1)], &Axis::TRANSLATIONAL).is_err());
    }

    #[test]
    fn test_from_names_shared_index_allowed() {
        // Two semantic axes may read the same physical axis
        let mapping =
            AxisMapping::from_names([("x", 0), ("y", 0)], &Axis::TRANSLATIONAL).unwrap();
        assert_eq!(mapping.index(Axis::X), Some(0));
        assert_eq!(mapping.index(Axis::Y), Some(0));
    }

    // ==================== ButtonMapping Tests ====================

    #[test]
    fn test_button_index_sentinel() {
        assert_eq!(button_index(-1), None);
        assert_eq!(button_index(-42), None);
        assert_eq!(button_index(0), Some(0));
        assert_eq!(button_index(11), Some(11));
    }

    #[test]
    fn test_button_mapping_default_is_unassigned() {
        let buttons = ButtonMapping::default();
        assert_eq!(buttons.enable_move, None);
        assert_eq!(buttons.increment_speed, None);
        assert_eq!(buttons.decrement_speed, None);
    }
}
