//! # Frame Builder Module
//!
//! Accumulates raw evdev events into [`InputFrame`]s.
//!
//! ## Layout
//!
//! Frame axes and buttons follow the order of the device's evdev codes, so a
//! gamepad with `ABS_X`, `ABS_Y`, `ABS_RX`, `ABS_RY` reports them as axes 0-3
//! and `BTN_SOUTH`, `BTN_EAST`, ... as buttons 0, 1, ...
//!
//! ## Normalization
//!
//! Absolute axes are mapped linearly from the device's `[minimum, maximum]` to
//! `[-1.0, 1.0]` and negated, so stick up and stick left read positive. The
//! deadzone is applied after normalization.
//!
//! ## Frames
//!
//! evdev delivers one `SYN_REPORT` after each batch of changes. The builder
//! returns a snapshot on every `SYN_REPORT` that follows at least one change.

use evdev::{InputEvent, InputEventKind, Synchronization};

use super::deadzone::Deadzone;
use crate::teleop::frame::InputFrame;

/// Range of one absolute axis, as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    /// evdev `ABS_*` code.
    pub code: u16,
    /// Reported minimum raw value.
    pub minimum: i32,
    /// Reported maximum raw value.
    pub maximum: i32,
}

impl AxisRange {
    /// Creates an axis range.
    #[must_use]
    pub fn new(code: u16, minimum: i32, maximum: i32) -> Self {
        Self {
            code,
            minimum,
            maximum,
        }
    }

    /// Maps a raw value to -1.0 .. 1.0 (inverted, see module docs).
    ///
    /// A degenerate range (`maximum <= minimum`) always reads 0.0.
    #[must_use]
    pub fn normalize(&self, value: i32) -> f64 {
        if self.maximum <= self.minimum {
            return 0.0;
        }
        let span = f64::from(self.maximum) - f64::from(self.minimum);
        let offset = f64::from(value.clamp(self.minimum, self.maximum)) - f64::from(self.minimum);
        -(2.0 * offset / span - 1.0)
    }
}

/// Turns an evdev event stream into frames.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    axes: Vec<AxisRange>,
    buttons: Vec<u16>,
    deadzone: Deadzone,
    frame: InputFrame,
    dirty: bool,
}

impl FrameBuilder {
    /// Creates a builder for the given axis ranges and button codes.
    ///
    /// Both lists are sorted by code so the frame layout is stable.
    #[must_use]
    pub fn new(mut axes: Vec<AxisRange>, mut buttons: Vec<u16>, deadzone: Deadzone) -> Self {
        axes.sort_by_key(|range| range.code);
        buttons.sort_unstable();
        buttons.dedup();

        let frame = InputFrame::new(vec![0.0; axes.len()], vec![false; buttons.len()]);
        Self {
            axes,
            buttons,
            deadzone,
            frame,
            dirty: false,
        }
    }

    /// Number of axes in each frame.
    #[must_use]
    pub fn axis_count(&self) -> usize {
        self.axes.len()
    }

    /// Number of buttons in each frame.
    #[must_use]
    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    /// Current accumulated state.
    #[must_use]
    pub fn frame(&self) -> &InputFrame {
        &self.frame
    }

    /// Processes one event; returns a frame when a report completes.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<InputFrame> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                if self.set_axis(axis.0, event.value()) {
                    self.dirty = true;
                }
                None
            }
            InputEventKind::Key(key) => {
                if let Ok(slot) = self.buttons.binary_search(&key.code()) {
                    // 0 = release, 1 = press, 2 = autorepeat
                    self.frame.buttons[slot] = event.value() != 0;
                    self.dirty = true;
                }
                None
            }
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) if self.dirty => {
                self.dirty = false;
                Some(self.frame.clone())
            }
            _ => None,
        }
    }

    /// Stores a raw reading for axis `code` without marking a change.
    ///
    /// Used to seed the frame from the device's current state. Returns `false`
    /// for codes the builder does not track.
    pub fn set_axis(&mut self, code: u16, raw: i32) -> bool {
        match self.axes.iter().position(|range| range.code == code) {
            Some(slot) => {
                let normalized = self.axes[slot].normalize(raw);
                self.frame.axes[slot] = self.deadzone.apply(normalized);
                true
            }
            None => false,
        }
    }

    /// Releases every button and centers every axis.
    pub fn reset(&mut self) {
        self.frame.axes.iter_mut().for_each(|v| *v = 0.0);
        self.frame.buttons.iter_mut().for_each(|b| *b = false);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evdev::{AbsoluteAxisType, EventType, Key};

    fn make_axis_event(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    fn make_key_event(key: Key, pressed: bool) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), if pressed { 1 } else { 0 })
    }

    fn make_syn() -> InputEvent {
        InputEvent::new(EventType::SYNCHRONIZATION, Synchronization::SYN_REPORT.0, 0)
    }

    fn gamepad() -> FrameBuilder {
        FrameBuilder::new(
            vec![
                AxisRange::new(AbsoluteAxisType::ABS_RX.0, -32768, 32767),
                AxisRange::new(AbsoluteAxisType::ABS_X.0, -32768, 32767),
                AxisRange::new(AbsoluteAxisType::ABS_Y.0, -32768, 32767),
            ],
            vec![Key::BTN_EAST.code(), Key::BTN_SOUTH.code()],
            Deadzone::none(),
        )
    }

    // ==================== AxisRange Tests ====================

    #[test]
    fn test_normalize_extremes() {
        let range = AxisRange::new(0, 0, 255);
        assert_eq!(range.normalize(0), 1.0);
        assert_eq!(range.normalize(255), -1.0);
    }

    #[test]
    fn test_normalize_center_signed() {
        let range = AxisRange::new(0, -100, 100);
        assert_eq!(range.normalize(0), 0.0);
        assert!((range.normalize(50) + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_clamps() {
        let range = AxisRange::new(0, 0, 255);
        assert_eq!(range.normalize(-50), 1.0);
        assert_eq!(range.normalize(999), -1.0);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(AxisRange::new(0, 5, 5).normalize(5), 0.0);
        assert_eq!(AxisRange::new(0, 10, 0).normalize(3), 0.0);
    }

    // ==================== Layout Tests ====================

    #[test]
    fn test_layout_sorted_by_code() {
        let mut builder = gamepad();
        assert_eq!(builder.axis_count(), 3);
        assert_eq!(builder.button_count(), 2);

        // ABS_X (0) is axis 0 even though it was listed second
        builder.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, -32768));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert_eq!(frame.axes[0], 1.0);
        assert_eq!(frame.axes[2], 0.0);

        // BTN_SOUTH (0x130) sorts before BTN_EAST (0x131)
        builder.process_event(&make_key_event(Key::BTN_SOUTH, true));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert_eq!(frame.buttons, vec![true, false]);
    }

    // ==================== Event Tests ====================

    #[test]
    fn test_no_frame_without_changes() {
        let mut builder = gamepad();
        assert!(builder.process_event(&make_syn()).is_none());
    }

    #[test]
    fn test_frame_only_on_syn() {
        let mut builder = gamepad();
        assert!(builder
            .process_event(&make_axis_event(AbsoluteAxisType::ABS_Y, 32767))
            .is_none());
        assert!(builder
            .process_event(&make_key_event(Key::BTN_EAST, true))
            .is_none());

        let frame = builder.process_event(&make_syn()).unwrap();
        assert_eq!(frame.axes[1], -1.0);
        assert_eq!(frame.buttons, vec![false, true]);

        // Nothing new since last report
        assert!(builder.process_event(&make_syn()).is_none());
    }

    #[test]
    fn test_button_release() {
        let mut builder = gamepad();
        builder.process_event(&make_key_event(Key::BTN_SOUTH, true));
        builder.process_event(&make_syn());
        builder.process_event(&make_key_event(Key::BTN_SOUTH, false));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert!(!frame.buttons[0]);
    }

    #[test]
    fn test_autorepeat_counts_as_pressed() {
        let mut builder = gamepad();
        builder.process_event(&InputEvent::new(EventType::KEY, Key::BTN_SOUTH.code(), 2));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert!(frame.buttons[0]);
    }

    #[test]
    fn test_unknown_codes_ignored() {
        let mut builder = gamepad();
        builder.process_event(&make_axis_event(AbsoluteAxisType::ABS_HAT0X, 1));
        builder.process_event(&make_key_event(Key::BTN_START, true));
        assert!(builder.process_event(&make_syn()).is_none());
    }

    #[test]
    fn test_deadzone_applied() {
        let mut builder = FrameBuilder::new(
            vec![AxisRange::new(AbsoluteAxisType::ABS_X.0, -100, 100)],
            vec![],
            Deadzone::new(0.1),
        );
        builder.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 5));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert_eq!(frame.axes[0], 0.0);
    }

    #[test]
    fn test_centered_stick_with_nan_deadzone() {
        let mut builder = FrameBuilder::new(
            vec![AxisRange::new(AbsoluteAxisType::ABS_X.0, -100, 100)],
            vec![Key::BTN_SOUTH.code()],
            Deadzone::new(f64::NAN),
        );
        builder.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 0));
        builder.process_event(&make_key_event(Key::BTN_SOUTH, true));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert_eq!(frame.axes[0], 0.0);
    }

    #[test]
    fn test_seeded_axis_kept_until_next_report() {
        let mut builder = gamepad();
        assert!(builder.set_axis(AbsoluteAxisType::ABS_Y.0, -32768));
        assert!(!builder.set_axis(AbsoluteAxisType::ABS_HAT0X.0, 1));

        // Seeding alone is not a report
        assert!(builder.process_event(&make_syn()).is_none());
        assert_eq!(builder.frame().axes[1], 1.0);

        builder.process_event(&make_key_event(Key::BTN_SOUTH, true));
        let frame = builder.process_event(&make_syn()).unwrap();
        assert_eq!(frame.axes[1], 1.0);
        assert!(frame.buttons[0]);
    }

    #[test]
    fn test_reset() {
        let mut builder = gamepad();
        builder.process_event(&make_axis_event(AbsoluteAxisType::ABS_X, 1000));
        builder.process_event(&make_key_event(Key::BTN_EAST, true));
        builder.reset();
        assert!(builder.frame().axes.iter().all(|&v| v == 0.0));
        assert!(builder.frame().buttons.iter().all(|&b| !b));
        assert!(builder.process_event(&make_syn()).is_none());
    }
}
