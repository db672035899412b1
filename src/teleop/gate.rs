//! # Deadman Gate
//!
//! Motion is only commanded while the enable button is held. Anything else,
//! including an unassigned or out-of-range enable index, keeps the gate closed.

use super::frame::InputFrame;
use super::mapping::ButtonMapping;

/// Returns true if the deadman button is assigned, present in the frame and held.
///
/// # Examples
///
/// ```
/// use joy_teleop::teleop::frame::InputFrame;
/// use joy_teleop::teleop::gate;
/// use joy_teleop::teleop::mapping::ButtonMapping;
///
/// let buttons = ButtonMapping::from_raw(1, -1, -1);
/// assert!(gate::is_open(&InputFrame::new(vec![], vec![false, true]), &buttons));
/// assert!(!gate::is_open(&InputFrame::new(vec![], vec![true, false]), &buttons));
/// assert!(!gate::is_open(&InputFrame::new(vec![], vec![true]), &buttons));
/// ```
#[must_use]
pub fn is_open(frame: &InputFrame, buttons: &ButtonMapping) -> bool {
    frame.is_pressed(buttons.enable_move)
}
