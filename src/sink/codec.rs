//! # Command Line Codec
//!
//! Velocity commands go out as one JSON object per line:
//!
//! ```text
//! {"linear_x":0.25,"linear_y":-0.25,"angular_z":0.5}
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Result;
use crate::teleop::frame::VelocityCommand;

/// Typical encoded size; avoids regrowing the buffer for ordinary values.
const LINE_CAPACITY: usize = 96;

/// Encodes a command as a newline-terminated JSON line.
///
/// # Examples
///
/// ```
/// use joy_teleop::sink::codec::encode_command;
/// use joy_teleop::teleop::frame::VelocityCommand;
///
/// let line = encode_command(&VelocityCommand::new(0.25, -0.25, 0.5))?;
/// assert_eq!(&line[..], b"{\"linear_x\":0.25,\"linear_y\":-0.25,\"angular_z\":0.5}\n");
/// # Ok::<(), joy_teleop::error::TeleopError>(())
/// ```
pub fn encode_command(command: &VelocityCommand) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(LINE_CAPACITY).writer();
    serde_json::to_writer(&mut buf, command)?;
    let mut buf = buf.into_inner();
    buf.put_u8(b'\n');
    Ok(buf.freeze())
}

/// Decodes one line produced by [`encode_command`].
///
/// Trailing whitespace (including the newline) is ignored.
pub fn decode_command(line: &[u8]) -> Result<VelocityCommand> {
    Ok(serde_json::from_slice(line)?)
}
