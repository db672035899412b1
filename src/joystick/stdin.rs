//! # Line Frame Reader
//!
//! Reads frames encoded as JSON lines, e.g. piped from a recorded session or
//! another joystick driver:
//!
//! ```text
//! {"axes":[0.0,0.5,0.0,0.0],"buttons":[1,0,0,0]}
//! ```
//!
//! Malformed lines are logged and skipped; blank lines are ignored.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::teleop::frame::InputFrame;

/// Forward every frame read from `reader` into `tx`.
///
/// Returns the number of frames forwarded once the reader reaches EOF or the
/// receiver is dropped.
///
/// # Errors
///
/// Returns `Io` if reading from `reader` fails.
pub async fn read_frames<R>(reader: R, tx: mpsc::Sender<InputFrame>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0u64;
    let mut line_number = 0u64;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<InputFrame>(line) {
            Ok(frame) => {
                if tx.send(frame).await.is_err() {
                    debug!("Frame receiver dropped, line reader exiting");
                    break;
                }
                forwarded += 1;
            }
            Err(e) => warn!("Skipping malformed frame on line {}: {}", line_number, e),
        }
    }

    Ok(forwarded)
}
