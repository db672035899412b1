//! # Serial Command Sink
//!
//! Sends velocity commands to the base controller over a USB/UART serial link,
//! one JSON line per command, 8N1 with no flow control.

use async_trait::async_trait;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use super::codec::encode_command;
use super::port::{BaseLink, SerialLink};
use super::CommandSink;
use crate::error::{Result, TeleopError};
use crate::teleop::frame::VelocityCommand;

/// Serial link to the base controller
pub struct SerialSink<L: BaseLink = SerialLink> {
    link: L,
    device_path: String,
}

impl<L: BaseLink> std::fmt::Debug for SerialSink<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSink")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialSink<SerialLink> {
    /// Open the serial port at `path`
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Serial` error if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::sink::serial::SerialSink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let sink = SerialSink::open("/dev/ttyUSB0", 115200)?;
    ///     println!("Connected to: {}", sink.device_path());
    ///     Ok(())
    /// }
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let stream = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TeleopError::Serial(format!("Failed to open {}: {}", path, e)))?;

        info!("Opened base serial link at {} ({} baud)", path, baud_rate);
        Ok(Self::with_link(SerialLink::new(stream), path))
    }
}

impl<L: BaseLink> SerialSink<L> {
    /// Wrap an already-open link
    pub fn with_link(link: L, device_path: &str) -> Self {
        Self {
            link,
            device_path: device_path.to_string(),
        }
    }

    /// Get the device path of the serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl<L: BaseLink> CommandSink for SerialSink<L> {
    async fn publish(&mut self, command: &VelocityCommand) -> Result<()> {
        let line = encode_command(command)?;

        self.link
            .send_line(&line)
            .await
            .map_err(|e| TeleopError::Serial(format!("Failed to write command: {}", e)))?;

        self.link
            .flush()
            .await
            .map_err(|e| TeleopError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent command ({} bytes) to {}", line.len(), self.device_path);
        Ok(())
    }
}
