//! # Command Sink Module
//!
//! Delivers velocity commands to the platform.
//!
//! This module handles:
//! - The [`CommandSink`] seam used by the runtime loop
//! - Encoding commands as JSON lines
//! - Writing them to stdout (or any async writer)
//! - Writing them to the base controller over serial

pub mod codec;
pub mod port;
pub mod serial;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::Result;
use crate::teleop::frame::VelocityCommand;
use codec::encode_command;

pub use serial::SerialSink;

/// Destination for velocity commands
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandSink: Send {
    /// Deliver one command
    async fn publish(&mut self, command: &VelocityCommand) -> Result<()>;
}

#[async_trait]
impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    async fn publish(&mut self, command: &VelocityCommand) -> Result<()> {
        (**self).publish(command).await
    }
}

/// Writes JSON-line commands to an async writer
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

/// Sink writing to the process's stdout
pub type StdoutSink = WriterSink<tokio::io::Stdout>;

impl StdoutSink {
    /// Sink on stdout. Logging must go elsewhere (stderr) to keep the stream clean.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> CommandSink for WriterSink<W> {
    async fn publish(&mut self, command: &VelocityCommand) -> Result<()> {
        let line = encode_command(command)?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codec::decode_command;

    #[tokio::test]
    async fn test_writer_sink_lines() {
        let mut sink = WriterSink::new(Vec::<u8>::new());
        sink.publish(&VelocityCommand::new(0.5, 0.0, -0.5)).await.unwrap();
        sink.publish(&VelocityCommand::ZERO).await.unwrap();

        let out = sink.into_inner();
        let lines: Vec<&[u8]> = out.split(|&b| b == b'\n').filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(decode_command(lines[0]).unwrap(), VelocityCommand::new(0.5, 0.0, -0.5));
        assert!(decode_command(lines[1]).unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_boxed_sink_forwards() {
        let mut inner = MockCommandSink::new();
        inner
            .expect_publish()
            .withf(|command| command.linear_x == 1.0)
            .times(1)
            .returning(|_| Ok(()));

        let mut boxed: Box<dyn CommandSink> = Box::new(inner);
        boxed.publish(&VelocityCommand::new(1.0, 0.0, 0.0)).await.unwrap();
    }
}
