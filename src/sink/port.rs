//! Byte link to the base controller, abstracted so the serial sink can be
//! tested without hardware.

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio_serial::SerialStream;

/// Outgoing half of a link to the base controller
#[async_trait]
pub trait BaseLink: Send {
    /// Queue one encoded command line
    async fn send_line(&mut self, line: &[u8]) -> io::Result<()>;

    /// Push queued lines out to the device
    async fn flush(&mut self) -> io::Result<()>;
}

/// Link over a `tokio-serial` stream
pub struct SerialLink {
    stream: SerialStream,
}

impl SerialLink {
    pub fn new(stream: SerialStream) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl BaseLink for SerialLink {
    async fn send_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.stream.write_all(line).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct LinkState {
        lines: Vec<Vec<u8>>,
        failure: Option<io::ErrorKind>,
        flushes: usize,
    }

    /// In-memory link; clones share state so tests can inspect what the sink sent
    #[derive(Clone, Default)]
    pub struct MockLink {
        state: Arc<Mutex<LinkState>>,
    }

    impl MockLink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every line sent so far, in order
        pub fn lines(&self) -> Vec<Vec<u8>> {
            self.state.lock().unwrap().lines.clone()
        }

        /// Make every following `send_line` fail with `kind`
        pub fn fail_sends(&self, kind: io::ErrorKind) {
            self.state.lock().unwrap().failure = Some(kind);
        }

        pub fn recover(&self) {
            self.state.lock().unwrap().failure = None;
        }

        pub fn flushes(&self) -> usize {
            self.state.lock().unwrap().flushes
        }
    }

    #[async_trait]
    impl BaseLink for MockLink {
        async fn send_line(&mut self, line: &[u8]) -> io::Result<()> {
            let mut state = self.state.lock().unwrap();
            if let Some(kind) = state.failure {
                return Err(io::Error::new(kind, "link unavailable"));
            }
            state.lines.push(line.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> io::Result<()> {
            self.state.lock().unwrap().flushes += 1;
            Ok(())
        }
    }
}
