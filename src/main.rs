//! # Joy Teleop
//!
//! Drive an omnidirectional platform from a joystick.
//!
//! Reads joystick frames (evdev or JSON lines on stdin), turns each one into a
//! velocity command and publishes it as a JSON line on stdout or over a serial
//! link to the base controller.
//!
//! # Usage
//!
//! ```bash
//! joy-teleop [CONFIG]          # defaults to config/default.toml
//! joy-teleop --help
//! RUST_LOG=debug joy-teleop    # log every command
//! ```
//!
//! Logs always go to stderr so stdout carries nothing but commands.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use joy_teleop::config::{Config, InputSource, OutputSink, TelemetryConfig};
use joy_teleop::joystick::{read_frames, Deadzone, JoystickDevice};
use joy_teleop::runtime;
use joy_teleop::sink::{CommandSink, SerialSink, StdoutSink};
use joy_teleop::telemetry::CommandRecorder;
use joy_teleop::teleop::{InputFrame, TeleopController};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Application log file name prefix (rotated daily)
const LOG_FILE_PREFIX: &str = "joy-teleop.log";

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

/// Main entry point
///
/// 1. Load configuration and set up logging
/// 2. Build the controller, the input reader and the command sink
/// 3. Process frames until the input ends or Ctrl+C
/// 4. Publish a final zero command and exit
///
/// With `source = "stdin"` the input is meant to be piped; an interactive
/// terminal keeps the process alive after Ctrl+C until the next line arrives.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config;
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let _log_guard = init_logging(&config.telemetry);
    info!("Joy Teleop v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path.display());

    let mut controller = TeleopController::from_config(&config)?;

    let (tx, mut frames) = mpsc::channel(config.input.queue_size);
    spawn_input(&config, tx)?;

    let mut sink: Box<dyn CommandSink> = match config.output.sink {
        OutputSink::Stdout => Box::new(StdoutSink::stdout()),
        OutputSink::Serial => Box::new(
            SerialSink::open(&config.output.serial_port, config.output.baud_rate)
                .context("Failed to open base serial link")?,
        ),
    };

    let mut recorder = if config.telemetry.enabled {
        Some(CommandRecorder::new(&config.telemetry)?)
    } else {
        None
    };

    info!("Teleop running, hold the deadman button to move");
    info!("Press Ctrl+C to exit");

    let stats = runtime::run(
        &mut controller,
        &mut frames,
        &mut sink,
        recorder.as_mut(),
        shutdown_signal(),
    )
    .await;

    info!(
        "Processed {} frames, published {} commands ({} failed)",
        stats.frames, stats.published, stats.publish_failures
    );
    if stats.record_failures > 0 {
        warn!("{} commands could not be recorded", stats.record_failures);
    }

    Ok(())
}

/// Set up stderr logging, plus a daily rolling file when telemetry is enabled
///
/// The returned guard must be held until exit so buffered file logs are flushed.
fn init_logging(telemetry: &TelemetryConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    if telemetry.enabled && !telemetry.log_dir.is_empty() {
        let appender = tracing_appender::rolling::daily(&telemetry.log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        None
    }
}

/// Start the configured frame reader feeding `tx`
fn spawn_input(config: &Config, tx: mpsc::Sender<InputFrame>) -> Result<()> {
    match config.input.source {
        InputSource::Evdev => {
            let device = JoystickDevice::open(
                &config.input.device_path,
                Deadzone::new(config.input.deadzone),
            )
            .context("Failed to open joystick")?;
            info!(
                "Joystick {} at {}",
                device.name().unwrap_or("(unnamed)"),
                device.device_path()
            );

            // evdev reads block; keep them off the runtime
            std::thread::Builder::new()
                .name("joystick".to_string())
                .spawn(move || device.run(tx))
                .context("Failed to start joystick reader")?;
        }
        InputSource::Stdin => {
            info!("Reading frames from stdin");
            tokio::spawn(async move {
                match read_frames(BufReader::new(tokio::io::stdin()), tx).await {
                    Ok(count) => info!("stdin closed after {} frames", count),
                    Err(e) => warn!("Failed to read frames from stdin: {}", e),
                }
            });
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_default() {
        let args = Args::try_parse_from(["joy-teleop"]).unwrap();
        assert_eq!(args.config, PathBuf::from("config/default.toml"));
    }

    #[test]
    fn test_config_path_from_argument() {
        let args = Args::try_parse_from(["joy-teleop", "/etc/joy-teleop.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/joy-teleop.toml"));
    }

    #[test]
    fn test_help_is_not_a_config_path() {
        let err = Args::try_parse_from(["joy-teleop", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = Args::try_parse_from(["joy-teleop", "--confg", "x.toml"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_extra_arguments_rejected() {
        assert!(Args::try_parse_from(["joy-teleop", "a.toml", "b.toml"]).is_err());
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let config = Config::load(DEFAULT_CONFIG_PATH).unwrap();
        assert!(TeleopController::from_config(&config).is_ok());
        assert_eq!(config.output.sink, OutputSink::Stdout);
    }
}
