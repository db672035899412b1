//! # Runtime Loop
//!
//! Drives the controller: one frame in, one command out, in arrival order.
//!
//! Frames arrive on an mpsc channel fed by the joystick reader. Every command
//! is published to the sink and, when enabled, recorded. When the channel
//! closes or shutdown is requested a final zero command is published so the
//! platform is never left moving.

use std::future::Future;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::sink::CommandSink;
use crate::telemetry::CommandRecorder;
use crate::teleop::composer::Mode;
use crate::teleop::controller::TeleopController;
use crate::teleop::frame::{InputFrame, VelocityCommand};

/// Counters collected over one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Frames processed
    pub frames: u64,
    /// Commands delivered to the sink
    pub published: u64,
    /// Commands the sink rejected
    pub publish_failures: u64,
    /// Commands the recorder failed to write
    pub record_failures: u64,
}

/// Process frames until the channel closes or `shutdown` resolves
///
/// Sink and recorder failures are logged and counted, never fatal.
pub async fn run<S, F>(
    controller: &mut TeleopController,
    frames: &mut mpsc::Receiver<InputFrame>,
    sink: &mut S,
    mut recorder: Option<&mut CommandRecorder>,
    shutdown: F,
) -> RunStats
where
    S: CommandSink + ?Sized,
    F: Future<Output = ()>,
{
    let mut stats = RunStats::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested, stopping the platform");
                break;
            }

            frame = frames.recv() => match frame {
                Some(frame) => {
                    let command = controller.process(&frame, Instant::now());
                    stats.frames += 1;
                    emit(
                        sink,
                        recorder.as_deref_mut(),
                        controller.mode(),
                        controller.scale(),
                        &command,
                        &mut stats,
                    )
                    .await;
                }
                None => {
                    info!("Input stream closed, stopping the platform");
                    break;
                }
            }
        }
    }

    let stop = controller.stop();
    emit(
        sink,
        recorder.as_deref_mut(),
        Mode::Idle,
        controller.scale(),
        &stop,
        &mut stats,
    )
    .await;

    stats
}

async fn emit<S: CommandSink + ?Sized>(
    sink: &mut S,
    recorder: Option<&mut CommandRecorder>,
    mode: Mode,
    scale: f64,
    command: &VelocityCommand,
    stats: &mut RunStats,
) {
    match sink.publish(command).await {
        Ok(()) => stats.published += 1,
        Err(e) => {
            stats.publish_failures += 1;
            warn!("Failed to publish command: {}", e);
        }
    }

    if let Some(recorder) = recorder {
        if let Err(e) = recorder.record(mode, scale, command) {
            stats.record_failures += 1;
            debug!("Failed to record command: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;
    use crate::error::TeleopError;
    use crate::sink::{MockCommandSink, WriterSink};
    use crate::sink::codec::decode_command;
    use crate::teleop::composer::CommandComposer;
    use crate::teleop::mapping::{Axis, AxisMapping, ButtonMapping};
    use crate::teleop::scaler::VelocityScaler;
    use std::time::Duration;
    use tempfile::TempDir;

    fn create_controller() -> TeleopController {
        TeleopController::new(
            ButtonMapping::from_raw(0, 1, 2),
            CommandComposer::new(
                AxisMapping::new().with(Axis::X, 0).with(Axis::Y, 1),
                AxisMapping::new().with(Axis::Z, 2),
            ),
            VelocityScaler::new(0.5, 0.1, 1.0, Duration::from_millis(500)).unwrap(),
        )
    }

    fn held(x: f64) -> InputFrame {
        InputFrame::new(vec![x, 0.0, 0.0], vec![true, false, false])
    }

    fn released(x: f64) -> InputFrame {
        InputFrame::new(vec![x, 0.0, 0.0], vec![false, false, false])
    }

    fn published_lines(out: &[u8]) -> Vec<VelocityCommand> {
        out.split(|&b| b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| decode_command(line).unwrap())
            .collect()
    }

    // ==================== Stream Tests ====================

    #[tokio::test]
    async fn test_one_command_per_frame_then_stop() {
        let mut controller = create_controller();
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(held(1.0)).await.unwrap();
        tx.send(released(1.0)).await.unwrap();
        tx.send(held(-0.5)).await.unwrap();
        drop(tx);

        let mut sink = WriterSink::new(Vec::<u8>::new());
        let stats = run(&mut controller, &mut rx, &mut sink, None, std::future::pending()).await;

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.published, 4);
        assert_eq!(stats.publish_failures, 0);

        let commands = published_lines(&sink.into_inner());
        assert_eq!(
            commands,
            vec![
                VelocityCommand::new(0.5, 0.0, 0.0),
                VelocityCommand::ZERO,
                VelocityCommand::new(-0.25, 0.0, 0.0),
                VelocityCommand::ZERO,
            ]
        );
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[tokio::test]
    async fn test_empty_stream_still_stops() {
        let mut controller = create_controller();
        let (tx, mut rx) = mpsc::channel::<InputFrame>(1);
        drop(tx);

        let mut sink = WriterSink::new(Vec::<u8>::new());
        let stats = run(&mut controller, &mut rx, &mut sink, None, std::future::pending()).await;

        assert_eq!(stats.frames, 0);
        assert_eq!(published_lines(&sink.into_inner()), vec![VelocityCommand::ZERO]);
    }

    #[tokio::test]
    async fn test_shutdown_wins_over_pending_frames() {
        let mut controller = create_controller();
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(held(1.0)).await.unwrap();

        let mut sink = WriterSink::new(Vec::<u8>::new());
        let stats = run(&mut controller, &mut rx, &mut sink, None, std::future::ready(())).await;

        assert_eq!(stats.frames, 0);
        assert_eq!(published_lines(&sink.into_inner()), vec![VelocityCommand::ZERO]);
        drop(tx);
    }

    // ==================== Sink Failure Tests ====================

    #[tokio::test]
    async fn test_publish_failures_are_not_fatal() {
        let mut controller = create_controller();
        let (tx, mut rx) = mpsc::channel(8);
        for _ in 0..3 {
            tx.send(held(1.0)).await.unwrap();
        }
        drop(tx);

        let mut sink = MockCommandSink::new();
        sink.expect_publish()
            .times(4)
            .returning(|_| Err(TeleopError::Serial("link down".to_string())));

        let stats = run(&mut controller, &mut rx, &mut sink, None, std::future::pending()).await;

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.published, 0);
        assert_eq!(stats.publish_failures, 4);
    }

    #[tokio::test]
    async fn test_boxed_sink() {
        let mut controller = create_controller();
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(held(0.5)).await.unwrap();
        drop(tx);

        let mut mock = MockCommandSink::new();
        mock.expect_publish()
            .withf(|command| command.linear_x == 0.25)
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_publish()
            .withf(|command| command.is_zero())
            .times(1)
            .returning(|_| Ok(()));

        let mut sink: Box<dyn CommandSink> = Box::new(mock);
        let stats = run(&mut controller, &mut rx, &mut sink, None, std::future::pending()).await;
        assert_eq!(stats.published, 2);
    }

    // ==================== Recorder Tests ====================

    #[tokio::test]
    async fn test_every_command_is_recorded() {
        let tmp = TempDir::new().unwrap();
        let mut recorder = CommandRecorder::new(&TelemetryConfig {
            enabled: true,
            log_dir: tmp.path().to_string_lossy().to_string(),
            max_records_per_file: 100,
            max_files_to_keep: 2,
        })
        .unwrap();

        let mut controller = create_controller();
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(held(1.0)).await.unwrap();
        tx.send(released(0.0)).await.unwrap();
        drop(tx);

        let mut sink = WriterSink::new(Vec::<u8>::new());
        let stats = run(
            &mut controller,
            &mut rx,
            &mut sink,
            Some(&mut recorder),
            std::future::pending(),
        )
        .await;

        assert_eq!(stats.record_failures, 0);
        assert_eq!(recorder.records_written(), 3);
    }
}
