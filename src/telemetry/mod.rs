//! # Telemetry Module
//!
//! Records every emitted velocity command to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting command records as JSONL (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files
//!
//! ## Record Format
//!
//! ```text
//! {"timestamp":"2026-10-18T09:30:00.123+00:00","sequence":42,"mode":"active","scale":0.5,"linear_x":0.25,"linear_y":0.0,"angular_z":-0.1}
//! ```

use chrono::{Local, Utc};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::teleop::composer::Mode;
use crate::teleop::frame::VelocityCommand;

/// File name prefix for command logs
const FILE_PREFIX: &str = "commands_";

/// File name extension for command logs
const FILE_EXTENSION: &str = "jsonl";

#[derive(Debug, Serialize)]
struct CommandRecord {
    timestamp: String,
    sequence: u64,
    mode: Mode,
    scale: f64,
    #[serde(flatten)]
    command: VelocityCommand,
}

/// Rotating JSONL command recorder
#[derive(Debug)]
pub struct CommandRecorder {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    records_in_file: usize,
    file_index: u64,
    sequence: u64,
}

impl CommandRecorder {
    /// Create a recorder writing under `config.log_dir`
    ///
    /// The directory is created if missing. No file is opened until the first
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created
    pub fn new(config: &TelemetryConfig) -> Result<Self> {
        let dir = PathBuf::from(&config.log_dir);
        fs::create_dir_all(&dir)?;
        info!("Recording commands under {}", dir.display());

        Ok(Self {
            dir,
            max_records_per_file: config.max_records_per_file.max(1),
            max_files_to_keep: config.max_files_to_keep.max(1),
            writer: None,
            records_in_file: 0,
            file_index: 0,
            sequence: 0,
        })
    }

    /// Append one command record, rotating files as needed
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Encoding` errors from writing the record
    pub fn record(&mut self, mode: Mode, scale: f64, command: &VelocityCommand) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        let record = CommandRecord {
            timestamp: Utc::now().to_rfc3339(),
            sequence: self.sequence,
            mode,
            scale,
            command: *command,
        };

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        self.records_in_file += 1;
        self.sequence += 1;
        Ok(())
    }

    /// Number of records written since creation
    pub fn records_written(&self) -> u64 {
        self.sequence
    }

    /// Directory the recorder writes to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Close the current file and open the next one
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}.{}",
            FILE_PREFIX,
            Local::now().format("%Y%m%d_%H%M%S"),
            self.file_index,
            FILE_EXTENSION
        );
        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!("Opened command log {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.records_in_file = 0;
        self.file_index += 1;

        self.prune();
        Ok(())
    }

    /// Delete the oldest log files beyond `max_files_to_keep`
    fn prune(&self) {
        let mut files = match list_log_files(&self.dir) {
            Ok(files) => files,
            Err(e) => {
                warn!("Could not list command logs in {}: {}", self.dir.display(), e);
                return;
            }
        };

        if files.len() <= self.max_files_to_keep {
            return;
        }

        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for old in files.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&old) {
                warn!("Could not remove old command log {}: {}", old.display(), e);
            }
        }
    }
}

/// Command log files in `dir`
fn list_log_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with(FILE_PREFIX))
            .unwrap_or(false)
            && path.extension().map(|ext| ext == FILE_EXTENSION).unwrap_or(false);
        if is_log {
            files.push(path);
        }
    }
    Ok(files)
}
