//! Telemetry storage for sync decisions.
use std::{
    collections::VecDeque,
    fs::{create_dir_all, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use bevy::{log::warn, prelude::*};
use serde::Serialize;

use super::events::SyncDiagnostic;

const DEFAULT_SYNC_TELEMETRY_CAPACITY: usize = 128;

/// Rolling window of recent sync decisions.
#[derive(Resource, Debug)]
pub struct SyncTelemetry {
    capacity: usize,
    records: VecDeque<SyncTelemetryRecord>,
}

impl SyncTelemetry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            records: VecDeque::new(),
        }
    }

    pub fn push(&mut self, record: SyncTelemetryRecord) {
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn records(&self) -> impl Iterator<Item = &SyncTelemetryRecord> {
        self.records.iter()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for SyncTelemetry {
    fn default() -> Self {
        Self::new(DEFAULT_SYNC_TELEMETRY_CAPACITY)
    }
}

/// Single telemetry entry.
#[derive(Debug, Clone, Serialize)]
pub struct SyncTelemetryRecord {
    pub occurred_at_seconds: f64,
    pub event: SyncDiagnostic,
}

/// Records every diagnostic emitted this frame and mirrors it to the log.
pub fn record_sync_telemetry(
    time: Res<Time>,
    mut telemetry: ResMut<SyncTelemetry>,
    mut diagnostics: MessageReader<SyncDiagnostic>,
    mut log: ResMut<SyncTelemetryLog>,
) {
    let now = time.elapsed_secs_f64();

    for diagnostic in diagnostics.read() {
        debug!(target: "scene_sync", "diagnostic {}: {:?}", diagnostic.label(), diagnostic);
        let record = SyncTelemetryRecord {
            occurred_at_seconds: now,
            event: diagnostic.clone(),
        };
        log.push(&record);
        telemetry.push(record);
    }
}

/// Append-only JSON-lines log of sync decisions. Without a path records are discarded.
/// While the file cannot be written, at most `capacity` records wait; older ones are dropped.
#[derive(Resource, Debug)]
pub struct SyncTelemetryLog {
    output_path: Option<PathBuf>,
    capacity: usize,
    pending: VecDeque<SyncTelemetryRecord>,
}

impl SyncTelemetryLog {
    pub fn new(path: Option<PathBuf>, capacity: usize) -> Self {
        Self {
            output_path: path,
            capacity: capacity.max(1),
            pending: VecDeque::new(),
        }
    }

    pub fn push(&mut self, record: &SyncTelemetryRecord) {
        if self.output_path.is_none() {
            return;
        }
        while self.pending.len() >= self.capacity {
            self.pending.pop_front();
        }
        self.pending.push_back(record.clone());
    }

    fn drain_pending(&mut self) -> VecDeque<SyncTelemetryRecord> {
        std::mem::take(&mut self.pending)
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let Some(path) = self.output_path.clone() else {
            self.pending.clear();
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;

        for record in self.drain_pending() {
            serde_json::to_writer(&mut file, &record)?;
            file.write_all(b"\n")?;
        }

        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }
}

/// Flushes pending telemetry log entries to disk, logging a warning if persistence fails.
pub fn flush_sync_telemetry_log(mut log: ResMut<SyncTelemetryLog>) {
    if let Err(err) = log.flush() {
        warn!(
            "Failed to persist sync telemetry to {:?}: {}",
            log.path(),
            err
        );
    }
}
