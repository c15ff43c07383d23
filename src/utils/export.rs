//! CSV export for session statistics.
//!
//! Appends one row per session to a persistent file, writing the header only
//! when the file is new, so repeated runs accumulate into a single table.

use crate::utils::stats::StatsSnapshot;
use csv::WriterBuilder;
use log::info;
use serde::Serialize;
use std::{
    fs::{OpenOptions, create_dir_all},
    io,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

// csv cannot serialize nested structs; keep fields flat.
#[derive(Debug, Serialize)]
struct SessionRow<'a> {
    ended_epoch_ms: u64,
    endpoint: &'a str,
    connect_attempts: u64,
    connections: u64,
    disconnects: u64,
    heartbeat_failures: u64,
    bytes_received: u64,
    frames_decoded: u64,
    frames_overwritten: u64,
    decode_failures: u64,
    frames_taken: u64,
}

impl<'a> SessionRow<'a> {
    fn new(ended_epoch_ms: u64, endpoint: &'a str, s: StatsSnapshot) -> Self {
        Self {
            ended_epoch_ms,
            endpoint,
            connect_attempts: s.connect_attempts,
            connections: s.connections,
            disconnects: s.disconnects,
            heartbeat_failures: s.heartbeat_failures,
            bytes_received: s.bytes_received,
            frames_decoded: s.frames_decoded,
            frames_overwritten: s.frames_overwritten,
            decode_failures: s.decode_failures,
            frames_taken: s.frames_taken,
        }
    }
}

/// Appends `stats` for one session to `path`. Creates parent directories and header as needed.
pub fn export_stats_csv(path: &Path, endpoint: &str, stats: StatsSnapshot) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }

    let file_exists = path.exists() && path.metadata().map(|m| m.len() > 0).unwrap_or(false);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut wtr = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    let ended_epoch_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    wtr.serialize(SessionRow::new(ended_epoch_ms, endpoint, stats))
        .map_err(io::Error::other)?;
    wtr.flush()?;

    info!("[Export] Session stats appended to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_header_written_once() {
        let dir = std::env::temp_dir().join(format!("tm_telemetry_export_{}", std::process::id()));
        let path = dir.join("sessions.csv");
        let _ = fs::remove_file(&path);

        let stats = StatsSnapshot {
            frames_decoded: 10,
            ..StatsSnapshot::default()
        };
        export_stats_csv(&path, "localhost:9000", stats).unwrap();
        export_stats_csv(&path, "localhost:9000", stats).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ended_epoch_ms,endpoint,connect_attempts"));
        assert!(lines[1].contains("localhost:9000"));

        let _ = fs::remove_dir_all(&dir);
    }
}
