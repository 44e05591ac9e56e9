//! ucr-logging: NDJSON events for corpus runs.
//!
//! Append-only, one JSON object per line, so a crashed run still leaves a
//! readable prefix for post-mortems.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const EV_GRAPH_REPLAYED: &str = "graph_replayed";
pub const EV_GRAPH_SKIPPED: &str = "graph_skipped";
pub const EV_DATASET_WRITTEN: &str = "dataset_written";

pub fn now_ms() -> u64 {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    d.as_millis() as u64
}

pub fn hash_config_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

pub fn try_git_hash() -> Option<String> {
    use std::process::Command;

    let out = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8(out.stdout).ok()?;
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Minimal schema versioning fields carried by every event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionInfoV1 {
    pub dataset_version: u32,
    pub input_schema_id: u32,
    pub action_space_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphReplayedEventV1 {
    pub event: String,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub run_id: String,
    pub graph_idx: u64,
    pub graph_id: String,

    pub steps: u32,
    pub tuples: u64,
    pub ambiguous_steps: u32,
    /// Canonical names of types whose oracle tag was ambiguous.
    pub ambiguous_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphSkippedEventV1 {
    pub event: String,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub run_id: String,
    pub graph_idx: u64,
    pub graph_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetWrittenEventV1 {
    pub event: String,
    pub ts_ms: u64,
    pub v: VersionInfoV1,

    pub run_id: String,
    pub path: String,
    pub num_tuples: u64,
    pub num_graphs: u64,
    pub num_skipped: u64,
    pub git_hash: Option<String>,
    pub config_hash: Option<String>,
}

#[derive(Debug)]
pub enum NdjsonError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for NdjsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NdjsonError::Io(e) => write!(f, "io: {e}"),
            NdjsonError::Json(e) => write!(f, "json: {e}"),
        }
    }
}

impl std::error::Error for NdjsonError {}

impl From<io::Error> for NdjsonError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for NdjsonError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Append-only NDJSON writer.
///
/// Contract: each call writes exactly one JSON object followed by a newline.
pub struct NdjsonWriter {
    w: BufWriter<File>,
    lines_since_flush: u64,
    flush_every_lines: u64,
}

impl NdjsonWriter {
    /// Open a file for append. Creates it if it doesn't exist.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self, NdjsonError> {
        Self::open_append_with_flush(path, 0)
    }

    /// `flush_every_lines=0` disables periodic flushing.
    pub fn open_append_with_flush(
        path: impl AsRef<Path>,
        flush_every_lines: u64,
    ) -> Result<Self, NdjsonError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            w: BufWriter::new(f),
            lines_since_flush: 0,
            flush_every_lines,
        })
    }

    pub fn write_event<T: Serialize>(&mut self, event: &T) -> Result<(), NdjsonError> {
        let mut buf = serde_json::to_vec(event)?;
        buf.push(b'\n');
        self.w.write_all(&buf)?;
        self.lines_since_flush += 1;
        if self.flush_every_lines > 0 && self.lines_since_flush >= self.flush_every_lines {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), NdjsonError> {
        self.w.flush()?;
        self.lines_since_flush = 0;
        Ok(())
    }
}

/// Read every parseable line of an NDJSON file, skipping a torn trailing line.
pub fn read_ndjson_lenient(path: impl AsRef<Path>) -> Result<Vec<serde_json::Value>, NdjsonError> {
    let s = std::fs::read_to_string(path)?;
    Ok(s.lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn v() -> VersionInfoV1 {
        VersionInfoV1 {
            dataset_version: 1,
            input_schema_id: 1,
            action_space_id: "ucca_tupa_v88".to_string(),
        }
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn writes_one_valid_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut w = NdjsonWriter::open_append(&path).unwrap();

        for i in 0..2u64 {
            w.write_event(&GraphSkippedEventV1 {
                event: EV_GRAPH_SKIPPED.to_string(),
                ts_ms: now_ms(),
                v: v(),
                run_id: "r".to_string(),
                graph_idx: i,
                graph_id: format!("g{i}"),
                reason: "oracle exhausted".to_string(),
            })
            .unwrap();
        }
        w.flush().unwrap();

        let vals = read_ndjson_lenient(&path).unwrap();
        assert_eq!(vals.len(), 2);
        assert_eq!(vals[0]["event"], EV_GRAPH_SKIPPED);
        assert_eq!(vals[1]["graph_id"], "g1");
        assert_eq!(vals[1]["v"]["action_space_id"], "ucca_tupa_v88");
    }

    #[test]
    fn lenient_reader_tolerates_trailing_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.ndjson");

        {
            let mut w = NdjsonWriter::open_append(&path).unwrap();
            w.write_event(&serde_json::json!({"event": "e", "x": 1}))
                .unwrap();
            w.flush().unwrap();
        }

        // Simulate crash: append a partial JSON line (no newline, invalid JSON).
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        f.write_all(br#"{"event":"e","x":"#).unwrap();
        f.flush().unwrap();

        let vals = read_ndjson_lenient(&path).unwrap();
        assert_eq!(vals.len(), 1);
        assert_eq!(vals[0]["x"], 1);
    }

    #[test]
    fn periodic_flush_makes_lines_visible() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.ndjson");
        let mut w = NdjsonWriter::open_append_with_flush(&path, 1).unwrap();
        w.write_event(&serde_json::json!({"event": "e"})).unwrap();
        // No explicit flush: the writer flushed after one line.
        let s = fs::read_to_string(&path).unwrap();
        assert_eq!(s.lines().count(), 1);
    }

    #[test]
    fn config_hash_is_stable_hex() {
        let a = hash_config_bytes(b"replay:\n  max_steps: 5\n");
        let b = hash_config_bytes(b"replay:\n  max_steps: 5\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, hash_config_bytes(b"{}"));
    }
}
