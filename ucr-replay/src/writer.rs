use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ucr_core::{ActionEncoding, ACTION_SPACE_ID, V};
use ucr_features::{Observation, INPUT_SCHEMA_ID};

use crate::schema::{ARCHIVE_SUFFIX, DATASET_VERSION, F_OBS, F_REWARD, META_SUFFIX};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid dataset config: {0}")]
    InvalidConfig(&'static str),
    #[error("tuple {index}: non-finite {field} value {value}")]
    NonFinite {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

/// One training record: pre-transition observation, encoded action, reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingTuple {
    pub obs: Observation,
    pub act: ActionEncoding,
    pub r: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMeta {
    pub dataset_version: u32,
    pub action_space_id: String,
    pub vocab_size: usize,
    pub input_schema_id: u32,
    /// Observation length of the first tuple (None for an empty dataset).
    pub obs_len: Option<usize>,

    pub num_tuples: usize,
    pub num_graphs: usize,
    pub num_skipped: usize,

    pub git_hash: Option<String>,
    pub config_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatasetWriterConfig {
    /// Archive path; should end in `.json.gz`.
    pub out_path: PathBuf,
    pub compression_level: u32,
    pub git_hash: Option<String>,
    pub config_hash: Option<String>,
}

impl DatasetWriterConfig {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            compression_level: 6,
            git_hash: None,
            config_hash: None,
        }
    }
}

/// Append-only accumulator for a whole corpus run.
///
/// Nothing is written until `finish`; the archive and its meta sidecar are then
/// written once, each through a tmp file + rename.
pub struct DatasetWriter {
    cfg: DatasetWriterConfig,
    tuples: Vec<TrainingTuple>,
    num_graphs: usize,
    num_skipped: usize,
}

impl DatasetWriter {
    pub fn new(cfg: DatasetWriterConfig) -> Result<Self, DatasetError> {
        if cfg.compression_level > 9 {
            return Err(DatasetError::InvalidConfig("compression_level must be 0..=9"));
        }
        if cfg.out_path.file_name().is_none() {
            return Err(DatasetError::InvalidConfig("out_path has no file name"));
        }
        Ok(Self {
            cfg,
            tuples: Vec::new(),
            num_graphs: 0,
            num_skipped: 0,
        })
    }

    pub fn push(&mut self, t: TrainingTuple) {
        self.tuples.push(t);
    }

    pub fn extend<I: IntoIterator<Item = TrainingTuple>>(&mut self, it: I) {
        self.tuples.extend(it);
    }

    /// Append one graph's tuples, preserving their order.
    pub fn append_graph(&mut self, mut shard: Vec<TrainingTuple>) {
        self.tuples.append(&mut shard);
        self.num_graphs += 1;
    }

    pub fn record_skipped(&mut self) {
        self.num_skipped += 1;
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn tuples(&self) -> &[TrainingTuple] {
        &self.tuples
    }

    pub fn out_path(&self) -> &Path {
        &self.cfg.out_path
    }

    /// First tuple holding a NaN or infinity, which JSON cannot carry.
    pub fn check_finite(&self) -> Result<(), DatasetError> {
        for (index, t) in self.tuples.iter().enumerate() {
            if let Some(&value) = t.obs.iter().find(|v| !v.is_finite()) {
                return Err(DatasetError::NonFinite {
                    index,
                    field: F_OBS,
                    value,
                });
            }
            if !t.r.is_finite() {
                return Err(DatasetError::NonFinite {
                    index,
                    field: F_REWARD,
                    value: t.r,
                });
            }
        }
        Ok(())
    }

    /// Write archive + meta. Fails before touching disk if any value is non-finite.
    pub fn finish(self) -> Result<DatasetMeta, DatasetError> {
        self.check_finite()?;
        let out = &self.cfg.out_path;
        if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp = tmp_path(out);
        {
            let f = File::create(&tmp)?;
            let mut enc = GzEncoder::new(
                BufWriter::new(f),
                Compression::new(self.cfg.compression_level),
            );
            serde_json::to_writer(&mut enc, &self.tuples)?;
            let mut w = enc.finish()?;
            w.flush()?;
        }
        fs::rename(&tmp, out)?;

        let meta = DatasetMeta {
            dataset_version: DATASET_VERSION,
            action_space_id: ACTION_SPACE_ID.to_string(),
            vocab_size: V,
            input_schema_id: INPUT_SCHEMA_ID,
            obs_len: self.tuples.first().map(|t| t.obs.len()),
            num_tuples: self.tuples.len(),
            num_graphs: self.num_graphs,
            num_skipped: self.num_skipped,
            git_hash: self.cfg.git_hash.clone(),
            config_hash: self.cfg.config_hash.clone(),
        };
        let final_meta = meta_path(out);
        let tmp_meta = tmp_path(&final_meta);
        fs::write(&tmp_meta, serde_json::to_vec_pretty(&meta)?)?;
        fs::rename(&tmp_meta, &final_meta)?;

        Ok(meta)
    }
}

/// Sidecar path for an archive: `x.json.gz` -> `x.meta.json`.
pub fn meta_path(archive: &Path) -> PathBuf {
    let name = archive
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let stem = name.strip_suffix(ARCHIVE_SUFFIX).unwrap_or(name);
    archive.with_file_name(format!("{stem}{META_SUFFIX}"))
}

fn tmp_path(p: &Path) -> PathBuf {
    let name = p
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    p.with_file_name(format!("{name}.tmp"))
}

pub fn read_dataset(path: impl AsRef<Path>) -> Result<Vec<TrainingTuple>, DatasetError> {
    let f = File::open(path)?;
    let dec = GzDecoder::new(BufReader::new(f));
    Ok(serde_json::from_reader(BufReader::new(dec))?)
}

pub fn read_meta(archive: impl AsRef<Path>) -> Result<DatasetMeta, DatasetError> {
    let bytes = fs::read(meta_path(archive.as_ref()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Remove `*.tmp` leftovers of an interrupted `finish` in `dir`.
pub fn cleanup_tmp_files(dir: &Path) -> Result<(), DatasetError> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let e = entry?;
        let p = e.path();
        if let Some(name) = p.file_name().and_then(|s| s.to_str()) {
            if name.ends_with(".json.gz.tmp") || name.ends_with(".meta.json.tmp") {
                let _ = fs::remove_file(&p);
            }
        }
    }
    Ok(())
}
