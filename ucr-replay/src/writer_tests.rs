use std::fs;

use serde_json::Value;
use ucr_core::{ActionEncoding, V};

use crate::schema::{F_ACT, F_OBS, F_REWARD};
use crate::{
    cleanup_tmp_files, meta_path, read_dataset, read_meta, DatasetError, DatasetWriter,
    DatasetWriterConfig, TrainingTuple,
};

fn tuple(obs: Vec<f64>, r: f64) -> TrainingTuple {
    TrainingTuple {
        obs,
        act: ActionEncoding::new(3, 1, 14),
        r,
    }
}

#[test]
fn dataset_roundtrips_losslessly() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("data").join("train.json.gz");
    let mut w = DatasetWriter::new(DatasetWriterConfig::new(&out)).unwrap();

    let tricky = vec![0.1 + 0.2, 1e-300, -2.5e17, std::f64::consts::PI, 7.0];
    w.append_graph(vec![tuple(tricky.clone(), 0.5), tuple(vec![1.0; 5], 1.0)]);
    w.push(tuple(vec![0.0; 5], 0.0));
    w.record_skipped();
    assert_eq!(w.len(), 3);

    let expected = w.tuples().to_vec();
    let meta = w.finish().unwrap();

    let back = read_dataset(&out).unwrap();
    assert_eq!(back, expected);
    for (a, b) in back[0].obs.iter().zip(&tricky) {
        assert_eq!(a.to_bits(), b.to_bits());
    }

    assert_eq!(meta.num_tuples, 3);
    assert_eq!(meta.num_graphs, 1);
    assert_eq!(meta.num_skipped, 1);
    assert_eq!(meta.obs_len, Some(5));
    assert_eq!(meta.vocab_size, V);
    assert_eq!(read_meta(&out).unwrap(), meta);
}

#[test]
fn archive_is_gzip_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("train.json.gz");
    let mut w = DatasetWriter::new(DatasetWriterConfig::new(&out)).unwrap();
    w.push(tuple(vec![2.0], 1.0));
    w.finish().unwrap();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let mut json = String::new();
    use std::io::Read;
    flate2::read::GzDecoder::new(&bytes[..])
        .read_to_string(&mut json)
        .unwrap();
    let v: Value = serde_json::from_str(&json).unwrap();
    let rec = &v.as_array().unwrap()[0];
    assert_eq!(rec[F_OBS], serde_json::json!([2.0]));
    assert_eq!(rec[F_ACT]["type10"], 3);
    assert_eq!(rec[F_ACT]["hasLabel"], 1);
    assert_eq!(rec[F_ACT]["label14"], 14);
    assert_eq!(rec[F_REWARD], 1.0);
}

#[test]
fn finish_leaves_no_tmp_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("train.json.gz");
    let w = DatasetWriter::new(DatasetWriterConfig::new(&out)).unwrap();
    let meta = w.finish().unwrap();
    assert_eq!(meta.num_tuples, 0);
    assert_eq!(meta.obs_len, None);

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.contains(&"train.json.gz".to_string()));
    assert!(names.contains(&"train.meta.json".to_string()));
    assert!(names.iter().all(|n| !n.ends_with(".tmp")));
    assert!(read_dataset(&out).unwrap().is_empty());
}

#[test]
fn meta_path_replaces_archive_suffix() {
    let p = std::path::Path::new("out/env_training_data.json.gz");
    assert_eq!(meta_path(p), std::path::Path::new("out/env_training_data.meta.json"));
    let q = std::path::Path::new("out/data.bin");
    assert_eq!(meta_path(q), std::path::Path::new("out/data.bin.meta.json"));
}

#[test]
fn invalid_compression_level_rejected() {
    let mut cfg = DatasetWriterConfig::new("x.json.gz");
    cfg.compression_level = 12;
    assert!(matches!(
        DatasetWriter::new(cfg),
        Err(DatasetError::InvalidConfig(_))
    ));
}

#[test]
fn write_into_missing_parent_under_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"not a dir").unwrap();
    let out = blocker.join("train.json.gz");
    let w = DatasetWriter::new(DatasetWriterConfig::new(&out)).unwrap();
    assert!(matches!(w.finish(), Err(DatasetError::Io(_))));
}

#[test]
fn cleanup_removes_interrupted_tmp_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("train.json.gz.tmp"), b"partial").unwrap();
    fs::write(dir.path().join("train.meta.json.tmp"), b"{").unwrap();
    fs::write(dir.path().join("keep.json.gz"), b"x").unwrap();
    cleanup_tmp_files(dir.path()).unwrap();
    assert!(!dir.path().join("train.json.gz.tmp").exists());
    assert!(!dir.path().join("train.meta.json.tmp").exists());
    assert!(dir.path().join("keep.json.gz").exists());
}

#[test]
fn non_finite_values_fail_before_anything_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("train.json.gz");

    let mut w = DatasetWriter::new(DatasetWriterConfig::new(&out)).unwrap();
    w.push(tuple(vec![0.0, 1.0], 1.0));
    w.push(tuple(vec![f64::INFINITY, 1.0], 0.5));
    let err = w.finish().unwrap_err();
    assert!(matches!(
        err,
        DatasetError::NonFinite {
            index: 1,
            field: F_OBS,
            ..
        }
    ));
    assert!(!out.exists());
    assert!(!meta_path(&out).exists());

    let mut w = DatasetWriter::new(DatasetWriterConfig::new(&out)).unwrap();
    w.push(tuple(vec![0.0], f64::NAN));
    assert!(matches!(
        w.finish(),
        Err(DatasetError::NonFinite {
            index: 0,
            field: F_REWARD,
            ..
        })
    ));
    assert!(!out.exists());
}
