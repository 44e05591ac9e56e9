use crate::{Dense, EstimatorError, MlpEstimator, RewardEstimator};

/// 2 -> 2 -> 1: hidden = relu([x0 - x1, x1 - x0]), out = h0 + 2*h1 + 0.5
fn small_mlp() -> MlpEstimator {
    MlpEstimator::new(vec![
        Dense::new(2, 2, vec![1.0, -1.0, -1.0, 1.0], vec![0.0, 0.0]).unwrap(),
        Dense::new(2, 1, vec![1.0, 2.0], vec![0.5]).unwrap(),
    ])
    .unwrap()
}

#[test]
fn forward_applies_relu_on_hidden_layers_only() {
    let m = small_mlp();
    assert_eq!(m.input_len(), Some(2));
    // h = [2, 0] -> 2.5
    assert_eq!(m.evaluate(&[3.0, 1.0]).unwrap(), 2.5);
    // h = [0, 2] -> 4.5
    assert_eq!(m.evaluate(&[1.0, 3.0]).unwrap(), 4.5);
    // Linear output may go negative.
    let neg = MlpEstimator::new(vec![Dense::new(1, 1, vec![-1.0], vec![0.0]).unwrap()]).unwrap();
    assert_eq!(neg.evaluate(&[4.0]).unwrap(), -4.0);
}

#[test]
fn input_length_mismatch_is_reported() {
    let err = small_mlp().evaluate(&[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(
        err,
        EstimatorError::InputLen {
            expected: 2,
            got: 3
        }
    ));
}

#[test]
fn checkpoint_save_then_load_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.safetensors");
    let m = small_mlp();
    m.save(&path).unwrap();

    let loaded = MlpEstimator::load(&path).unwrap();
    assert_eq!(loaded, m);
    assert_eq!(loaded.layers().len(), 2);
    assert_eq!(loaded.evaluate(&[3.0, 1.0]).unwrap(), 2.5);
}

#[test]
fn rejects_malformed_networks() {
    assert!(matches!(
        MlpEstimator::new(vec![]),
        Err(EstimatorError::Checkpoint(_))
    ));
    // Two outputs on the last layer.
    let two_out = Dense::new(1, 2, vec![1.0, 1.0], vec![0.0, 0.0]).unwrap();
    assert!(MlpEstimator::new(vec![two_out]).is_err());
    // Layer widths do not chain.
    let a = Dense::new(2, 3, vec![0.0; 6], vec![0.0; 3]).unwrap();
    let b = Dense::new(2, 1, vec![0.0; 2], vec![0.0]).unwrap();
    assert!(MlpEstimator::new(vec![a, b]).is_err());
    // Weight length disagrees with the declared shape.
    assert!(Dense::new(2, 2, vec![0.0; 3], vec![0.0; 2]).is_err());
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = MlpEstimator::load(dir.path().join("nope.safetensors")).unwrap_err();
    assert!(matches!(err, EstimatorError::Io(_)));
}

#[test]
fn garbage_bytes_fail_to_parse() {
    assert!(matches!(
        MlpEstimator::from_bytes(b"not a checkpoint"),
        Err(EstimatorError::Safetensors(_))
    ));
}
