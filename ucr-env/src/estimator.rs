//! Reward estimator interface + dense checkpoint loader.

use std::collections::BTreeMap;
use std::path::Path;

use bytemuck::cast_slice;
use safetensors::tensor::{Dtype, TensorView};
use safetensors::SafeTensors;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("safetensors: {0}")]
    Safetensors(#[from] safetensors::SafeTensorError),
    #[error("bad checkpoint: {0}")]
    Checkpoint(String),
    #[error("input length {got}, estimator expects {expected}")]
    InputLen { expected: usize, got: usize },
}

/// Learned reward model.
///
/// - input: observation ⧺ `[type10, hasLabel, label14]`
/// - output: one scalar reward estimate
///
/// Loaded once and shared read-only across any number of `evaluate` calls.
pub trait RewardEstimator: Send + Sync {
    /// Expected input length, if fixed.
    fn input_len(&self) -> Option<usize>;
    fn evaluate(&self, input: &[f64]) -> Result<f64, EstimatorError>;
}

/// Constant reward (baseline stub).
pub struct ConstantEstimator(pub f64);

impl RewardEstimator for ConstantEstimator {
    fn input_len(&self) -> Option<usize> {
        None
    }

    fn evaluate(&self, _input: &[f64]) -> Result<f64, EstimatorError> {
        Ok(self.0)
    }
}

/// One fully connected layer, row-major `[out, in]` weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense {
    pub in_dim: usize,
    pub out_dim: usize,
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

impl Dense {
    pub fn new(in_dim: usize, out_dim: usize, weight: Vec<f32>, bias: Vec<f32>) -> Result<Self, EstimatorError> {
        if weight.len() != in_dim * out_dim || bias.len() != out_dim {
            return Err(EstimatorError::Checkpoint(format!(
                "dense layer {in_dim}->{out_dim}: weight {} / bias {} elements",
                weight.len(),
                bias.len()
            )));
        }
        Ok(Self {
            in_dim,
            out_dim,
            weight,
            bias,
        })
    }

    fn forward(&self, x: &[f32], out: &mut Vec<f32>) {
        out.clear();
        for o in 0..self.out_dim {
            let row = &self.weight[o * self.in_dim..(o + 1) * self.in_dim];
            let dot: f32 = row.iter().zip(x).map(|(w, v)| w * v).sum();
            out.push(dot + self.bias[o]);
        }
    }
}

/// Dense ReLU network with a single linear output.
///
/// Checkpoint layout (safetensors, F32): `dense_{i}.weight` `[out, in]` and
/// `dense_{i}.bias` `[out]` for `i = 0..n`; layer `i+1` input equals layer `i`
/// output, and the last layer has one output.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpEstimator {
    layers: Vec<Dense>,
}

fn weight_name(i: usize) -> String {
    format!("dense_{i}.weight")
}

fn bias_name(i: usize) -> String {
    format!("dense_{i}.bias")
}

fn read_f32(view: &TensorView<'_>, name: &str) -> Result<Vec<f32>, EstimatorError> {
    if view.dtype() != Dtype::F32 {
        return Err(EstimatorError::Checkpoint(format!(
            "{name}: expected F32, got {:?}",
            view.dtype()
        )));
    }
    Ok(view
        .data()
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

impl MlpEstimator {
    pub fn new(layers: Vec<Dense>) -> Result<Self, EstimatorError> {
        let last = layers
            .last()
            .ok_or_else(|| EstimatorError::Checkpoint("no layers".to_string()))?;
        if last.out_dim != 1 {
            return Err(EstimatorError::Checkpoint(format!(
                "last layer has {} outputs, expected 1",
                last.out_dim
            )));
        }
        for (i, w) in layers.windows(2).enumerate() {
            if w[0].out_dim != w[1].in_dim {
                return Err(EstimatorError::Checkpoint(format!(
                    "layer {} outputs {} but layer {} takes {}",
                    i,
                    w[0].out_dim,
                    i + 1,
                    w[1].in_dim
                )));
            }
        }
        Ok(Self { layers })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EstimatorError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EstimatorError> {
        let st = SafeTensors::deserialize(bytes)?;
        let mut layers = Vec::new();
        loop {
            let i = layers.len();
            let (wn, bn) = (weight_name(i), bias_name(i));
            let Ok(w) = st.tensor(&wn) else {
                break;
            };
            let b = st
                .tensor(&bn)
                .map_err(|_| EstimatorError::Checkpoint(format!("missing {bn}")))?;
            let (out_dim, in_dim) = match w.shape() {
                [o, i] => (*o, *i),
                s => {
                    return Err(EstimatorError::Checkpoint(format!(
                        "{wn}: expected rank 2, got shape {s:?}"
                    )))
                }
            };
            if b.shape() != [out_dim] {
                return Err(EstimatorError::Checkpoint(format!(
                    "{bn}: expected shape [{out_dim}], got {:?}",
                    b.shape()
                )));
            }
            layers.push(Dense::new(in_dim, out_dim, read_f32(&w, &wn)?, read_f32(&b, &bn)?)?);
        }
        Self::new(layers)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EstimatorError> {
        let mut tensors: BTreeMap<String, TensorView<'_>> = BTreeMap::new();
        for (i, l) in self.layers.iter().enumerate() {
            tensors.insert(
                weight_name(i),
                TensorView::new(Dtype::F32, vec![l.out_dim, l.in_dim], cast_slice(&l.weight))?,
            );
            tensors.insert(
                bias_name(i),
                TensorView::new(Dtype::F32, vec![l.out_dim], cast_slice(&l.bias))?,
            );
        }
        let bytes = safetensors::serialize(&tensors, &None)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }
}

impl RewardEstimator for MlpEstimator {
    fn input_len(&self) -> Option<usize> {
        self.layers.first().map(|l| l.in_dim)
    }

    fn evaluate(&self, input: &[f64]) -> Result<f64, EstimatorError> {
        let expected = self.layers[0].in_dim;
        if input.len() != expected {
            return Err(EstimatorError::InputLen {
                expected,
                got: input.len(),
            });
        }
        let mut x: Vec<f32> = input.iter().map(|&v| v as f32).collect();
        let mut y = Vec::new();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            layer.forward(&x, &mut y);
            if i < last {
                for v in &mut y {
                    *v = v.max(0.0);
                }
            }
            std::mem::swap(&mut x, &mut y);
        }
        Ok(x[0] as f64)
    }
}
