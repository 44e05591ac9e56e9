//! Observation container and estimator input encoding.

use serde::{Deserialize, Serialize};
use ucr_core::ActionEncoding;

use crate::schema::input_len;

/// Numeric observation of a parser state.
pub type Observation = Vec<f64>;

/// Feature extractor output. Only the dense numeric part is consumed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    pub numeric: Observation,
}

impl Features {
    pub fn new(numeric: Observation) -> Self {
        Self { numeric }
    }

    pub fn into_observation(self) -> Observation {
        self.numeric
    }
}

/// Write `obs ⧺ action` into `out`, replacing its contents.
pub fn encode_input_into(obs: &[f64], action: ActionEncoding, out: &mut Vec<f64>) {
    out.clear();
    out.reserve(input_len(obs.len()));
    out.extend_from_slice(obs);
    out.extend_from_slice(&action.to_features());
}

/// Estimator input for one (state, action) pair.
pub fn encode_input(obs: &[f64], action: ActionEncoding) -> Vec<f64> {
    let mut out = Vec::new();
    encode_input_into(obs, action, &mut out);
    out
}
