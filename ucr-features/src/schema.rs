//! Reward-estimator input schema v1.
//!
//! The estimator sees one flat vector per (state, action) pair:
//!
//! - **observation**: `obs_len` floats, the parser's numeric features at the
//!   pre-transition state, in extractor order
//! - **type10**: 1 float, action type code 0..=9
//! - **hasLabel**: 1 float, 0 or 1
//! - **label14**: 1 float, label code 0..=14 (0 = no label)
//!
//! Total: `obs_len + ENCODING_LEN`.

pub use ucr_core::ENCODING_LEN;

/// Increment this whenever the input layout changes.
pub const INPUT_SCHEMA_ID: u32 = 1;

/// Length of the estimator input for an observation of `obs_len` floats.
pub const fn input_len(obs_len: usize) -> usize {
    obs_len + ENCODING_LEN
}
