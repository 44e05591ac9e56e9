//! ucr-env: Reward estimator + reset/step simulation adapter.
//!
//! The estimator is fit offline on the tuples `ucr-replay` writes; this crate
//! only loads it and answers one reward per externally chosen action.

pub mod env;
pub mod estimator;

pub use env::{EnvError, Phase, StepInfo, StepOutcome, UccaEnv};
pub use estimator::{ConstantEstimator, Dense, EstimatorError, MlpEstimator, RewardEstimator};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");



#[cfg(test)]
mod estimator_tests;
