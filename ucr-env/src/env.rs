//! Reset/step adapter: one parser state + a trained reward estimator.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use ucr_core::{ActionEncoding, ActionError, VocabAction};
use ucr_features::{encode_input_into, Observation};
use ucr_oracle::{ParserBackend, ParserState, TransitionError};

use crate::estimator::{EstimatorError, MlpEstimator, RewardEstimator};

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("step called without a live episode (reset first)")]
    NotResettable,
    #[error(transparent)]
    InvalidCode(#[from] ActionError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("estimator: {0}")]
    Estimator(#[from] EstimatorError),
}

/// Diagnostics returned with every step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    /// 1-based index of this step within the episode.
    pub step: u32,
    pub action: VocabAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}

/// Episode phase.
pub enum Phase<S> {
    Uninitialized,
    Ready {
        state: S,
        observation: Observation,
        steps: u32,
    },
    Terminal,
}

impl<S> Phase<S> {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Ready { .. } => "ready",
            Phase::Terminal => "terminal",
        }
    }
}

pub struct UccaEnv<B: ParserBackend> {
    backend: B,
    estimator: Arc<dyn RewardEstimator>,
    phase: Phase<B::State>,
    input_buf: Vec<f64>,
}

impl<B: ParserBackend> UccaEnv<B> {
    pub fn new(backend: B, estimator: Arc<dyn RewardEstimator>) -> Self {
        Self {
            backend,
            estimator,
            phase: Phase::Uninitialized,
            input_buf: Vec::new(),
        }
    }

    pub fn from_checkpoint(backend: B, path: impl AsRef<Path>) -> Result<Self, EstimatorError> {
        let est = MlpEstimator::load(path)?;
        Ok(Self::new(backend, Arc::new(est)))
    }

    pub fn phase(&self) -> &Phase<B::State> {
        &self.phase
    }

    pub fn estimator(&self) -> &Arc<dyn RewardEstimator> {
        &self.estimator
    }

    /// Start a new episode over `graph`, dropping any previous state.
    pub fn reset(&mut self, graph: &B::Graph) -> Observation {
        let state = self.backend.new_state(graph);
        let observation = self.backend.extract_features(&state).into_observation();
        self.phase = if state.finished() {
            Phase::Terminal
        } else {
            Phase::Ready {
                state,
                observation: observation.clone(),
                steps: 0,
            }
        };
        observation
    }

    /// Score `code` with the estimator against the current observation, then apply it.
    ///
    /// An invalid code or a failed evaluation leaves the episode untouched.
    /// A failed transition ends it.
    pub fn step(&mut self, code: ActionEncoding) -> Result<StepOutcome, EnvError> {
        let Phase::Ready {
            state,
            observation,
            steps,
        } = &mut self.phase
        else {
            return Err(EnvError::NotResettable);
        };

        let action = code.decode()?;
        encode_input_into(observation, code, &mut self.input_buf);
        let reward = self.estimator.evaluate(&self.input_buf)?;

        if let Err(e) = state.transition(&action.to_oracle_action()) {
            self.phase = Phase::Terminal;
            return Err(e.into());
        }
        *steps += 1;
        let step = *steps;
        let next = self.backend.extract_features(state).into_observation();
        let done = state.finished();
        if done {
            self.phase = Phase::Terminal;
        } else {
            observation.clone_from(&next);
        }

        Ok(StepOutcome {
            observation: next,
            reward,
            done,
            info: StepInfo { step, action },
        })
    }
}
