//! Oracle replay: drive one parser state from its initial configuration to
//! `finished`, always taking the oracle action with the smallest canonical string.

use thiserror::Error;
use ucr_core::OracleAction;
use ucr_features::Observation;

use crate::backend::{Oracle, OracleActionSet, OracleError, ParserBackend, ParserState, TransitionError};

#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Step ceiling; reaching it without `finished` is reported as `StepLimit`.
    pub max_steps: u32,
    /// Extract the pre-transition observation for every step.
    pub capture_observations: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            capture_observations: false,
        }
    }
}

impl ReplayConfig {
    pub fn from_config(cfg: &ucr_core::config::ReplayConfig) -> Self {
        Self {
            max_steps: cfg.max_steps,
            ..Self::default()
        }
    }

    pub fn with_observations(mut self) -> Self {
        self.capture_observations = true;
        self
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("oracle exhausted for graph {graph_id} at step {step}: no valid action from a non-terminal state")]
    OracleExhausted { graph_id: String, step: u32 },
    #[error("graph {graph_id} did not finish within {max_steps} steps")]
    StepLimit { graph_id: String, max_steps: u32 },
    #[error("graph {graph_id} step {step}: {source}")]
    Transition {
        graph_id: String,
        step: u32,
        #[source]
        source: TransitionError,
    },
    #[error("graph {graph_id} step {step}: {source}")]
    Oracle {
        graph_id: String,
        step: u32,
        #[source]
        source: OracleError,
    },
}

impl ReplayError {
    pub fn graph_id(&self) -> &str {
        match self {
            ReplayError::OracleExhausted { graph_id, .. }
            | ReplayError::StepLimit { graph_id, .. }
            | ReplayError::Transition { graph_id, .. }
            | ReplayError::Oracle { graph_id, .. } => graph_id,
        }
    }
}

/// One replayed step: what the oracle allowed, what was taken, and the assigned label.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayStep {
    pub index: u32,
    /// The oracle's valid set at the pre-transition state, in oracle key order.
    pub valid: Vec<OracleAction>,
    pub chosen: OracleAction,
    pub label: Option<String>,
    /// Pre-transition observation (only with `capture_observations`).
    pub observation: Option<Observation>,
}

impl ReplayStep {
    /// `"<action>"` or `"<action> <label>"`.
    pub fn line(&self) -> String {
        match &self.label {
            Some(label) => format!("{} {}", self.chosen, label),
            None => self.chosen.to_string(),
        }
    }
}

/// Lexicographically smallest action by canonical string; ties keep the first in key order.
pub fn select_action(set: &OracleActionSet) -> Option<OracleAction> {
    set.values().min_by_key(|a| a.canonical()).copied()
}

/// Step-by-step replay of one graph. Fused after the first error or after `finished`.
pub struct Replay<'b, B: ParserBackend> {
    backend: &'b B,
    graph_id: String,
    state: B::State,
    oracle: B::Oracle,
    history: Vec<OracleAction>,
    cfg: ReplayConfig,
    done: bool,
}

impl<'b, B: ParserBackend> Replay<'b, B> {
    pub fn new(backend: &'b B, graph: &B::Graph, cfg: ReplayConfig) -> Self {
        Self {
            backend,
            graph_id: backend.graph_id(graph),
            state: backend.new_state(graph),
            oracle: backend.new_oracle(graph),
            history: Vec::new(),
            cfg,
            done: false,
        }
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    pub fn state(&self) -> &B::State {
        &self.state
    }

    /// Actions applied so far.
    pub fn history(&self) -> &[OracleAction] {
        &self.history
    }

    pub fn next_step(&mut self) -> Option<Result<ReplayStep, ReplayError>> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(step)) => Some(Ok(step)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    fn advance(&mut self) -> Result<Option<ReplayStep>, ReplayError> {
        if self.state.finished() {
            return Ok(None);
        }
        let step = self.history.len() as u32;
        if step >= self.cfg.max_steps {
            return Err(ReplayError::StepLimit {
                graph_id: self.graph_id.clone(),
                max_steps: self.cfg.max_steps,
            });
        }

        let set = self
            .oracle
            .get_actions(&self.state, &self.history)
            .map_err(|source| self.oracle_err(step, source))?;
        let chosen = select_action(&set).ok_or_else(|| ReplayError::OracleExhausted {
            graph_id: self.graph_id.clone(),
            step,
        })?;

        let observation = if self.cfg.capture_observations {
            Some(self.backend.extract_features(&self.state).into_observation())
        } else {
            None
        };
        let valid: Vec<OracleAction> = set.into_values().collect();

        self.state
            .transition(&chosen)
            .map_err(|source| ReplayError::Transition {
                graph_id: self.graph_id.clone(),
                step,
                source,
            })?;

        let label = if self.state.need_label() {
            let label = self
                .oracle
                .get_label(&self.state, &chosen)
                .map_err(|source| self.oracle_err(step, source))?;
            self.state.label_node(&label);
            Some(label)
        } else {
            None
        };

        self.history.push(chosen);
        Ok(Some(ReplayStep {
            index: step,
            valid,
            chosen,
            label,
            observation,
        }))
    }

    fn oracle_err(&self, step: u32, source: OracleError) -> ReplayError {
        ReplayError::Oracle {
            graph_id: self.graph_id.clone(),
            step,
            source,
        }
    }
}

impl<'b, B: ParserBackend> Iterator for Replay<'b, B> {
    type Item = Result<ReplayStep, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_step()
    }
}

/// Replay a whole graph, collecting every step.
pub fn replay_all<B: ParserBackend>(
    backend: &B,
    graph: &B::Graph,
    cfg: ReplayConfig,
) -> Result<Vec<ReplayStep>, ReplayError> {
    Replay::new(backend, graph, cfg).collect()
}

/// Replay a whole graph, returning the oracle sequence as text lines.
pub fn replay_lines<B: ParserBackend>(
    backend: &B,
    graph: &B::Graph,
    cfg: ReplayConfig,
) -> Result<Vec<String>, ReplayError> {
    Replay::new(backend, graph, cfg)
        .map(|step| step.map(|s| s.line()))
        .collect()
}
