//! Recorded-trace backend.
//!
//! A trace stores, for every step of one graph's gold derivation, the oracle's
//! valid set, the label the oracle assigned (if any), and the feature vector
//! the extractor produced. Replaying a trace reproduces the oracle's answers
//! without the parser library.
//!
//! Trace file format: a JSON array of
//! `{"id": "...", "steps": [{"valid": ["SHIFT"], "label": null, "features": [..]}, ..]}`.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ucr_core::OracleAction;
use ucr_features::Features;

use crate::backend::{
    Oracle, OracleActionSet, OracleError, ParserBackend, ParserState, TransitionError,
};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("trace {id}: {msg}")]
    Invalid { id: String, msg: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedStep {
    pub valid: Vec<OracleAction>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedGraph {
    pub id: String,
    pub steps: Vec<ScriptedStep>,
}

impl ScriptedGraph {
    pub fn new(id: impl Into<String>, steps: Vec<ScriptedStep>) -> Self {
        Self {
            id: id.into(),
            steps,
        }
    }

    /// A trace whose oracle offers exactly the gold action at every step.
    ///
    /// Features default to `[step_index, steps_remaining]`.
    pub fn from_gold(id: impl Into<String>, gold: &[(OracleAction, Option<&str>)]) -> Self {
        let n = gold.len();
        let steps = gold
            .iter()
            .enumerate()
            .map(|(i, (a, label))| ScriptedStep {
                valid: vec![*a],
                label: label.map(str::to_string),
                features: vec![i as f64, (n - i) as f64],
            })
            .collect();
        Self::new(id, steps)
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        if self.steps.is_empty() {
            return Err(self.invalid("trace has no steps"));
        }
        let dim = self.steps[0].features.len();
        if self.steps.iter().any(|s| s.features.len() != dim) {
            return Err(self.invalid("feature length differs between steps"));
        }
        Ok(())
    }

    fn invalid(&self, msg: &'static str) -> TraceError {
        TraceError::Invalid {
            id: self.id.clone(),
            msg,
        }
    }
}

/// Load and validate a JSON trace file.
pub fn load_traces(path: impl AsRef<Path>) -> Result<Vec<ScriptedGraph>, TraceError> {
    let bytes = std::fs::read(path)?;
    let graphs: Vec<ScriptedGraph> = serde_json::from_slice(&bytes)?;
    for g in &graphs {
        g.validate()?;
    }
    Ok(graphs)
}

pub fn write_traces(path: impl AsRef<Path>, graphs: &[ScriptedGraph]) -> Result<(), TraceError> {
    std::fs::write(path, serde_json::to_vec_pretty(graphs)?)?;
    Ok(())
}

/// Parser state that advances one recorded step per transition.
///
/// Any action is accepted while steps remain; the applied actions are kept so
/// callers can compare them with the recording.
#[derive(Debug, Clone)]
pub struct ScriptedState {
    steps: Arc<[ScriptedStep]>,
    pos: usize,
    need_label: bool,
    applied: Vec<OracleAction>,
    labels: Vec<String>,
}

impl ScriptedState {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn applied(&self) -> &[OracleAction] {
        &self.applied
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// True if the last applied action was one the recording allowed.
    pub fn last_on_script(&self) -> bool {
        match (self.pos.checked_sub(1), self.applied.last()) {
            (Some(i), Some(a)) => self.steps[i].valid.contains(a),
            _ => true,
        }
    }

    fn feature_dim(&self) -> usize {
        self.steps.first().map_or(0, |s| s.features.len())
    }
}

impl ParserState for ScriptedState {
    fn need_label(&self) -> bool {
        self.need_label
    }

    fn finished(&self) -> bool {
        self.pos >= self.steps.len()
    }

    fn transition(&mut self, action: &OracleAction) -> Result<(), TransitionError> {
        if self.finished() {
            return Err(TransitionError {
                action: action.canonical(),
                reason: "trace already finished".to_string(),
            });
        }
        self.need_label = self.steps[self.pos].label.is_some();
        self.applied.push(*action);
        self.pos += 1;
        Ok(())
    }

    fn label_node(&mut self, label: &str) {
        self.labels.push(label.to_string());
        self.need_label = false;
    }
}

/// Oracle answering from the recording.
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    steps: Arc<[ScriptedStep]>,
}

impl Oracle<ScriptedState> for ScriptedOracle {
    fn get_actions(
        &mut self,
        state: &ScriptedState,
        _history: &[OracleAction],
    ) -> Result<OracleActionSet, OracleError> {
        Ok(self
            .steps
            .get(state.pos)
            .map(|s| s.valid.iter().map(|a| (a.canonical(), *a)).collect())
            .unwrap_or_default())
    }

    fn get_label(
        &mut self,
        state: &ScriptedState,
        action: &OracleAction,
    ) -> Result<String, OracleError> {
        state
            .pos
            .checked_sub(1)
            .and_then(|i| self.steps[i].label.clone())
            .ok_or_else(|| OracleError::NoLabel {
                action: action.canonical(),
            })
    }
}

/// `ParserBackend` over recorded traces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedBackend;

impl ParserBackend for ScriptedBackend {
    type Graph = ScriptedGraph;
    type State = ScriptedState;
    type Oracle = ScriptedOracle;

    fn graph_id(&self, graph: &ScriptedGraph) -> String {
        graph.id.clone()
    }

    fn new_state(&self, graph: &ScriptedGraph) -> ScriptedState {
        ScriptedState {
            steps: graph.steps.clone().into(),
            pos: 0,
            need_label: false,
            applied: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn new_oracle(&self, graph: &ScriptedGraph) -> ScriptedOracle {
        ScriptedOracle {
            steps: graph.steps.clone().into(),
        }
    }

    /// Recorded features of the current step; zeros once the trace is finished.
    fn extract_features(&self, state: &ScriptedState) -> Features {
        match state.steps.get(state.pos) {
            Some(step) => Features::new(step.features.clone()),
            None => Features::new(vec![0.0; state.feature_dim()]),
        }
    }
}
