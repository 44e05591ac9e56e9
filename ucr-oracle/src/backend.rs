//! Capability interface over the external transition-based parser.
//!
//! The parser state machine, its gold oracle, and its feature extractor live
//! outside this workspace. Everything here is generic over `ParserBackend`, so
//! a recorded trace (see `scripted`) or a test stub can stand in for the real parser.

use std::collections::BTreeMap;

use thiserror::Error;
use ucr_core::OracleAction;
use ucr_features::Features;

/// Oracle-internal key → action. Iteration order is the key order.
pub type OracleActionSet = BTreeMap<String, OracleAction>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle has no label for {action}")]
    NoLabel { action: String },
    #[error("oracle failure: {0}")]
    Other(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot apply {action}: {reason}")]
pub struct TransitionError {
    pub action: String,
    pub reason: String,
}

/// Mutable parser configuration. Owned by exactly one driver.
pub trait ParserState {
    /// The last transition created a node/edge that still needs a label.
    fn need_label(&self) -> bool;
    fn finished(&self) -> bool;
    fn transition(&mut self, action: &OracleAction) -> Result<(), TransitionError>;
    fn label_node(&mut self, label: &str);
}

/// Gold oracle for one input graph.
pub trait Oracle<S: ParserState> {
    /// Actions that keep the gold graph reachable from `state`.
    fn get_actions(
        &mut self,
        state: &S,
        history: &[OracleAction],
    ) -> Result<OracleActionSet, OracleError>;

    /// Label for the node/edge created by `action` (called when `state.need_label()`).
    fn get_label(&mut self, state: &S, action: &OracleAction) -> Result<String, OracleError>;
}

/// Factory for states, oracles, and features over one graph type.
pub trait ParserBackend {
    type Graph;
    type State: ParserState;
    type Oracle: Oracle<Self::State>;

    /// Identity used in diagnostics and skip logs.
    fn graph_id(&self, graph: &Self::Graph) -> String;
    fn new_state(&self, graph: &Self::Graph) -> Self::State;
    fn new_oracle(&self, graph: &Self::Graph) -> Self::Oracle;
    fn extract_features(&self, state: &Self::State) -> Features;
}
