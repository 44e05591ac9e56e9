//! Per-step and per-graph training-tuple emission.

use ucr_core::{encode, score_all, ActionType, OracleAction, StepScore};
use ucr_oracle::{ParserBackend, Replay, ReplayConfig, ReplayError};

use crate::writer::TrainingTuple;

/// Score the whole vocabulary against `valid` and append one tuple per entry.
pub fn emit_step(obs: &[f64], valid: &[OracleAction], out: &mut Vec<TrainingTuple>) -> StepScore {
    let score = score_all(valid);
    out.reserve(score.rewards.len());
    for (a, r) in score.iter() {
        out.push(TrainingTuple {
            obs: obs.to_vec(),
            act: encode(a),
            r,
        });
    }
    score
}

/// Outcome of emitting one graph.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEmission {
    pub graph_id: String,
    pub steps: u32,
    pub tuples: Vec<TrainingTuple>,
    /// Steps at which the oracle offered several tags for one type.
    pub ambiguous_steps: u32,
    /// Distinct types that were ambiguous anywhere in this graph.
    pub ambiguous_types: Vec<ActionType>,
}

/// Replay one graph and emit `V` tuples per step.
///
/// On a replay error the graph's partial tuples are dropped with it.
pub fn emit_graph<B: ParserBackend>(
    backend: &B,
    graph: &B::Graph,
    cfg: &ReplayConfig,
) -> Result<GraphEmission, ReplayError> {
    let mut replay = Replay::new(backend, graph, cfg.clone().with_observations());
    let mut tuples = Vec::new();
    let mut steps = 0u32;
    let mut ambiguous_steps = 0u32;
    let mut ambiguous_types = Vec::new();

    while let Some(step) = replay.next_step() {
        let step = step?;
        let obs = step.observation.unwrap_or_default();
        let score = emit_step(&obs, &step.valid, &mut tuples);
        if !score.ambiguous.is_empty() {
            ambiguous_steps += 1;
            for t in score.ambiguous {
                if !ambiguous_types.contains(&t) {
                    ambiguous_types.push(t);
                }
            }
        }
        steps += 1;
    }

    Ok(GraphEmission {
        graph_id: replay.graph_id().to_string(),
        steps,
        tuples,
        ambiguous_steps,
        ambiguous_types,
    })
}
