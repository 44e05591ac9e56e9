use rayon::prelude::*;
use thiserror::Error;
use ucr_core::ACTION_SPACE_ID;
use ucr_features::INPUT_SCHEMA_ID;
use ucr_logging::{
    now_ms, DatasetWrittenEventV1, GraphReplayedEventV1, GraphSkippedEventV1, NdjsonError,
    NdjsonWriter, VersionInfoV1, EV_DATASET_WRITTEN, EV_GRAPH_REPLAYED, EV_GRAPH_SKIPPED,
};
use ucr_oracle::{ParserBackend, ReplayConfig, ReplayError};
use ucr_replay::schema::DATASET_VERSION;
use ucr_replay::{emit_graph, DatasetMeta, DatasetWriter, GraphEmission};

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("event log: {0}")]
    Events(#[from] NdjsonError),
}

#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub replay: ReplayConfig,
    pub run_id: String,
    /// Print one marker per graph to stderr (`.` replayed, `x` skipped).
    pub progress: bool,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            replay: ReplayConfig::default(),
            run_id: "run".to_string(),
            progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGraph {
    pub graph_idx: usize,
    pub graph_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusReport {
    pub replayed: usize,
    pub steps: u64,
    pub tuples: u64,
    pub ambiguous_steps: u64,
    pub skipped: Vec<SkippedGraph>,
}

fn version_info() -> VersionInfoV1 {
    VersionInfoV1 {
        dataset_version: DATASET_VERSION,
        input_schema_id: INPUT_SCHEMA_ID,
        action_space_id: ACTION_SPACE_ID.to_string(),
    }
}

/// Replay every graph in order, appending each successful graph's tuples to `writer`.
///
/// A graph whose replay fails is skipped: its partial tuples are dropped, its
/// index and id are printed to stderr and recorded in the report (and the event
/// log), and the run continues.
pub fn run_corpus<B: ParserBackend>(
    backend: &B,
    graphs: &[B::Graph],
    opts: &CorpusOptions,
    writer: &mut DatasetWriter,
    mut events: Option<&mut NdjsonWriter>,
) -> Result<CorpusReport, CorpusError> {
    let mut report = CorpusReport::default();
    for (idx, g) in graphs.iter().enumerate() {
        let result = emit_graph(backend, g, &opts.replay);
        record(idx, result, opts, writer, events.as_deref_mut(), &mut report)?;
    }
    finish_progress(opts);
    Ok(report)
}

/// Like `run_corpus`, but replays graphs on the rayon pool.
///
/// Each worker owns its graph's parser state and tuple shard; shards are
/// appended in input order, so the output matches the sequential run.
pub fn run_corpus_parallel<B>(
    backend: &B,
    graphs: &[B::Graph],
    opts: &CorpusOptions,
    writer: &mut DatasetWriter,
    mut events: Option<&mut NdjsonWriter>,
) -> Result<CorpusReport, CorpusError>
where
    B: ParserBackend + Sync,
    B::Graph: Sync,
{
    let results: Vec<Result<GraphEmission, ReplayError>> = graphs
        .par_iter()
        .map(|g| emit_graph(backend, g, &opts.replay))
        .collect();

    let mut report = CorpusReport::default();
    for (idx, result) in results.into_iter().enumerate() {
        record(idx, result, opts, writer, events.as_deref_mut(), &mut report)?;
    }
    finish_progress(opts);
    Ok(report)
}

fn record(
    idx: usize,
    result: Result<GraphEmission, ReplayError>,
    opts: &CorpusOptions,
    writer: &mut DatasetWriter,
    events: Option<&mut NdjsonWriter>,
    report: &mut CorpusReport,
) -> Result<(), CorpusError> {
    match result {
        Ok(em) => {
            if opts.progress {
                eprint!(".");
            }
            report.replayed += 1;
            report.steps += em.steps as u64;
            report.tuples += em.tuples.len() as u64;
            report.ambiguous_steps += em.ambiguous_steps as u64;
            if let Some(ev) = events {
                ev.write_event(&GraphReplayedEventV1 {
                    event: EV_GRAPH_REPLAYED.to_string(),
                    ts_ms: now_ms(),
                    v: version_info(),
                    run_id: opts.run_id.clone(),
                    graph_idx: idx as u64,
                    graph_id: em.graph_id.clone(),
                    steps: em.steps,
                    tuples: em.tuples.len() as u64,
                    ambiguous_steps: em.ambiguous_steps,
                    ambiguous_types: em.ambiguous_types.iter().map(|t| t.to_string()).collect(),
                })?;
            }
            writer.append_graph(em.tuples);
        }
        Err(e) => {
            if opts.progress {
                eprintln!("x");
            }
            eprintln!("skipping graph {} ({}): {}", idx, e.graph_id(), e);
            writer.record_skipped();
            let skipped = SkippedGraph {
                graph_idx: idx,
                graph_id: e.graph_id().to_string(),
                reason: e.to_string(),
            };
            if let Some(ev) = events {
                ev.write_event(&GraphSkippedEventV1 {
                    event: EV_GRAPH_SKIPPED.to_string(),
                    ts_ms: now_ms(),
                    v: version_info(),
                    run_id: opts.run_id.clone(),
                    graph_idx: idx as u64,
                    graph_id: skipped.graph_id.clone(),
                    reason: skipped.reason.clone(),
                })?;
            }
            report.skipped.push(skipped);
        }
    }
    Ok(())
}

fn finish_progress(opts: &CorpusOptions) {
    if opts.progress {
        eprintln!();
    }
}

/// Event recording the final dataset write.
pub fn dataset_written_event(run_id: &str, path: &str, meta: &DatasetMeta) -> DatasetWrittenEventV1 {
    DatasetWrittenEventV1 {
        event: EV_DATASET_WRITTEN.to_string(),
        ts_ms: now_ms(),
        v: version_info(),
        run_id: run_id.to_string(),
        path: path.to_string(),
        num_tuples: meta.num_tuples as u64,
        num_graphs: meta.num_graphs as u64,
        num_skipped: meta.num_skipped as u64,
        git_hash: meta.git_hash.clone(),
        config_hash: meta.config_hash.clone(),
    }
}
