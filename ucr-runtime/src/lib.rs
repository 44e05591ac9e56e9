//! Corpus runtime: drives replay + emission over every input graph.

pub mod corpus;

pub use corpus::{
    dataset_written_event, run_corpus, run_corpus_parallel, CorpusError, CorpusOptions,
    CorpusReport, SkippedGraph,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
