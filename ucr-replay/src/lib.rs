//! ucr-replay: Training-tuple emission + compressed dataset writer/reader.

pub mod emit;
pub mod schema;
pub mod writer;

pub use emit::{emit_graph, emit_step, GraphEmission};
pub use writer::{
    cleanup_tmp_files, meta_path, read_dataset, read_meta, DatasetError, DatasetMeta,
    DatasetWriter, DatasetWriterConfig, TrainingTuple,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}


#[cfg(test)]
mod writer_tests;
