//! ucr-core: Action vocabulary, oracle type→tag view, reward scoring, and configuration.

pub mod action;
pub mod config;
pub mod scoring;
pub mod valid;

pub use action::{
    decode, encode, vocab, vocab_index, ActionEncoding, ActionError, ActionType, EdgeLabel,
    OracleAction, VocabAction, ENCODING_LEN, NUM_LABELS, NUM_TYPES, V,
};
pub use config::{Config, ConfigError, ParserSettings};
pub use scoring::{reward, score_all, score_with, StepScore, LABEL_CREDIT, TYPE_CREDIT};
pub use valid::TypeTags;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Identifier of the vocabulary layout; bump when `vocab()` order or encoding changes.
pub const ACTION_SPACE_ID: &str = "ucca_tupa_v88";


#[cfg(test)]
mod action_tests;
