//! ucr-oracle: Parser capability traits + deterministic oracle replay.
//!
//! This crate does not implement a parser. It defines the seam the external
//! parser plugs into (`backend`), the replay loop over that seam (`replay`),
//! and a backend that replays recorded oracle traces (`scripted`).

pub mod backend;
pub mod replay;
pub mod scripted;

pub use backend::{
    Oracle, OracleActionSet, OracleError, ParserBackend, ParserState, TransitionError,
};
pub use replay::{
    replay_all, replay_lines, select_action, Replay, ReplayConfig, ReplayError, ReplayStep,
};
pub use scripted::{
    load_traces, write_traces, ScriptedBackend, ScriptedGraph, ScriptedOracle, ScriptedState,
    ScriptedStep, TraceError,
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
