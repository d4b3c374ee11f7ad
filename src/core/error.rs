use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised by the graph, the engines, or the trial runners.
///
/// Puzzle-level negative results (target not found) are data, not errors;
/// they never appear here.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A cue or target word has no index in the vocabulary. Upstream code is
    /// expected to filter such puzzles out; this is the fail-fast guard.
    #[error("word not in vocabulary: {0:?}")]
    MissingWord(String),

    /// The cue/target combination is malformed (wrong count, duplicates, or
    /// out-of-range indices).
    #[error("invalid puzzle: {0}")]
    InvalidPuzzle(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// More than one simultaneous WTA winner in a simulation step. The run is
    /// invalid and must be restarted with fresh noise; expected to happen
    /// occasionally.
    #[error("{count} simultaneous winners at step {step}")]
    TiebreakFailure { step: usize, count: usize },

    /// Every restart of a network run ended in a tie-break failure.
    #[error("tie-break retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: usize },

    /// A WTA selection picked a node that was already a declared winner.
    /// Indicates a logic bug, not a recoverable condition.
    #[error("winner-take-all selected node {node} twice")]
    InvariantViolation { node: NodeId },
}

pub type Result<T> = core::result::Result<T, EngineError>;
