//! # ratnet
//!
//! Spreading activation over a weighted word-association graph, as a model of
//! how a person solves three-cue word puzzles (Remote Associates Test style).
//!
//! The same search process is implemented twice, and the two implementations
//! are required to agree:
//!
//! - [`search`]: a discrete winner-take-all graph search
//! - [`network`]: a layered dynamical simulation whose emergent winner
//!   sequence matches the discrete search under matched parameters
//! - [`harness`]: runs both engines on one puzzle and reports agreement
//!
//! ## Quick Start
//!
//! ```
//! use ratnet::prelude::*;
//!
//! let mut builder = AssociationGraph::builder();
//! builder.add_edge("river", "bank", 0.5);
//! builder.add_edge("note", "bank", 0.4);
//! builder.add_edge("account", "bank", 0.6);
//! let graph = builder.build().unwrap();
//!
//! let puzzle = Puzzle::from_words(&graph, ["river", "note", "account"], "bank").unwrap();
//! let outcome = search(&graph, &puzzle.cues, puzzle.target, &SearchParams::default()).unwrap();
//! assert!(outcome.solved(puzzle.target));
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization for parameter and report types
//! - `parallel`: run independent puzzles of a trial batch via rayon
//!
//! ## Modules
//!
//! - [`graph`]: read-only association graph and puzzle types
//! - [`search`]: discrete WTA search engine
//! - [`network`]: dynamical-network engine
//! - [`harness`]: engine-equivalence checks
//! - [`trials`]: batch runs over puzzle lists

#[path = "core/error.rs"]
pub mod error;

#[path = "core/graph.rs"]
pub mod graph;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/search.rs"]
pub mod search;

#[path = "core/network.rs"]
pub mod network;

#[path = "core/harness.rs"]
pub mod harness;

#[path = "experiments/trials.rs"]
pub mod trials;

/// Prelude module for convenient imports.
///
/// ```
/// use ratnet::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{EngineError, Result};
    pub use crate::graph::{AssociationGraph, GraphBuilder, NodeId, Puzzle};
    pub use crate::harness::{run_matched, EquivalenceReport, ABS_TOL, REL_TOL};
    pub use crate::network::{
        DynamicalNetwork, NetworkConfig, NetworkOutcome, NetworkTrace, TimeSeries,
    };
    pub use crate::search::{search, SearchOutcome, SearchParams};
    pub use crate::trials::{run_network_trials, run_search_trials, TrialReport, NOT_FOUND};
}
