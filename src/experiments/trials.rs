//! Batch runs over puzzle lists: collect the target position of every puzzle
//! and aggregate success rates.
//!
//! Each puzzle run is independent and the graph is read-only, so search
//! batches fan out over rayon when the `parallel` feature is enabled.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{AssociationGraph, Puzzle};
use crate::network::{DynamicalNetwork, NetworkConfig};
use crate::search::{search, SearchParams};

/// Sentinel position for puzzles whose target was never visited.
pub const NOT_FOUND: i32 = -1;

/// Aggregate outcome of one batch.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrialReport {
    /// Per-puzzle position of the target along the search path, or
    /// [`NOT_FOUND`].
    pub positions: Vec<i32>,
    /// Guess budget the batch was run with.
    pub max_visited: usize,
}

impl TrialReport {
    /// Fraction of puzzles whose target was found at all.
    pub fn success_rate(&self) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let found = self.positions.iter().filter(|&&p| p != NOT_FOUND).count();
        found as f32 / self.positions.len() as f32
    }

    /// Fraction of puzzles solved within the first `budget` guesses.
    ///
    /// Valid for any `budget <= max_visited` because a successful prefix is
    /// preserved under larger budgets, so one max-budget batch yields the
    /// rates for every smaller budget.
    pub fn success_rate_within(&self, budget: usize) -> f32 {
        if self.positions.is_empty() {
            return 0.0;
        }
        let found = self
            .positions
            .iter()
            .filter(|&&p| p != NOT_FOUND && (p as usize) < budget)
            .count();
        found as f32 / self.positions.len() as f32
    }

    /// Deepest position at which any target was found.
    pub fn max_position(&self) -> Option<usize> {
        self.positions
            .iter()
            .filter(|&&p| p != NOT_FOUND)
            .map(|&p| p as usize)
            .max()
    }
}

/// Run every puzzle through the discrete search engine.
pub fn run_search_trials(
    graph: &AssociationGraph,
    puzzles: &[Puzzle],
    params: &SearchParams,
) -> Result<TrialReport> {
    let positions = collect_search_positions(graph, puzzles, params)?;
    Ok(TrialReport {
        positions,
        max_visited: params.max_visited,
    })
}

#[cfg(feature = "parallel")]
fn collect_search_positions(
    graph: &AssociationGraph,
    puzzles: &[Puzzle],
    params: &SearchParams,
) -> Result<Vec<i32>> {
    puzzles
        .par_iter()
        .map(|p| {
            let out = search(graph, &p.cues, p.target, params)?;
            Ok(position_or_sentinel(out.target_position(p.target)))
        })
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_search_positions(
    graph: &AssociationGraph,
    puzzles: &[Puzzle],
    params: &SearchParams,
) -> Result<Vec<i32>> {
    puzzles
        .iter()
        .map(|p| {
            let out = search(graph, &p.cues, p.target, params)?;
            Ok(position_or_sentinel(out.target_position(p.target)))
        })
        .collect()
}

/// Run every puzzle through the dynamical network.
///
/// Each puzzle gets its own engine with a seed derived from the base seed, so
/// a batch is reproducible while runs stay independent.
pub fn run_network_trials(
    graph: &AssociationGraph,
    puzzles: &[Puzzle],
    cfg: &NetworkConfig,
) -> Result<TrialReport> {
    let base_seed = cfg.seed.unwrap_or(1);
    let positions = collect_network_positions(graph, puzzles, cfg, base_seed)?;
    Ok(TrialReport {
        positions,
        max_visited: cfg.max_visited,
    })
}

#[cfg(feature = "parallel")]
fn collect_network_positions(
    graph: &AssociationGraph,
    puzzles: &[Puzzle],
    cfg: &NetworkConfig,
    base_seed: u64,
) -> Result<Vec<i32>> {
    puzzles
        .par_iter()
        .enumerate()
        .map(|(idx, p)| run_one_network_trial(graph, p, cfg, base_seed, idx))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn collect_network_positions(
    graph: &AssociationGraph,
    puzzles: &[Puzzle],
    cfg: &NetworkConfig,
    base_seed: u64,
) -> Result<Vec<i32>> {
    puzzles
        .iter()
        .enumerate()
        .map(|(idx, p)| run_one_network_trial(graph, p, cfg, base_seed, idx))
        .collect()
}

fn run_one_network_trial(
    graph: &AssociationGraph,
    puzzle: &Puzzle,
    cfg: &NetworkConfig,
    base_seed: u64,
    idx: usize,
) -> Result<i32> {
    let seed = base_seed.wrapping_add((idx as u64).wrapping_mul(0x9E3779B97F4A7C15));
    let mut net = DynamicalNetwork::new(graph, cfg.with_seed(seed))?;
    let out = net.run(&puzzle.cues, puzzle.target)?;
    Ok(position_or_sentinel(out.target_position()))
}

fn position_or_sentinel(position: Option<usize>) -> i32 {
    match position {
        Some(p) => p as i32,
        None => NOT_FOUND,
    }
}
