use core::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::{AssociationGraph, NodeId};

/// Activation injected for each cue (one-hot, one cue per step).
pub const CUE_AMPLITUDE: f32 = 1.0;

/// Parameters for the discrete winner-take-all search.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SearchParams {
    /// Spreading threshold: edges with weight below this contribute nothing
    /// when activation propagates from a winner.
    pub threshold: f32,
    /// Search-length budget: the walk stops after this many visited nodes.
    pub max_visited: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            max_visited: 10,
        }
    }
}

/// Result of one discrete search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Final activation level of every node.
    pub activations: Vec<f32>,
    /// Winners in the order they were visited. Distinct by construction.
    pub visited: Vec<NodeId>,
}

impl SearchOutcome {
    /// Position of the target along the search path, if it was reached.
    pub fn target_position(&self, target: NodeId) -> Option<usize> {
        self.visited.iter().position(|&v| v == target)
    }

    pub fn solved(&self, target: NodeId) -> bool {
        self.target_position(target).is_some()
    }
}

/// Spread activation through the graph until the target is visited or the
/// budget is exhausted.
///
/// Each iteration propagates weighted activation from the current winner to
/// its above-threshold neighbors, injects the next cue (cues are staggered one
/// per step, not applied all at once), then selects the next winner by
/// activation level. The search is fully deterministic.
pub fn search(
    graph: &AssociationGraph,
    cues: &[NodeId],
    target: NodeId,
    params: &SearchParams,
) -> Result<SearchOutcome> {
    validate_puzzle(graph, cues, target)?;
    if params.max_visited == 0 {
        return Err(EngineError::InvalidParameter("max_visited must be at least 1"));
    }
    if params.threshold < 0.0 {
        return Err(EngineError::InvalidParameter("threshold must be non-negative"));
    }

    let n = graph.len();
    let mut activations = vec![0.0f32; n];
    let mut visited: Vec<NodeId> = Vec::with_capacity(params.max_visited);
    // Every node that has ever been declared a winner. Selection already
    // excludes `visited` and the current winner, so a hit here is a bug.
    let mut former_winner = vec![false; n];

    let mut winner: Option<NodeId> = None;
    let mut step = 0usize;

    while visited.len() < params.max_visited {
        // Spread from the single winning node.
        if let Some(j) = winner {
            let source = activations[j];
            for (i, &w) in graph.row(j).iter().enumerate() {
                if w != 0.0 && w >= params.threshold {
                    activations[i] += w * source;
                }
            }
        }

        // External input: activate the next cue.
        if step < cues.len() {
            activations[cues[step]] += CUE_AMPLITUDE;
        }

        if let Some(j) = winner {
            visited.push(j);
            if j == target {
                break;
            }
        }

        match select_winner(&activations, &visited, winner) {
            Some(next) => {
                if former_winner[next] {
                    return Err(EngineError::InvariantViolation { node: next });
                }
                former_winner[next] = true;
                winner = Some(next);
            }
            // Every node has been visited already; nothing left to explore.
            None => break,
        }

        step += 1;
    }

    Ok(SearchOutcome {
        activations,
        visited,
    })
}

/// Winner-take-all selection: the node with the highest activation that is
/// neither visited nor the current winner.
///
/// Ties break toward the lower index. The order among exact ties is
/// deterministic but carries no meaning; it is an artifact of the sort.
fn select_winner(
    activations: &[f32],
    visited: &[NodeId],
    current: Option<NodeId>,
) -> Option<NodeId> {
    let mut order: Vec<NodeId> = (0..activations.len()).collect();
    order.sort_by(|&a, &b| {
        activations[b]
            .partial_cmp(&activations[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    order
        .into_iter()
        .find(|&k| Some(k) != current && !visited.contains(&k))
}

pub(crate) fn validate_puzzle(
    graph: &AssociationGraph,
    cues: &[NodeId],
    target: NodeId,
) -> Result<()> {
    if cues.is_empty() || cues.len() > 3 {
        return Err(EngineError::InvalidPuzzle("expected between one and three cues"));
    }
    for (k, &c) in cues.iter().enumerate() {
        if c >= graph.len() {
            return Err(EngineError::InvalidPuzzle("cue index out of range"));
        }
        if cues[..k].contains(&c) {
            return Err(EngineError::InvalidPuzzle("cue nodes must be distinct"));
        }
    }
    if target >= graph.len() {
        return Err(EngineError::InvalidPuzzle("target index out of range"));
    }
    Ok(())
}
