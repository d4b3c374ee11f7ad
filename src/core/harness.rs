//! Runs both engines on the same puzzle and parameters and reports how well
//! they agree. Disagreement is data for tests and sweep drivers, not a
//! runtime error.

use crate::error::Result;
use crate::graph::{AssociationGraph, NodeId};
use crate::network::{DynamicalNetwork, NetworkConfig, NetworkOutcome};
use crate::search::{search, SearchOutcome, SearchParams};

/// Absolute tolerance on full activation vectors (three decimal places).
pub const ABS_TOL: f32 = 1e-3;

/// Relative tolerance on activation levels at corresponding visited nodes.
pub const REL_TOL: f32 = 0.1;

/// Agreement between one discrete search run and one network run.
#[derive(Debug)]
pub struct EquivalenceReport {
    pub search: SearchOutcome,
    pub network: NetworkOutcome,
    /// Visited sequences are identical in content and order.
    pub visited_match: bool,
    /// Largest absolute difference between the final activation vectors.
    pub max_activation_diff: f32,
    /// Largest relative activation difference at corresponding visited nodes.
    pub max_visited_rel_diff: f32,
}

impl EquivalenceReport {
    /// True when the visit orders match and activations agree within the
    /// given tolerances.
    pub fn agrees(&self, abs_tol: f32, rel_tol: f32) -> bool {
        self.visited_match
            && self.max_activation_diff <= abs_tol
            && self.max_visited_rel_diff <= rel_tol
    }
}

/// Run both engines with matched parameters and compare them.
///
/// The network's spreading threshold and guess budget are forced to the
/// search parameters; everything else comes from `base`.
pub fn run_matched(
    graph: &AssociationGraph,
    cues: &[NodeId],
    target: NodeId,
    params: &SearchParams,
    base: NetworkConfig,
) -> Result<EquivalenceReport> {
    let alg = search(graph, cues, target, params)?;

    let cfg = NetworkConfig {
        threshold: params.threshold,
        max_visited: params.max_visited,
        ..base
    };
    let net = DynamicalNetwork::new(graph, cfg)?.run(cues, target)?;

    let max_activation_diff = max_abs_diff(&alg.activations, net.final_activity());
    let visited_match = alg.visited == net.visited;
    let max_visited_rel_diff = visited_rel_diff(&alg, &net);

    Ok(EquivalenceReport {
        search: alg,
        network: net,
        visited_match,
        max_activation_diff,
        max_visited_rel_diff,
    })
}

fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .fold(0.0f32, |m, (&x, &y)| m.max((x - y).abs()))
}

/// Relative activation differences at visited nodes, compared pairwise along
/// the common prefix of the two visit orders.
fn visited_rel_diff(alg: &SearchOutcome, net: &NetworkOutcome) -> f32 {
    let final_net = net.final_activity();
    let mut worst = 0.0f32;
    for (&va, &vn) in alg.visited.iter().zip(net.visited.iter()) {
        let a = alg.activations[va];
        let b = final_net[vn];
        let scale = a.abs().max(b.abs()).max(f32::EPSILON);
        worst = worst.max((a - b).abs() / scale);
    }
    worst
}
