use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::{AssociationGraph, NodeId};
use crate::prng::Prng;
use crate::search::validate_puzzle;

/// Equation parameters for the dynamical network.
///
/// Defaults reproduce the reference parameterization: a winner dwells for
/// `stim_len` steps, the WTA layer integrates slowly (`rho_w`), noise breaks
/// ties, and already-visited nodes are suppressed hard (`visited_gain`).
///
/// Note: a run allocates five dense `(t_max, n)` traces, so `t_max` bounds
/// memory as well as simulated time.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    /// Maximal allowed number of guesses before the run stops.
    pub max_visited: usize,
    /// Stimulus length and winner dwell time, in steps.
    pub stim_len: usize,
    /// Inter-stimulus interval between cue onsets, in steps.
    pub isi: usize,
    /// Upper bound on simulated duration; runs usually terminate earlier.
    pub t_max: usize,
    /// Spreading threshold applied to edge weights during propagation.
    pub threshold: f32,

    /// Integration rate of the WTA layer.
    pub rho_w: f32,
    /// Self-excitation of an active winner (c1).
    pub excite: f32,
    /// Gain on normalized semantic drive (c2).
    pub drive: f32,
    /// Feedback inhibition per simultaneous winner (c3).
    pub inhibit: f32,
    /// Suppression of already-visited nodes (c4).
    pub visited_gain: f32,
    /// Noise amplitude for stochastic tie-breaking (c5).
    pub noise_amp: f32,
    /// Offset subtracted from each uniform draw so the noise is centered.
    pub noise_offset: f32,
    /// Output threshold of the WTA layer.
    pub theta_w: f32,
    /// Amplitude of the clamped cue input.
    pub input_amp: f32,

    /// Additional full-run restarts allowed after a tie-break failure.
    pub max_retries: usize,
    /// Noise seed; `None` picks a fixed default, so set it for sweeps.
    pub seed: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_visited: 4,
            stim_len: 50,
            isi: 100,
            t_max: 10_000,
            threshold: 0.0,
            rho_w: 1.0 - 0.995,
            excite: 1.0,
            drive: 1.0,
            inhibit: 1.0,
            visited_gain: 50.0,
            noise_amp: 0.1,
            noise_offset: 0.5,
            theta_w: 1.0,
            input_amp: 1.0,
            max_retries: 50,
            seed: None,
        }
    }
}

impl NetworkConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Dense `(steps x n)` array stored row-major, one row per time step.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    data: Vec<f32>,
    width: usize,
}

impl TimeSeries {
    fn zeros(steps: usize, width: usize) -> Self {
        Self {
            data: vec![0.0; steps * width],
            width,
        }
    }

    pub fn steps(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.data.len() / self.width
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, t: usize) -> &[f32] {
        &self.data[t * self.width..(t + 1) * self.width]
    }

    fn row_mut(&mut self, t: usize) -> &mut [f32] {
        &mut self.data[t * self.width..(t + 1) * self.width]
    }

    /// Borrow row `t - 1` immutably and row `t` mutably at once.
    fn step_pair_mut(&mut self, t: usize) -> (&[f32], &mut [f32]) {
        let (head, tail) = self.data.split_at_mut(t * self.width);
        (
            &head[(t - 1) * self.width..],
            &mut tail[..self.width],
        )
    }

    fn truncate(&mut self, steps: usize) {
        self.data.truncate(steps * self.width);
    }
}

/// Raw time-indexed activity of every layer, for inspection and plotting.
#[derive(Debug, Clone)]
pub struct NetworkTrace {
    /// External input I.
    pub input: TimeSeries,
    /// Semantic-layer activity a.
    pub semantic: TimeSeries,
    /// Winner indicator z (0/1 per node).
    pub winner: TimeSeries,
    /// WTA-layer activity w.
    pub wta: TimeSeries,
    /// Inhibitory / already-visited layer r (saturates at 1).
    pub inhibited: TimeSeries,
    /// Single-unit trace y: count of simultaneous winners per step.
    pub winner_count: Vec<f32>,
}

/// Result of one completed network run.
#[derive(Debug, Clone)]
pub struct NetworkOutcome {
    /// Nodes marked visited, deduplicated in first-occurrence order.
    pub visited: Vec<NodeId>,
    /// Effective duration: the index of the last simulated step after
    /// truncation.
    pub steps: usize,
    /// Full-run restarts consumed before this run completed.
    pub retries: usize,
    pub target: NodeId,
    pub trace: NetworkTrace,
}

impl NetworkOutcome {
    /// Semantic activity at the final simulated step.
    pub fn final_activity(&self) -> &[f32] {
        self.trace.semantic.row(self.steps)
    }

    pub fn target_position(&self) -> Option<usize> {
        self.visited.iter().position(|&v| v == self.target)
    }

    pub fn solved(&self) -> bool {
        self.target_position().is_some()
    }
}

/// Layered dynamical simulation of the association search.
///
/// Three coupled layers evolve in discrete time: graded semantic activity, a
/// noisy competitive WTA layer that selects one winner per epoch, and an
/// inhibitory layer that marks winners as visited so they are not revisited.
/// The winner sequence that emerges matches the discrete
/// [`search`](crate::search::search) under matched parameters.
pub struct DynamicalNetwork<'g> {
    graph: &'g AssociationGraph,
    cfg: NetworkConfig,
    rng: Prng,
}

impl<'g> DynamicalNetwork<'g> {
    pub fn new(graph: &'g AssociationGraph, cfg: NetworkConfig) -> Result<Self> {
        if cfg.max_visited == 0 {
            return Err(EngineError::InvalidParameter("max_visited must be at least 1"));
        }
        if cfg.stim_len < 3 {
            return Err(EngineError::InvalidParameter(
                "stim_len must be at least 3 for the dwell window",
            ));
        }
        if cfg.threshold < 0.0 {
            return Err(EngineError::InvalidParameter("threshold must be non-negative"));
        }
        if cfg.rho_w <= 0.0 || cfg.theta_w <= 0.0 {
            return Err(EngineError::InvalidParameter(
                "rho_w and theta_w must be positive",
            ));
        }

        let rng = Prng::new(cfg.seed.unwrap_or(1));
        Ok(Self { graph, cfg, rng })
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.cfg
    }

    /// Run the simulation, restarting on tie-break failures.
    ///
    /// A failed run is discarded entirely; each retry draws fresh noise from
    /// the same stream. The retry cap makes the failure mode explicit instead
    /// of looping forever.
    pub fn run(&mut self, cues: &[NodeId], target: NodeId) -> Result<NetworkOutcome> {
        validate_puzzle(self.graph, cues, target)?;

        let last_onset = self.cfg.stim_len + (cues.len() - 1) * (self.cfg.stim_len + self.cfg.isi);
        if self.cfg.t_max <= last_onset + self.cfg.stim_len {
            return Err(EngineError::InvalidParameter(
                "t_max is too short for the cue schedule",
            ));
        }

        let attempts = self.cfg.max_retries + 1;
        for attempt in 0..attempts {
            match self.run_once(cues, target) {
                Ok(mut outcome) => {
                    outcome.retries = attempt;
                    debug!(
                        steps = outcome.steps,
                        visited = outcome.visited.len(),
                        solved = outcome.solved(),
                        "network run finished"
                    );
                    return Ok(outcome);
                }
                Err(EngineError::TiebreakFailure { step, count }) => {
                    warn!(attempt, step, count, "simultaneous winners, restarting run");
                }
                Err(other) => return Err(other),
            }
        }

        Err(EngineError::RetriesExhausted { attempts })
    }

    fn run_once(&mut self, cues: &[NodeId], target: NodeId) -> Result<NetworkOutcome> {
        let n = self.graph.len();
        let cfg = self.cfg;
        let len = cfg.stim_len;
        let rho_a = 1.0 / len as f32;

        let mut input = TimeSeries::zeros(cfg.t_max, n);
        let mut semantic = TimeSeries::zeros(cfg.t_max, n);
        let mut winner = TimeSeries::zeros(cfg.t_max, n);
        let mut wta = TimeSeries::zeros(cfg.t_max, n);
        let mut inhibited = TimeSeries::zeros(cfg.t_max, n);
        let mut winner_count = vec![0.0f32; cfg.t_max];

        // Equally spaced cue onsets, one window per cue.
        for (k, &cue) in cues.iter().enumerate() {
            let onset = len + k * (len + cfg.isi);
            for t in onset..(onset + len).min(cfg.t_max) {
                input.row_mut(t)[cue] = cfg.input_amp;
            }
        }

        // Per-node count of winner steps inside the trailing window
        // [t - len, t), maintained incrementally.
        let mut dwell = vec![0.0f32; n];
        let mut propagated = vec![0.0f32; n];

        let mut steps = cfg.t_max - 1;

        for t in 1..cfg.t_max {
            if self.terminated(&inhibited, t, target) {
                steps = t - 1;
                break;
            }

            // Winner indicator from the previous WTA state:
            // z[t-1] = H(w[t-1] - theta_w).
            let mut active: Option<NodeId> = None;
            let mut active_count = 0usize;
            {
                let w_prev = wta.row(t - 1);
                let z_prev = winner.row_mut(t - 1);
                for i in 0..n {
                    if w_prev[i] >= cfg.theta_w {
                        z_prev[i] = 1.0;
                        active_count += 1;
                        if active.is_none() {
                            active = Some(i);
                        }
                    }
                }
            }

            // Several simultaneous winners invalidate the whole run.
            if active_count > 1 {
                return Err(EngineError::TiebreakFailure {
                    step: t,
                    count: active_count,
                });
            }

            // Trailing window moves forward by one step.
            {
                let newest = winner.row(t - 1);
                for i in 0..n {
                    dwell[i] += newest[i];
                }
            }
            if t >= len + 1 {
                let oldest = winner.row(t - 1 - len);
                for i in 0..n {
                    dwell[i] -= oldest[i];
                }
            }

            // ----- Semantic layer -----
            // Activation spreads from the single winning node, gated by the
            // spreading threshold and scaled by the winner's own activity.
            propagated.fill(0.0);
            if let Some(j) = active {
                let source = semantic.row(t - 1)[j];
                for (i, &w) in self.graph.row(j).iter().enumerate() {
                    if w != 0.0 && w >= cfg.threshold {
                        propagated[i] = w * source;
                    }
                }
            }
            {
                let ext = input.row(t - 1);
                let (a_prev, a_now) = semantic.step_pair_mut(t);
                for i in 0..n {
                    a_now[i] = a_prev[i] + rho_a * (propagated[i] + ext[i]);
                }
            }

            // ----- WTA layer -----
            // Normalize semantic drive to 0..1.
            let divisor = semantic
                .row(t - 1)
                .iter()
                .fold(1.0f32, |m, &v| m.max(v));
            let y_prev = winner_count[t - 1];
            {
                let z_prev = winner.row(t - 1);
                let a_prev = semantic.row(t - 1);
                let r_prev = inhibited.row(t - 1);
                let (w_prev, w_now) = wta.step_pair_mut(t);
                for i in 0..n {
                    let eta = self.rng.noise(cfg.noise_offset);
                    let dw = cfg.excite * z_prev[i] + cfg.drive * a_prev[i] / divisor
                        - cfg.inhibit * y_prev
                        - cfg.visited_gain * r_prev[i]
                        + cfg.noise_amp * eta;
                    // Rectify: WTA activity never goes negative.
                    w_now[i] = (w_prev[i] + cfg.rho_w * dw).max(0.0);
                }
            }

            winner_count[t] = active_count as f32;

            // ----- Inhibitory layer -----
            // A node that has won for at least len - 2 of the last len steps
            // is marked visited; the mark saturates at 1 and persists.
            let dwell_gate = (len - 2) as f32;
            {
                let (r_prev, r_now) = inhibited.step_pair_mut(t);
                for i in 0..n {
                    let mark = if dwell[i] >= dwell_gate { 1.0 } else { 0.0 };
                    r_now[i] = (r_prev[i] + mark).min(1.0);
                }
            }
        }

        input.truncate(steps + 1);
        semantic.truncate(steps + 1);
        winner.truncate(steps + 1);
        wta.truncate(steps + 1);
        inhibited.truncate(steps + 1);
        winner_count.truncate(steps + 1);

        let visited = collect_visited(&inhibited);

        Ok(NetworkOutcome {
            visited,
            steps,
            retries: 0,
            target,
            trace: NetworkTrace {
                input,
                semantic,
                winner,
                wta,
                inhibited,
                winner_count,
            },
        })
    }

    /// Stop when the target has stayed marked long enough to count as found,
    /// or when the allowed number of guesses has been made.
    fn terminated(&self, inhibited: &TimeSeries, t: usize, target: NodeId) -> bool {
        let len = self.cfg.stim_len;
        let start = t.saturating_sub(len);

        let target_active = (start..t).any(|u| inhibited.row(u)[target] > 0.0);
        if target_active {
            return true;
        }

        let guesses = inhibited
            .row(start)
            .iter()
            .filter(|&&v| v > 0.0)
            .count();
        guesses == self.cfg.max_visited
    }
}

/// Nodes ever marked in the inhibitory layer, deduplicated while preserving
/// first-occurrence order.
fn collect_visited(inhibited: &TimeSeries) -> Vec<NodeId> {
    let mut seen = vec![false; inhibited.width()];
    let mut visited = Vec::new();
    for t in 0..inhibited.steps() {
        for (i, &v) in inhibited.row(t).iter().enumerate() {
            if v > 0.0 && !seen[i] {
                seen[i] = true;
                visited.push(i);
            }
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AssociationGraph;
    use crate::search::{search, SearchParams};

    fn cheese_graph() -> AssociationGraph {
        let mut b = AssociationGraph::builder();
        b.add_edge("cottage", "cheese", 0.35);
        b.add_edge("cottage", "house", 0.40);
        b.add_edge("swiss", "cheese", 0.30);
        b.add_edge("swiss", "alps", 0.25);
        b.add_edge("swiss", "chocolate", 0.20);
        b.add_edge("cake", "chocolate", 0.55);
        b.add_edge("cake", "cheese", 0.45);
        b.add_edge("cake", "bread", 0.15);
        b.add_edge("cheese", "milk", 0.60);
        b.add_edge("cheese", "bread", 0.30);
        b.build().unwrap()
    }

    fn cheese_puzzle(g: &AssociationGraph) -> (Vec<NodeId>, NodeId) {
        let cues = vec![
            g.node("cottage").unwrap(),
            g.node("swiss").unwrap(),
            g.node("cake").unwrap(),
        ];
        (cues, g.node("cheese").unwrap())
    }

    #[test]
    fn solves_the_cheese_puzzle() {
        let g = cheese_graph();
        let (cues, target) = cheese_puzzle(&g);
        let cfg = NetworkConfig {
            max_visited: 8,
            ..NetworkConfig::default()
        }
        .with_seed(42);

        let mut net = DynamicalNetwork::new(&g, cfg).unwrap();
        let out = net.run(&cues, target).unwrap();

        assert!(out.solved());
        // Cues are guessed first, in onset order.
        assert_eq!(&out.visited[..3], &cues[..]);
        assert!(out.steps < cfg.t_max - 1, "run should truncate on success");
    }

    #[test]
    fn winner_count_never_exceeds_one() {
        let g = cheese_graph();
        let (cues, target) = cheese_puzzle(&g);
        let cfg = NetworkConfig {
            max_visited: 8,
            ..NetworkConfig::default()
        }
        .with_seed(11);

        let mut net = DynamicalNetwork::new(&g, cfg).unwrap();
        let out = net.run(&cues, target).unwrap();

        for &y in &out.trace.winner_count {
            assert!(y <= 1.0);
        }
        for t in 0..out.trace.winner.steps() {
            let active: f32 = out.trace.winner.row(t).iter().sum();
            assert!(active <= 1.0);
        }
    }

    #[test]
    fn visited_nodes_are_unique() {
        let g = cheese_graph();
        let (cues, target) = cheese_puzzle(&g);
        let cfg = NetworkConfig {
            max_visited: 6,
            ..NetworkConfig::default()
        }
        .with_seed(5);

        let mut net = DynamicalNetwork::new(&g, cfg).unwrap();
        let out = net.run(&cues, target).unwrap();

        let mut dedup = out.visited.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), out.visited.len());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let g = cheese_graph();
        let (cues, target) = cheese_puzzle(&g);
        let cfg = NetworkConfig {
            max_visited: 8,
            ..NetworkConfig::default()
        }
        .with_seed(42);

        let a = DynamicalNetwork::new(&g, cfg).unwrap().run(&cues, target).unwrap();
        let b = DynamicalNetwork::new(&g, cfg).unwrap().run(&cues, target).unwrap();

        assert_eq!(a.visited, b.visited);
        assert_eq!(a.steps, b.steps);
        assert_eq!(a.final_activity(), b.final_activity());
    }

    #[test]
    fn exact_tie_without_noise_exhausts_retries() {
        // Two neighbors with identical weights and zero noise cross the WTA
        // threshold in the same step, every attempt.
        let mut b = AssociationGraph::builder();
        b.add_edge("cue", "left", 0.3);
        b.add_edge("cue", "right", 0.3);
        let g = b.build().unwrap();

        let cue = g.node("cue").unwrap();
        let target = g.node("right").unwrap();
        let cfg = NetworkConfig {
            max_visited: 3,
            noise_amp: 0.0,
            max_retries: 2,
            ..NetworkConfig::default()
        }
        .with_seed(1);

        let mut net = DynamicalNetwork::new(&g, cfg).unwrap();
        let err = net.run(&[cue], target).unwrap_err();
        assert!(matches!(
            err,
            EngineError::RetriesExhausted { attempts: 3 }
        ));
    }

    #[test]
    fn unreachable_target_runs_to_the_duration_bound() {
        let mut b = AssociationGraph::builder();
        b.add_edge("cue", "next", 0.4);
        b.add_word("island");
        let g = b.build().unwrap();

        let cfg = NetworkConfig {
            max_visited: 4,
            t_max: 2_000,
            ..NetworkConfig::default()
        }
        .with_seed(9);

        let mut net = DynamicalNetwork::new(&g, cfg).unwrap();
        let out = net
            .run(&[g.node("cue").unwrap()], g.node("island").unwrap())
            .unwrap();

        assert!(!out.solved());
        assert_eq!(out.steps, cfg.t_max - 1);
    }

    #[test]
    fn rejects_bad_configuration() {
        let g = cheese_graph();
        let zero_budget = NetworkConfig {
            max_visited: 0,
            ..NetworkConfig::default()
        };
        assert!(DynamicalNetwork::new(&g, zero_budget).is_err());

        let short_dwell = NetworkConfig {
            stim_len: 2,
            ..NetworkConfig::default()
        };
        assert!(DynamicalNetwork::new(&g, short_dwell).is_err());

        let short_run = NetworkConfig {
            t_max: 100,
            ..NetworkConfig::default()
        };
        let (cues, target) = cheese_puzzle(&g);
        let mut net = DynamicalNetwork::new(&g, short_run).unwrap();
        assert!(matches!(
            net.run(&cues, target),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn network_and_search_agree_on_visit_order() {
        let g = cheese_graph();
        let (cues, target) = cheese_puzzle(&g);

        let alg = search(
            &g,
            &cues,
            target,
            &SearchParams {
                threshold: 0.0,
                max_visited: 8,
            },
        )
        .unwrap();

        let cfg = NetworkConfig {
            max_visited: 8,
            ..NetworkConfig::default()
        }
        .with_seed(42);
        let out = DynamicalNetwork::new(&g, cfg).unwrap().run(&cues, target).unwrap();

        assert_eq!(out.visited, alg.visited);
        assert_eq!(out.target_position(), alg.target_position(target));
    }
}
