use hashbrown::HashMap;

use crate::error::{EngineError, Result};

pub type NodeId = usize;

/// Read-only word-association graph: a dense N x N non-negative weight matrix
/// plus a bijective word <-> index mapping.
///
/// Built once, then shared by reference into both engines. Nothing in this
/// crate mutates a graph after construction, so sharing it across parallel
/// puzzle runs is safe.
#[derive(Debug, Clone)]
pub struct AssociationGraph {
    n: usize,
    // Row-major: weights[j * n + i] is the strength of j -> i.
    weights: Vec<f32>,
    words: Vec<String>,
    index: HashMap<String, NodeId>,
}

impl AssociationGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// Build a graph from a full matrix given as rows. The matrix must be
    /// square, match the vocabulary size, and carry no negative weights.
    pub fn from_rows(words: Vec<String>, rows: Vec<Vec<f32>>) -> Result<Self> {
        let n = words.len();
        if rows.len() != n {
            return Err(EngineError::InvalidParameter(
                "weight matrix dimension does not match vocabulary size",
            ));
        }

        let mut weights = Vec::with_capacity(n * n);
        for row in &rows {
            if row.len() != n {
                return Err(EngineError::InvalidParameter("weight matrix is not square"));
            }
            for &w in row {
                if w < 0.0 || !w.is_finite() {
                    return Err(EngineError::InvalidParameter(
                        "association weights must be finite and non-negative",
                    ));
                }
                weights.push(w);
            }
        }

        let mut index = HashMap::with_capacity(n);
        for (id, word) in words.iter().enumerate() {
            if index.insert(word.clone(), id).is_some() {
                return Err(EngineError::InvalidParameter("duplicate word in vocabulary"));
            }
        }

        Ok(Self {
            n,
            weights,
            words,
            index,
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn word(&self, id: NodeId) -> Option<&str> {
        self.words.get(id).map(|w| w.as_str())
    }

    pub fn node(&self, word: &str) -> Option<NodeId> {
        self.index.get(word).copied()
    }

    /// Like [`node`](Self::node), but a missing word is an error.
    pub fn require_node(&self, word: &str) -> Result<NodeId> {
        self.node(word)
            .ok_or_else(|| EngineError::MissingWord(word.to_string()))
    }

    /// Outgoing weights of node `j`, one entry per target node.
    pub fn row(&self, j: NodeId) -> &[f32] {
        &self.weights[j * self.n..(j + 1) * self.n]
    }

    pub fn weight(&self, j: NodeId, i: NodeId) -> f32 {
        self.weights[j * self.n + i]
    }

    pub fn max_weight(&self) -> f32 {
        self.weights.iter().fold(0.0f32, |m, &w| m.max(w))
    }
}

/// Incrementally interns words and collects directed edges; [`build`] produces
/// the dense matrix.
///
/// [`build`]: GraphBuilder::build
#[derive(Debug, Default)]
pub struct GraphBuilder {
    words: Vec<String>,
    index: HashMap<String, NodeId>,
    edges: Vec<(NodeId, NodeId, f32)>,
}

impl GraphBuilder {
    /// Intern a word, returning its node index. Repeated calls with the same
    /// word return the same index.
    pub fn add_word(&mut self, word: &str) -> NodeId {
        if let Some(&id) = self.index.get(word) {
            return id;
        }
        let id = self.words.len();
        self.words.push(word.to_string());
        self.index.insert(word.to_string(), id);
        id
    }

    /// Add a directed association `from -> to`, interning both words. A
    /// repeated edge accumulates weight.
    pub fn add_edge(&mut self, from: &str, to: &str, weight: f32) -> &mut Self {
        let j = self.add_word(from);
        let i = self.add_word(to);
        self.edges.push((j, i, weight));
        self
    }

    pub fn build(self) -> Result<AssociationGraph> {
        let n = self.words.len();
        let mut weights = vec![0.0f32; n * n];
        for (j, i, w) in self.edges {
            if w < 0.0 || !w.is_finite() {
                return Err(EngineError::InvalidParameter(
                    "association weights must be finite and non-negative",
                ));
            }
            weights[j * n + i] += w;
        }

        Ok(AssociationGraph {
            n,
            weights,
            words: self.words,
            index: self.index,
        })
    }
}

/// One puzzle item: three distinct cue nodes and a hidden target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Puzzle {
    pub cues: [NodeId; 3],
    pub target: NodeId,
}

impl Puzzle {
    pub fn new(cues: [NodeId; 3], target: NodeId) -> Result<Self> {
        if cues[0] == cues[1] || cues[0] == cues[2] || cues[1] == cues[2] {
            return Err(EngineError::InvalidPuzzle("cue nodes must be distinct"));
        }
        Ok(Self { cues, target })
    }

    /// Resolve a word-level puzzle against the vocabulary. Any missing word
    /// fails with [`EngineError::MissingWord`]; puzzles with missing words are
    /// expected to be excluded upstream, so this is the fail-fast path.
    pub fn from_words(graph: &AssociationGraph, cues: [&str; 3], target: &str) -> Result<Self> {
        let resolved = [
            graph.require_node(cues[0])?,
            graph.require_node(cues[1])?,
            graph.require_node(cues[2])?,
        ];
        let target = graph.require_node(target)?;
        Self::new(resolved, target)
    }
}
