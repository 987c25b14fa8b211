//! VF2-style subgraph matching.
//!
//! A search state is a partial mapping from pattern atoms to master atoms.
//! States are extended one pair at a time, pruning with semantic, core and
//! look-ahead rules, and undone on backtrack. Matches are induced: two
//! mapped pattern atoms are bonded iff their images are.
//!
//! The search is driven by [`Embeddings`], an iterator holding an explicit
//! stack of frames, so that a consumer can stop after the first complete
//! mapping ([`Matcher::is_sub`]) or exhaust the search
//! ([`Matcher::sub_count`]) without recursion.

use bit_set::BitSet;
use petgraph::{
    graph::{Graph, NodeIndex},
    Undirected,
};

use crate::molecule::{Atom, AtomLike, Index, Molecule};

type Node = NodeIndex<Index>;

/// A complete embedding as `(pattern atom, master atom)` pairs of 1-based
/// atom numbers, ordered by pattern atom.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mapping {
    pairs: Vec<(u32, u32)>,
}

impl Mapping {
    pub fn pairs(&self) -> &[(u32, u32)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Return the master atom that `pattern` is mapped to.
    pub fn get(&self, pattern: u32) -> Option<u32> {
        self.pairs
            .iter()
            .find_map(|&(p, m)| (p == pattern).then_some(m))
    }
}

struct VF2State<'a, N, E> {
    pattern: &'a Graph<N, E, Undirected, Index>,
    master: &'a Graph<N, E, Undirected, Index>,
    pattern_map: Vec<Option<Node>>,
    master_map: Vec<Option<Node>>,
    pattern_mapped: BitSet,
    master_mapped: BitSet,
    depth: usize,
}

impl<'a, N: AtomLike, E> VF2State<'a, N, E> {
    fn new(
        pattern: &'a Graph<N, E, Undirected, Index>,
        master: &'a Graph<N, E, Undirected, Index>,
    ) -> Self {
        Self {
            pattern,
            master,
            pattern_map: vec![None; pattern.node_count()],
            master_map: vec![None; master.node_count()],
            pattern_mapped: BitSet::with_capacity(pattern.node_count()),
            master_mapped: BitSet::with_capacity(master.node_count()),
            depth: 0,
        }
    }

    fn is_covering(&self) -> bool {
        self.depth == self.pattern.node_count()
    }

    fn is_feasible(&self, p: Node, m: Node) -> bool {
        self.semantic_rule(p, m) && self.core_rule(p, m) && self.look_ahead_rule(p, m)
    }

    /// Same element and same hybridization.
    fn semantic_rule(&self, p: Node, m: Node) -> bool {
        let (a, b) = (&self.pattern[p], &self.master[m]);
        a.element() == b.element() && a.hybridization() == b.hybridization()
    }

    /// The mapped neighbors of `p` go exactly to the mapped neighbors of
    /// `m`.
    fn core_rule(&self, p: Node, m: Node) -> bool {
        for n in self.pattern.neighbors(p) {
            if let Some(image) = self.pattern_map[n.index()] {
                if !self.master.contains_edge(m, image) {
                    return false;
                }
            }
        }

        for n in self.master.neighbors(m) {
            if let Some(preimage) = self.master_map[n.index()] {
                if !self.pattern.contains_edge(p, preimage) {
                    return false;
                }
            }
        }

        true
    }

    /// Adding `(p, m)` must leave the master with at least as many frontier
    /// atoms, and at least as many atoms beyond the frontier, as the pattern.
    /// Locally, `m` needs at least as many unmapped neighbors as `p` in both
    /// regions.
    fn look_ahead_rule(&self, p: Node, m: Node) -> bool {
        self.frontier_rule(p, m) && self.neighbor_rule(p, m)
    }

    fn frontier_rule(&self, p: Node, m: Node) -> bool {
        let (p_terminal, p_remainder) = region_sizes(self.pattern, &self.pattern_mapped, p);
        let (m_terminal, m_remainder) = region_sizes(self.master, &self.master_mapped, m);

        m_terminal >= p_terminal && m_remainder >= p_remainder
    }

    fn neighbor_rule(&self, p: Node, m: Node) -> bool {
        let pattern_frontier = frontier(self.pattern, &self.pattern_mapped);
        let master_frontier = frontier(self.master, &self.master_mapped);

        let (p_terminal, p_remainder) =
            neighbor_counts(self.pattern, p, &self.pattern_mapped, &pattern_frontier);
        let (m_terminal, m_remainder) =
            neighbor_counts(self.master, m, &self.master_mapped, &master_frontier);

        m_terminal >= p_terminal && m_remainder >= p_remainder
    }

    fn push_mapping(&mut self, p: Node, m: Node) {
        self.pattern_map[p.index()] = Some(m);
        self.master_map[m.index()] = Some(p);
        self.pattern_mapped.insert(p.index());
        self.master_mapped.insert(m.index());
        self.depth += 1;
    }

    fn pop_mapping(&mut self, p: Node, m: Node) {
        self.pattern_map[p.index()] = None;
        self.master_map[m.index()] = None;
        self.pattern_mapped.remove(p.index());
        self.master_mapped.remove(m.index());
        self.depth -= 1;
    }

    /// Pair the smallest pattern frontier atom with every master frontier
    /// atom. With either frontier empty, pair the smallest unmapped pattern
    /// atom with every unmapped master atom.
    fn generate_pairs(&self) -> Vec<(Node, Node)> {
        let pattern_frontier = frontier(self.pattern, &self.pattern_mapped);
        let master_frontier = frontier(self.master, &self.master_mapped);

        if let (Some(p), false) = (pattern_frontier.iter().next(), master_frontier.is_empty()) {
            return master_frontier
                .iter()
                .map(|m| (Node::new(p), Node::new(m)))
                .collect();
        }

        let Some(p) = (0..self.pattern.node_count()).find(|i| !self.pattern_mapped.contains(*i))
        else {
            return Vec::new();
        };
        (0..self.master.node_count())
            .filter(|i| !self.master_mapped.contains(*i))
            .map(|m| (Node::new(p), Node::new(m)))
            .collect()
    }

    fn mapping(&self) -> Mapping {
        Mapping {
            pairs: self
                .pattern_map
                .iter()
                .enumerate()
                .filter_map(|(p, m)| m.map(|m| (p as u32 + 1, m.index() as u32 + 1)))
                .collect(),
        }
    }
}

/// Unmapped nodes adjacent to a mapped node.
fn frontier<N, E>(graph: &Graph<N, E, Undirected, Index>, mapped: &BitSet) -> BitSet {
    let mut out = BitSet::with_capacity(graph.node_count());
    for i in mapped.iter() {
        for n in graph.neighbors(Node::new(i)) {
            if !mapped.contains(n.index()) {
                out.insert(n.index());
            }
        }
    }
    out
}

/// Sizes of the frontier and of the rest of the unmapped graph once `node`
/// is mapped as well.
fn region_sizes<N, E>(
    graph: &Graph<N, E, Undirected, Index>,
    mapped: &BitSet,
    node: Node,
) -> (usize, usize) {
    let mut mapped = mapped.clone();
    mapped.insert(node.index());
    let terminal = frontier(graph, &mapped).len();
    (terminal, graph.node_count() - mapped.len() - terminal)
}

/// Count the unmapped neighbors of `node` on the frontier and beyond it.
fn neighbor_counts<N, E>(
    graph: &Graph<N, E, Undirected, Index>,
    node: Node,
    mapped: &BitSet,
    frontier: &BitSet,
) -> (usize, usize) {
    let mut terminal = 0;
    let mut remainder = 0;
    for n in graph.neighbors(node) {
        if mapped.contains(n.index()) {
            continue;
        }
        if frontier.contains(n.index()) {
            terminal += 1;
        } else {
            remainder += 1;
        }
    }
    (terminal, remainder)
}

struct Frame {
    candidates: Vec<(Node, Node)>,
    next: usize,
    applied: Option<(Node, Node)>,
}

impl Frame {
    fn new(candidates: Vec<(Node, Node)>) -> Self {
        Self {
            candidates,
            next: 0,
            applied: None,
        }
    }
}

/// Lazily yields every embedding of the pattern into the master. Dropping
/// the iterator early abandons the search.
pub struct Embeddings<'a, N, E> {
    state: VF2State<'a, N, E>,
    stack: Vec<Frame>,
    started: bool,
}

impl<'a, N: AtomLike, E> Iterator for Embeddings<'a, N, E> {
    type Item = Mapping;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if self.state.pattern.node_count() == 0 {
                return Some(self.state.mapping());
            }
            if self.state.pattern.node_count() > self.state.master.node_count() {
                return None;
            }
            self.stack.push(Frame::new(self.state.generate_pairs()));
        }

        while let Some(frame) = self.stack.last_mut() {
            // Undo the pair tried last in this frame.
            if let Some((p, m)) = frame.applied.take() {
                self.state.pop_mapping(p, m);
            }

            let Some(&(p, m)) = frame.candidates.get(frame.next) else {
                self.stack.pop();
                continue;
            };
            frame.next += 1;

            if !self.state.is_feasible(p, m) {
                continue;
            }
            self.state.push_mapping(p, m);
            frame.applied = Some((p, m));

            if self.state.is_covering() {
                return Some(self.state.mapping());
            }
            let candidates = self.state.generate_pairs();
            self.stack.push(Frame::new(candidates));
        }

        None
    }
}

/// Decides and counts embeddings of a pattern graph into a master graph.
pub struct Matcher<'a, N, E> {
    pattern: &'a Graph<N, E, Undirected, u32>,
    master: &'a Graph<N, E, Undirected, u32>,
}

impl<'a> Matcher<'a, Atom, ()> {
    /// Match one molecule inside another.
    pub fn new(pattern: &'a Molecule, master: &'a Molecule) -> Self {
        Self::from_graphs(pattern.graph(), master.graph())
    }
}

impl<'a, N: AtomLike, E> Matcher<'a, N, E> {
    pub fn from_graphs(
        pattern: &'a Graph<N, E, Undirected, u32>,
        master: &'a Graph<N, E, Undirected, u32>,
    ) -> Self {
        Self { pattern, master }
    }

    /// Return a lazy iterator over all embeddings.
    pub fn embeddings(&self) -> Embeddings<'a, N, E> {
        Embeddings {
            state: VF2State::new(self.pattern, self.master),
            stack: Vec::new(),
            started: false,
        }
    }

    /// Return `true` if at least one embedding exists.
    pub fn is_sub(&self) -> bool {
        self.embeddings().next().is_some()
    }

    /// Return the number of distinct embeddings.
    pub fn sub_count(&self) -> usize {
        self.embeddings().count()
    }
}
