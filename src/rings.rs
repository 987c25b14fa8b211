//! Minimum cycle basis of a molecular graph.
//!
//! Cycles are handled as bit sets over edge indices, so that the symmetric
//! difference of two cycles is a bitwise XOR and independence is decided by
//! Gaussian elimination over GF(2). Candidates are the shortest cycle
//! through each edge, taken shortest first while they add to the rank. When
//! those do not span the cycle space, the fundamental cycles of a
//! breadth-first tree rooted at every atom are added and the selection is
//! rerun; that set contains Horton's candidates, so the result is still a
//! minimum basis.

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    fmt::Display,
    str::FromStr,
};

use bit_set::BitSet;
use log::{debug, warn};
use petgraph::{
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};

use crate::{
    error::ParseError,
    molecule::{AtomLike, Element, Index, MGraph, Molecule},
};

/// One ring of the basis: atom numbers in the order they are met walking
/// around the cycle, starting from the smallest and heading to its smaller
/// neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ring {
    atoms: Vec<u32>,
}

impl Ring {
    pub fn atoms(&self) -> &[u32] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Return the elements around this ring, in walk order.
    pub fn word(&self, mol: &Molecule) -> RingWord {
        RingWord(
            self.atoms
                .iter()
                .filter_map(|&i| mol.atom(i))
                .map(|atom| atom.element())
                .collect(),
        )
    }

    /// Turn an edge bit set into a ring. Falls back to sorted atom numbers
    /// if the edges do not form a single simple cycle.
    fn from_cycle(graph: &MGraph, cycle: &BitSet) -> Self {
        let mut adjacent: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for e in cycle.iter() {
            if let Some((a, b)) = graph.edge_endpoints(EdgeIndex::new(e)) {
                let (a, b) = (atom_number(a), atom_number(b));
                adjacent.entry(a).or_default().push(b);
                adjacent.entry(b).or_default().push(a);
            }
        }

        let atoms = walk(&adjacent).unwrap_or_else(|| adjacent.keys().copied().collect());
        Self { atoms }
    }
}

fn walk(adjacent: &BTreeMap<u32, Vec<u32>>) -> Option<Vec<u32>> {
    if adjacent.values().any(|n| n.len() != 2) {
        return None;
    }

    let (&start, first) = adjacent.iter().next()?;
    let mut ring = vec![start];
    let (mut prev, mut node) = (start, first[0].min(first[1]));
    while node != start {
        ring.push(node);
        let neighbors = adjacent.get(&node)?;
        let next = if neighbors[0] == prev {
            neighbors[1]
        } else {
            neighbors[0]
        };
        (prev, node) = (node, next);
    }

    (ring.len() == adjacent.len()).then_some(ring)
}

/// The element sequence of a ring. Two words describe the same kind of
/// ring if one is a rotation or reflection of the other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RingWord(Vec<Element>);

impl RingWord {
    pub fn new(elements: Vec<Element>) -> Self {
        Self(elements)
    }

    pub fn elements(&self) -> &[Element] {
        &self.0
    }

    /// Return the representative of this word's class: the rotation or
    /// reflection whose symbols sort first.
    pub fn canonical(&self) -> Self {
        let symbols = |w: &[Element]| w.iter().map(Element::symbol).collect::<Vec<_>>();
        let reversed: Vec<Element> = self.0.iter().rev().copied().collect();

        let mut best = self.0.clone();
        for word in [&self.0, &reversed] {
            for r in 0..word.len() {
                let rotated: Vec<Element> = word[r..].iter().chain(&word[..r]).copied().collect();
                if symbols(&rotated) < symbols(&best) {
                    best = rotated;
                }
            }
        }
        Self(best)
    }
}

impl Display for RingWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for element in &self.0 {
            write!(f, "{}", element.symbol())?;
        }
        Ok(())
    }
}

impl FromStr for RingWord {
    type Err = ParseError;

    /// Parse a run of element symbols such as `CCCCCN` or `CCOCl`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut elements = Vec::new();
        let mut rest = s.trim();
        while let Some(c) = rest.chars().next() {
            if !c.is_ascii_uppercase() {
                return Err(ParseError::UnknownElement(rest.to_string()));
            }
            let len = 1 + rest[1..]
                .chars()
                .take_while(|l| l.is_ascii_lowercase())
                .count();
            let symbol = &rest[..len];
            let element = symbol
                .parse::<Element>()
                .map_err(|_| ParseError::UnknownElement(symbol.to_string()))?;
            elements.push(element);
            rest = &rest[len..];
        }

        if elements.is_empty() {
            return Err(ParseError::UnknownElement(s.to_string()));
        }
        Ok(Self(elements))
    }
}

/// Return the number of independent cycles: the non-tree edges of a
/// depth-first spanning forest, i.e. `|E| - |V| + 1` for a connected
/// molecule.
pub fn ring_count_target(mol: &Molecule) -> usize {
    let graph = mol.graph();
    SpanningForest::depth_first(graph)
        .non_tree_edges(graph)
        .count()
}

/// Compute a minimum cycle basis. Disconnected molecules are not supported
/// and yield no rings.
pub fn minimum_cycle_basis(mol: &Molecule) -> Vec<Ring> {
    let graph = mol.graph();
    let target = ring_count_target(mol);
    if target == 0 {
        return Vec::new();
    }
    if !mol.is_connected() {
        warn!(
            "{} is disconnected; ring perception skipped",
            mol.inchi().unwrap_or("molecule")
        );
        return Vec::new();
    }

    let mut candidates: Vec<BitSet> = graph
        .edge_indices()
        .filter_map(|e| shortest_cycle_through(graph, e))
        .collect();
    candidates.sort_by_key(|c| c.len());
    let mut basis = select(&candidates, target);

    if basis.len() < target {
        debug!(
            "shortest cycles give {} of {target} rings; adding tree cycles",
            basis.len()
        );
        for root in graph.node_indices() {
            let tree = SpanningForest::breadth_first(graph, root);
            candidates.extend(
                tree.non_tree_edges(graph)
                    .filter_map(|e| tree.cycle_through(graph, e)),
            );
        }
        candidates.sort_by_key(|c| c.len());
        basis = select(&candidates, target);
    }

    debug!("found {} of {target} rings", basis.len());
    basis.iter().map(|c| Ring::from_cycle(graph, c)).collect()
}

/// Return one ring per non-tree edge of a depth-first spanning forest.
/// These always form a basis, though not necessarily a minimum one.
pub fn fundamental_rings(mol: &Molecule) -> Vec<Ring> {
    let graph = mol.graph();
    let forest = SpanningForest::depth_first(graph);
    forest
        .non_tree_edges(graph)
        .filter_map(|e| forest.cycle_through(graph, e))
        .map(|c| Ring::from_cycle(graph, &c))
        .collect()
}

fn atom_number(node: NodeIndex<Index>) -> u32 {
    node.index() as u32 + 1
}

/// Edges incident to `node`, each paired with the node at its other end.
fn incident(
    graph: &MGraph,
    node: NodeIndex<Index>,
) -> impl Iterator<Item = (EdgeIndex<Index>, NodeIndex<Index>)> + '_ {
    graph.edges(node).map(move |e| {
        let next = if e.source() == node {
            e.target()
        } else {
            e.source()
        };
        (e.id(), next)
    })
}

/// Breadth-first search for the shortest path between the endpoints of
/// `edge` that avoids `edge` itself. The path plus the edge is a cycle.
fn shortest_cycle_through(graph: &MGraph, edge: EdgeIndex<Index>) -> Option<BitSet> {
    let (start, goal) = graph.edge_endpoints(edge)?;

    let mut via = vec![None; graph.node_count()];
    let mut seen = BitSet::with_capacity(graph.node_count());
    let mut queue = VecDeque::from([start]);
    seen.insert(start.index());

    while let Some(node) = queue.pop_front() {
        if node == goal {
            break;
        }
        for (e, next) in incident(graph, node) {
            if e == edge || !seen.insert(next.index()) {
                continue;
            }
            via[next.index()] = Some((node, e));
            queue.push_back(next);
        }
    }
    if !seen.contains(goal.index()) {
        return None;
    }

    let mut cycle = BitSet::with_capacity(graph.edge_count());
    cycle.insert(edge.index());
    let mut node = goal;
    while let Some((prev, e)) = via[node.index()] {
        cycle.insert(e.index());
        node = prev;
    }
    Some(cycle)
}

/// Greedily take candidates, in order, that are independent of the ones
/// already taken.
fn select(candidates: &[BitSet], target: usize) -> Vec<BitSet> {
    let mut space = CycleSpace::default();
    let mut basis = Vec::with_capacity(target);
    for cycle in candidates {
        if basis.len() == target {
            break;
        }
        if space.insert(cycle) {
            basis.push(cycle.clone());
        }
    }
    basis
}

/// Row-reduced cycle vectors over GF(2), keyed by their lowest set bit.
#[derive(Default)]
struct CycleSpace {
    rows: HashMap<usize, BitSet>,
}

impl CycleSpace {
    /// Add `cycle` if it is independent of the rows so far. Returns `true`
    /// if the rank went up.
    fn insert(&mut self, cycle: &BitSet) -> bool {
        let mut v = cycle.clone();
        loop {
            let Some(pivot) = v.iter().next() else {
                return false;
            };
            if let Some(row) = self.rows.get(&pivot) {
                v.symmetric_difference_with(row);
                continue;
            }
            self.rows.insert(pivot, v);
            return true;
        }
    }
}

/// A spanning forest stored as parent links.
struct SpanningForest {
    parent: Vec<Option<(NodeIndex<Index>, EdgeIndex<Index>)>>,
    tree: BitSet,
}

impl SpanningForest {
    fn empty(graph: &MGraph) -> Self {
        Self {
            parent: vec![None; graph.node_count()],
            tree: BitSet::with_capacity(graph.edge_count()),
        }
    }

    /// Depth-first forest, each tree rooted at its lowest-numbered atom.
    fn depth_first(graph: &MGraph) -> Self {
        let mut forest = Self::empty(graph);
        let mut visited = BitSet::with_capacity(graph.node_count());

        for root in graph.node_indices() {
            let mut stack = vec![(root, None)];
            while let Some((node, via)) = stack.pop() {
                if !visited.insert(node.index()) {
                    continue;
                }
                if let Some((from, edge)) = via {
                    forest.link(node, from, edge);
                }
                for (edge, next) in incident(graph, node) {
                    if !visited.contains(next.index()) {
                        stack.push((next, Some((node, edge))));
                    }
                }
            }
        }
        forest
    }

    /// Breadth-first tree of the component containing `root`.
    fn breadth_first(graph: &MGraph, root: NodeIndex<Index>) -> Self {
        let mut forest = Self::empty(graph);
        let mut visited = BitSet::with_capacity(graph.node_count());
        let mut queue = VecDeque::from([root]);
        visited.insert(root.index());

        while let Some(node) = queue.pop_front() {
            for (edge, next) in incident(graph, node) {
                if visited.insert(next.index()) {
                    forest.link(next, node, edge);
                    queue.push_back(next);
                }
            }
        }
        forest
    }

    fn link(&mut self, node: NodeIndex<Index>, parent: NodeIndex<Index>, edge: EdgeIndex<Index>) {
        self.parent[node.index()] = Some((parent, edge));
        self.tree.insert(edge.index());
    }

    fn path_to_root(&self, mut node: NodeIndex<Index>) -> BitSet {
        let mut path = BitSet::new();
        while let Some((up, edge)) = self.parent[node.index()] {
            path.insert(edge.index());
            node = up;
        }
        path
    }

    /// Edges not in the forest. Only meaningful within the spanned
    /// component for a breadth-first tree.
    fn non_tree_edges<'a>(
        &'a self,
        graph: &'a MGraph,
    ) -> impl Iterator<Item = EdgeIndex<Index>> + 'a {
        graph.edge_indices().filter(|e| !self.tree.contains(e.index()))
    }

    /// The cycle closed by a non-tree edge. The two root paths share their
    /// upper part, which cancels out.
    fn cycle_through(&self, graph: &MGraph, edge: EdgeIndex<Index>) -> Option<BitSet> {
        let (a, b) = graph.edge_endpoints(edge)?;
        let mut cycle = self.path_to_root(a);
        cycle.symmetric_difference_with(&self.path_to_root(b));
        cycle.insert(edge.index());
        Some(cycle)
    }
}
