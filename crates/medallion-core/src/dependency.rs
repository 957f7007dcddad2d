//! Dependency graph for ordering pipeline stages.
//!
//! Design:
//! - Forward edges: node -> nodes it depends on (waits for)
//! - Reverse edges: node -> nodes that depend on it (waiting nodes)
//! - Invariant: edges and reverse_edges must be kept in sync

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Dependency graph over any small, ordered node type (e.g. `Stage`).
///
/// - `edges`: node -> set of nodes it depends on
/// - `reverse_edges`: node -> set of nodes waiting for it
#[derive(Debug, Clone)]
pub struct DependencyGraph<N> {
    edges: HashMap<N, HashSet<N>>,
    reverse_edges: HashMap<N, HashSet<N>>,
}

impl<N: Copy + Eq + Hash + Ord> DependencyGraph<N> {
    /// 空の DependencyGraph を作成
    pub fn new() -> Self {
        Self {
            edges: HashMap::new(),
            reverse_edges: HashMap::new(),
        }
    }

    /// Add a dependency: `node` depends on `depends_on`.
    ///
    /// Example: add_dependency(silver, bronze) means "silver waits for bronze".
    pub fn add_dependency(&mut self, node: N, depends_on: N) {
        self.edges.entry(node).or_default().insert(depends_on);
        self.reverse_edges.entry(depends_on).or_default().insert(node);
    }

    /// Remove a dependency, keeping both edge maps in sync.
    pub fn remove_dependency(&mut self, node: N, depends_on: N) {
        if let Entry::Occupied(mut e) = self.edges.entry(node) {
            e.get_mut().remove(&depends_on);
            if e.get().is_empty() {
                e.remove_entry();
            }
        }
        if let Entry::Occupied(mut e) = self.reverse_edges.entry(depends_on) {
            e.get_mut().remove(&node);
            if e.get().is_empty() {
                e.remove_entry();
            }
        }
    }

    /// Nodes waiting for `completed`, in ascending order.
    ///
    /// Includes nodes that still have other unresolved dependencies.
    pub fn get_waiting_tasks(&self, completed: N) -> Vec<N> {
        let mut waiting: Vec<N> = self
            .reverse_edges
            .get(&completed)
            .map(|w| w.iter().copied().collect())
            .unwrap_or_default();
        waiting.sort();
        waiting
    }

    pub fn has_dependencies(&self, node: N) -> bool {
        self.edges.get(&node).is_some_and(|deps| !deps.is_empty())
    }

    /// Direct dependencies of `node`, in ascending order.
    pub fn get_dependencies(&self, node: N) -> Vec<N> {
        let mut deps: Vec<N> = self
            .edges
            .get(&node)
            .map(|d| d.iter().copied().collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Detect a cycle with a three-color DFS.
    ///
    /// Returns the nodes on the first cycle found (closing node repeated at the
    /// end), or `None` for a DAG.
    pub fn detect_cycle(&self) -> Option<Vec<N>> {
        let mut color: HashMap<N, Color> = HashMap::new();
        let mut path = Vec::new();
        for start in self.known_nodes() {
            if color.get(&start).copied().unwrap_or(Color::White) == Color::White {
                if let Some(cycle) = self.dfs_cycle(start, &mut color, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    fn dfs_cycle(
        &self,
        node: N,
        color: &mut HashMap<N, Color>,
        path: &mut Vec<N>,
    ) -> Option<Vec<N>> {
        color.insert(node, Color::Gray);
        path.push(node);
        for dep in self.get_dependencies(node) {
            match color.get(&dep).copied().unwrap_or(Color::White) {
                Color::Gray => {
                    let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Color::White => {
                    if let Some(cycle) = self.dfs_cycle(dep, color, path) {
                        return Some(cycle);
                    }
                }
                Color::Black => {}
            }
        }
        path.pop();
        color.insert(node, Color::Black);
        None
    }

    /// Execution order of `nodes` plus every node mentioned in an edge
    /// (Kahn's algorithm). Ready nodes are taken smallest first, so the order
    /// is deterministic.
    ///
    /// Returns the detected cycle on failure.
    pub fn topological_order(&self, nodes: &[N]) -> Result<Vec<N>, Vec<N>> {
        let mut all: BTreeSet<N> = nodes.iter().copied().collect();
        all.extend(self.known_nodes());

        let mut in_degree: HashMap<N, usize> = all
            .iter()
            .map(|n| (*n, self.get_dependencies(*n).len()))
            .collect();
        let mut ready: BTreeSet<N> = all
            .iter()
            .copied()
            .filter(|n| in_degree.get(n) == Some(&0))
            .collect();

        let mut order = Vec::with_capacity(all.len());
        while let Some(node) = ready.pop_first() {
            order.push(node);
            for waiting in self.get_waiting_tasks(node) {
                if let Some(degree) = in_degree.get_mut(&waiting) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(waiting);
                    }
                }
            }
        }

        if order.len() == all.len() {
            Ok(order)
        } else {
            Err(self.detect_cycle().unwrap_or_default())
        }
    }

    fn known_nodes(&self) -> BTreeSet<N> {
        self.edges
            .keys()
            .chain(self.reverse_edges.keys())
            .copied()
            .collect()
    }
}

impl<N: Copy + Eq + Hash + Ord> Default for DependencyGraph<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}
