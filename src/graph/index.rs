//! Directed token graph backed by petgraph with a DashMap node index.
//!
//! Nodes are [`TokenId`]s; an edge `a → b` means `b` directly followed `a`
//! in some sentence. Edge weights carry the unordered [`PairId`] so both
//! directions of one pair point at the same record.

use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::id::{PairId, TokenId};

/// Directed adjacency over tokens.
pub struct TokenGraph {
    graph: RwLock<DiGraph<TokenId, PairId>>,
    /// TokenId → NodeIndex mapping for O(1) node lookups.
    node_index: DashMap<TokenId, NodeIndex>,
    edge_count: AtomicUsize,
}

impl TokenGraph {
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(DiGraph::new()),
            node_index: DashMap::new(),
            edge_count: AtomicUsize::new(0),
        }
    }

    /// Ensure a node exists for the given token, returning its NodeIndex.
    fn ensure_node(&self, token: TokenId) -> NodeIndex {
        if let Some(idx) = self.node_index.get(&token) {
            return *idx.value();
        }
        let mut graph = self.graph.write().expect("graph lock poisoned");
        // Double-check after acquiring write lock
        if let Some(idx) = self.node_index.get(&token) {
            return *idx.value();
        }
        let idx = graph.add_node(token);
        self.node_index.insert(token, idx);
        idx
    }

    /// Record the direction `from → to`. Adding a known direction is a no-op.
    pub fn add_edge(&self, from: TokenId, to: TokenId, pair: PairId) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);
        let mut graph = self.graph.write().expect("graph lock poisoned");
        if graph.find_edge(from_idx, to_idx).is_none() {
            graph.add_edge(from_idx, to_idx, pair);
            self.edge_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn has_edge(&self, from: TokenId, to: TokenId) -> bool {
        let (Some(from_idx), Some(to_idx)) = (self.node(from), self.node(to)) else {
            return false;
        };
        let graph = self.graph.read().expect("graph lock poisoned");
        graph.find_edge(from_idx, to_idx).is_some()
    }

    /// Tokens that directly follow `token`.
    pub fn successors(&self, token: TokenId) -> Vec<TokenId> {
        self.neighbors(token, Direction::Outgoing)
    }

    /// Tokens that `token` directly follows.
    pub fn predecessors(&self, token: TokenId) -> Vec<TokenId> {
        self.neighbors(token, Direction::Incoming)
    }

    fn neighbors(&self, token: TokenId, direction: Direction) -> Vec<TokenId> {
        let Some(idx) = self.node(token) else {
            return vec![];
        };
        let graph = self.graph.read().expect("graph lock poisoned");
        graph
            .neighbors_directed(idx, direction)
            .filter_map(|n| graph.node_weight(n).copied())
            .collect()
    }

    fn node(&self, token: TokenId) -> Option<NodeIndex> {
        self.node_index.get(&token).map(|r| *r.value())
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        let mut graph = self.graph.write().expect("graph lock poisoned");
        graph.clear();
        self.node_index.clear();
        self.edge_count.store(0, Ordering::Relaxed);
    }
}

impl Default for TokenGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGraph")
            .field("nodes", &self.node_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(id: u64) -> TokenId {
        TokenId::new(id).unwrap()
    }

    fn pair(id: u64) -> PairId {
        PairId::new(id).unwrap()
    }

    #[test]
    fn edges_are_directed() {
        let g = TokenGraph::new();
        g.add_edge(tok(1), tok(2), pair(1));
        assert!(g.has_edge(tok(1), tok(2)));
        assert!(!g.has_edge(tok(2), tok(1)));
        assert_eq!(g.successors(tok(1)), vec![tok(2)]);
        assert_eq!(g.predecessors(tok(2)), vec![tok(1)]);
        assert!(g.successors(tok(2)).is_empty());
    }

    #[test]
    fn duplicate_edge_is_ignored() {
        let g = TokenGraph::new();
        g.add_edge(tok(1), tok(2), pair(1));
        g.add_edge(tok(1), tok(2), pair(1));
        g.add_edge(tok(2), tok(1), pair(1));
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn unknown_tokens_have_no_neighbors() {
        let g = TokenGraph::new();
        assert!(!g.has_edge(tok(7), tok(8)));
        assert!(g.successors(tok(7)).is_empty());
    }

    #[test]
    fn clear_drops_everything() {
        let g = TokenGraph::new();
        g.add_edge(tok(1), tok(2), pair(1));
        g.clear();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(!g.has_edge(tok(1), tok(2)));
    }
}
