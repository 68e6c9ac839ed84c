use std::collections::HashMap;

use crate::error::EnumerationError;

pub mod cycles;

/// Directed graph with interned string labels.
///
/// Node ids are dense `usize` values assigned in first-seen order, so the
/// same input text always produces the same ids. Adjacency lists are kept
/// sorted and deduplicated; multiple declarations of the same node or edge
/// collapse to one.
#[derive(Debug, Default)]
pub struct DiGraph {
    labels: Vec<String>,
    ids: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
}

impl DiGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `label`, interning it if unseen.
    pub fn add_node(&mut self, label: &str) -> usize {
        if let Some(&id) = self.ids.get(label) {
            return id;
        }
        let id = self.labels.len();
        self.labels.push(label.to_string());
        self.ids.insert(label.to_string(), id);
        self.adjacency.push(Vec::new());
        id
    }

    /// Adds the directed edge `from -> to`, interning both endpoints.
    /// Duplicate edges collapse; self-loops are kept.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        let successors = &mut self.adjacency[from];
        if let Err(pos) = successors.binary_search(&to) {
            successors.insert(pos, to);
        }
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn label(&self, node: usize) -> &str {
        &self.labels[node]
    }

    pub fn node_id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    /// Successors of `node`, sorted ascending by id.
    pub fn neighbors(&self, node: usize) -> &[usize] {
        &self.adjacency[node]
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.adjacency
            .get(from)
            .is_some_and(|successors| successors.binary_search(&to).is_ok())
    }

    /// Checks the structural invariants enumeration relies on.
    pub fn validate(&self) -> Result<(), EnumerationError> {
        let n = self.labels.len();
        if self.adjacency.len() != n {
            return Err(EnumerationError::CorruptGraph(format!(
                "{} adjacency rows for {} nodes",
                self.adjacency.len(),
                n
            )));
        }
        if self.ids.len() != n {
            return Err(EnumerationError::CorruptGraph(format!(
                "{} interned labels for {} nodes",
                self.ids.len(),
                n
            )));
        }
        for (node, successors) in self.adjacency.iter().enumerate() {
            for window in successors.windows(2) {
                if window[0] >= window[1] {
                    return Err(EnumerationError::CorruptGraph(format!(
                        "adjacency of node {node} is not sorted and deduplicated"
                    )));
                }
            }
            if let Some(&last) = successors.last() {
                if last >= n {
                    return Err(EnumerationError::CorruptGraph(format!(
                        "edge {node} -> {last} points past the last node"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DiGraph;

    #[test]
    fn repeated_node_declarations_collapse() {
        let mut graph = DiGraph::new();
        let a = graph.add_node("a");
        let again = graph.add_node("a");
        assert_eq!(a, again);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = DiGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn neighbors_are_sorted_by_id() {
        let mut graph = DiGraph::new();
        graph.add_edge("a", "c");
        graph.add_edge("a", "b");
        let a = graph.node_id("a").unwrap();
        let b = graph.node_id("b").unwrap();
        let c = graph.node_id("c").unwrap();
        assert_eq!(graph.neighbors(a), &[b, c]);
    }

    #[test]
    fn self_loop_is_kept() {
        let mut graph = DiGraph::new();
        graph.add_edge("a", "a");
        let a = graph.node_id("a").unwrap();
        assert!(graph.has_edge(a, a));
    }

    #[test]
    fn ids_follow_first_seen_order() {
        let mut graph = DiGraph::new();
        graph.add_edge("z", "a");
        graph.add_edge("a", "m");
        assert_eq!(graph.label(0), "z");
        assert_eq!(graph.label(1), "a");
        assert_eq!(graph.label(2), "m");
    }

    #[test]
    fn validate_accepts_ingested_graph() {
        let mut graph = DiGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "a");
        assert!(graph.validate().is_ok());
    }
}
