//! Keyed directed graph with a cycle-tolerant topological sort.
//!
//! Nodes live in one insertion-ordered map and refer to each other by key,
//! so no node owns another and diamond or circular imports need no shared
//! ownership. Edges point from a dependent to what it depends on.

use indexmap::{IndexMap, IndexSet, map::Entry};
use log::trace;

use crate::error::GraphError;

/// Payloads carry their own unique key.
pub trait Keyed {
    fn key(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct Node<T> {
    content: T,
    dependencies: IndexSet<String>,
}

impl<T: Keyed> Node<T> {
    pub fn key(&self) -> &str {
        self.content.key()
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }

    /// Keys this node depends on, in the order the edges were added.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(String::as_str)
    }

    pub fn depends_on(&self, key: &str) -> bool {
        self.dependencies.contains(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

#[derive(Debug, Clone)]
pub struct Graph<T> {
    nodes: IndexMap<String, Node<T>>,
}

impl<T: Keyed> Default for Graph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Keyed> Graph<T> {
    pub fn new() -> Self {
        Self { nodes: IndexMap::new() }
    }

    /// Inserts `content`, or replaces the payload of the node already holding
    /// its key. Existing edges are kept either way.
    pub fn add_node(&mut self, content: T) -> &mut Node<T> {
        match self.nodes.entry(content.key().to_string()) {
            Entry::Occupied(entry) => {
                let node = entry.into_mut();
                node.content = content;
                node
            }
            Entry::Vacant(entry) => {
                entry.insert(Node { content, dependencies: IndexSet::new() })
            }
        }
    }

    /// Records that `from` depends on `to`. Returns `false` when the edge
    /// already existed.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<bool, GraphError> {
        if !self.nodes.contains_key(to) {
            return Err(GraphError::MissingNode { key: to.to_string() });
        }
        let node = self
            .nodes
            .get_mut(from)
            .ok_or_else(|| GraphError::MissingNode { key: from.to_string() })?;
        Ok(node.dependencies.insert(to.to_string()))
    }

    pub fn has_node(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn get_node(&self, key: &str) -> Option<&Node<T>> {
        self.nodes.get(key)
    }

    pub fn get_node_mut(&mut self, key: &str) -> Option<&mut Node<T>> {
        self.nodes.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependencies.len()).sum()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node<T>> {
        self.nodes.values()
    }

    /// Every node exactly once, dependencies before dependents.
    ///
    /// Depth-first from each unvisited node in insertion order, following
    /// edges in insertion order. A gray target is a back edge: it is not
    /// descended into again, so members of a cycle come out in the order
    /// the traversal finished them.
    pub fn top_sort(&self) -> Vec<&Node<T>> {
        let mut marks = vec![Mark::White; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        for start in 0..self.nodes.len() {
            if marks[start] != Mark::White {
                continue;
            }
            marks[start] = Mark::Gray;
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(&(idx, cursor)) = stack.last() {
                let node = &self.nodes[idx];
                let Some(dep_key) = node.dependencies.get_index(cursor) else {
                    marks[idx] = Mark::Black;
                    order.push(node);
                    stack.pop();
                    continue;
                };
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }

                match self.nodes.get_index_of(dep_key.as_str()) {
                    Some(dep) if marks[dep] == Mark::White => {
                        marks[dep] = Mark::Gray;
                        stack.push((dep, 0));
                    }
                    Some(dep) if marks[dep] == Mark::Gray => {
                        trace!("Cycle: {} -> {}", node.key(), dep_key);
                    }
                    _ => {}
                }
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        key: String,
        weight: u32,
    }

    impl Item {
        fn new(key: &str) -> Self {
            Self { key: key.to_string(), weight: 0 }
        }
    }

    impl Keyed for Item {
        fn key(&self) -> &str {
            &self.key
        }
    }

    fn graph_of(keys: &[&str], edges: &[(&str, &str)]) -> Graph<Item> {
        let mut graph = Graph::new();
        for key in keys {
            graph.add_node(Item::new(key));
        }
        for (from, to) in edges {
            graph.add_edge(from, to).unwrap();
        }
        graph
    }

    fn sorted_keys(graph: &Graph<Item>) -> Vec<&str> {
        graph.top_sort().into_iter().map(|n| n.key()).collect()
    }

    fn position(order: &[&str], key: &str) -> usize {
        order.iter().position(|k| *k == key).unwrap()
    }

    #[test]
    fn test_add_node_is_idempotent_by_key() {
        let mut graph = Graph::new();
        graph.add_node(Item::new("a"));
        graph.add_node(Item::new("b"));
        graph.add_edge("a", "b").unwrap();

        let node = graph.add_node(Item { key: "a".into(), weight: 7 });
        assert_eq!(node.content().weight, 7);
        assert!(node.depends_on("b"));
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_add_edge_is_idempotent() {
        let mut graph = graph_of(&["a", "b"], &[]);
        assert!(graph.add_edge("a", "b").unwrap());
        assert!(!graph.add_edge("a", "b").unwrap());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_add_edge_requires_both_endpoints() {
        let mut graph = graph_of(&["a"], &[]);
        assert!(matches!(
            graph.add_edge("a", "missing"),
            Err(GraphError::MissingNode { key }) if key == "missing"
        ));
        assert!(matches!(
            graph.add_edge("missing", "a"),
            Err(GraphError::MissingNode { key }) if key == "missing"
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_top_sort_chain() {
        let graph = graph_of(&["index", "lib/a"], &[("index", "lib/a")]);
        assert_eq!(sorted_keys(&graph), vec!["lib/a", "index"]);
    }

    #[test]
    fn test_top_sort_diamond() {
        let graph = graph_of(
            &["top", "left", "right", "bottom"],
            &[("top", "left"), ("top", "right"), ("left", "bottom"), ("right", "bottom")],
        );
        assert_eq!(sorted_keys(&graph), vec!["bottom", "left", "right", "top"]);
    }

    #[test]
    fn test_top_sort_respects_every_acyclic_edge() {
        let edges = [
            ("app", "router"),
            ("app", "store"),
            ("router", "utils"),
            ("store", "utils"),
            ("store", "api"),
            ("api", "http"),
            ("http", "utils"),
            ("widgets", "utils"),
            ("widgets", "theme"),
            ("app", "widgets"),
        ];
        let graph = graph_of(
            &["http", "app", "theme", "widgets", "utils", "router", "api", "store"],
            &edges,
        );
        let order = sorted_keys(&graph);
        assert_eq!(order.len(), 8);
        for (dependent, dependency) in edges {
            assert!(
                position(&order, dependency) < position(&order, dependent),
                "{} must come before {} in {:?}",
                dependency,
                dependent,
                order
            );
        }
    }

    #[test]
    fn test_top_sort_two_node_cycle() {
        let graph = graph_of(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert_eq!(sorted_keys(&graph), vec!["b", "a"]);
    }

    #[test]
    fn test_top_sort_cycle_with_tail() {
        // entry -> a -> b -> c -> a, c -> leaf
        let graph = graph_of(
            &["entry", "a", "b", "c", "leaf"],
            &[("entry", "a"), ("a", "b"), ("b", "c"), ("c", "a"), ("c", "leaf")],
        );
        let order = sorted_keys(&graph);
        assert_eq!(order, vec!["leaf", "c", "b", "a", "entry"]);
    }

    #[test]
    fn test_top_sort_self_loop() {
        let graph = graph_of(&["a"], &[("a", "a")]);
        assert_eq!(sorted_keys(&graph), vec!["a"]);
    }

    #[test]
    fn test_top_sort_disconnected_keeps_insertion_order() {
        let graph = graph_of(&["z", "m", "a"], &[]);
        assert_eq!(sorted_keys(&graph), vec!["z", "m", "a"]);
    }

    #[test]
    fn test_top_sort_deep_chain_does_not_overflow() {
        let keys: Vec<String> = (0..50_000).map(|i| format!("n{i}")).collect();
        let mut graph = Graph::new();
        for key in &keys {
            graph.add_node(Item::new(key));
        }
        for pair in keys.windows(2) {
            graph.add_edge(&pair[0], &pair[1]).unwrap();
        }
        let order = sorted_keys(&graph);
        assert_eq!(order.len(), keys.len());
        assert_eq!(order.first().copied(), Some("n49999"));
        assert_eq!(order.last().copied(), Some("n0"));
    }

    #[test]
    fn test_lookups() {
        let mut graph = graph_of(&["a", "b"], &[("a", "b")]);
        assert!(graph.has_node("a"));
        assert!(!graph.has_node("c"));
        assert_eq!(graph.get_node("a").unwrap().dependencies().collect::<Vec<_>>(), vec!["b"]);
        graph.get_node_mut("b").unwrap().content_mut().weight = 3;
        assert_eq!(graph.get_node("b").unwrap().content().weight, 3);
        assert_eq!(graph.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
