// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Relation cycle detection.
//!
//! Tarjan's strongly connected components over the relation graph. A
//! component with more than one entity, or an entity relating to itself,
//! is a cycle. Nodes and edges are visited in sorted order, so the result
//! is the same for every run.

use std::collections::{BTreeMap, BTreeSet};

use crate::naming::QualifiedName;

/// Relation graph: entity to related entities.
pub type Graph = BTreeMap<QualifiedName, BTreeSet<QualifiedName>>;

/// All cycles of a graph, each sorted, ordered by first member.
pub fn find_cycles(graph: &Graph) -> Vec<Vec<QualifiedName>> {
    let mut tarjan = Tarjan {
        graph,
        index: 0,
        indices: BTreeMap::new(),
        lowlinks: BTreeMap::new(),
        stack: Vec::new(),
        on_stack: BTreeSet::new(),
        components: Vec::new()
    };
    for node in graph.keys() {
        if !tarjan.indices.contains_key(node) {
            tarjan.connect(node);
        }
    }

    let mut cycles: Vec<Vec<QualifiedName>> = tarjan
        .components
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|n| graph.get(n).is_some_and(|edges| edges.contains(n)))
        })
        .map(|mut component| {
            component.sort();
            component
        })
        .collect();
    cycles.sort();
    cycles
}

struct Tarjan<'a> {
    graph:      &'a Graph,
    index:      usize,
    indices:    BTreeMap<&'a QualifiedName, usize>,
    lowlinks:   BTreeMap<&'a QualifiedName, usize>,
    stack:      Vec<&'a QualifiedName>,
    on_stack:   BTreeSet<&'a QualifiedName>,
    components: Vec<Vec<QualifiedName>>
}

impl<'a> Tarjan<'a> {
    fn connect(&mut self, node: &'a QualifiedName) {
        self.indices.insert(node, self.index);
        self.lowlinks.insert(node, self.index);
        self.index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        for next in graph.get(node).into_iter().flatten() {
            if !self.indices.contains_key(next) {
                self.connect(next);
                let low = self.lowlinks[next].min(self.lowlinks[node]);
                self.lowlinks.insert(node, low);
            } else if self.on_stack.contains(next) {
                let low = self.indices[next].min(self.lowlinks[node]);
                self.lowlinks.insert(node, low);
            }
        }

        if self.lowlinks[node] == self.indices[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(member);
                component.push(member.clone());
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (from, to) in edges {
            graph
                .entry(QualifiedName::new(*from))
                .or_default()
                .insert(QualifiedName::new(*to));
            graph.entry(QualifiedName::new(*to)).or_default();
        }
        graph
    }

    fn names(cycle: &[QualifiedName]) -> Vec<&str> {
        cycle.iter().map(QualifiedName::as_str).collect()
    }

    #[test]
    fn two_node_cycle() {
        let cycles = find_cycles(&graph(&[("B", "A"), ("A", "B"), ("A", "C")]));
        assert_eq!(cycles.len(), 1);
        assert_eq!(names(&cycles[0]), vec!["A", "B"]);
    }

    #[test]
    fn self_reference() {
        let cycles = find_cycles(&graph(&[("Node", "Node")]));
        assert_eq!(names(&cycles[0]), vec!["Node"]);
    }

    #[test]
    fn acyclic() {
        assert!(find_cycles(&graph(&[("A", "B"), ("B", "C"), ("A", "C")])).is_empty());
    }

    #[test]
    fn separate_cycles_are_ordered() {
        let cycles = find_cycles(&graph(&[("X", "Y"), ("Y", "X"), ("A", "B"), ("B", "C"), ("C", "A")]));
        assert_eq!(cycles.len(), 2);
        assert_eq!(names(&cycles[0]), vec!["A", "B", "C"]);
        assert_eq!(names(&cycles[1]), vec!["X", "Y"]);
    }
}
