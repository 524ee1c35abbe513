// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Cycle guard for proposed connections
//!
//! Answers "would committing `start → end` make the graph cyclic?" without
//! touching the live graph. The check runs a three-colour depth-first
//! search over a private copy of the incoming lists with the hypothetical
//! edge applied.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::trace;

use super::PipelineGraph;

/// Whether adding `start → end` to `graph` would create a cycle.
///
/// A self-loop (`start == end`) always counts as a cycle. Proposing an edge
/// that already exists is classified like any other. Ids must refer to
/// steps in the graph; dangling references are skipped, not reported.
pub fn would_create_cycle(graph: &PipelineGraph, start: &str, end: &str) -> bool {
    // Private working copy: only the incoming lists, with the edge applied.
    let mut incoming: Vec<(String, Vec<String>)> = graph
        .steps()
        .map(|step| (step.id.clone(), step.incoming_connections.clone()))
        .collect();

    match incoming.iter_mut().find(|(id, _)| id == end) {
        Some((_, sources)) => sources.push(start.to_string()),
        None => incoming.push((end.to_string(), vec![start.to_string()])),
    }

    // Outgoing view of the copy, since the search walks forward edges.
    let mut outgoing: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for (target, sources) in &incoming {
        for source in sources {
            outgoing.entry(source.as_str()).or_default().insert(target.as_str());
        }
    }

    let mut white: HashSet<&str> = incoming.iter().map(|(id, _)| id.as_str()).collect();
    let mut grey: HashSet<&str> = HashSet::new();

    for (root, _) in &incoming {
        if !white.contains(root.as_str()) {
            continue;
        }

        if visit(root, &outgoing, &mut white, &mut grey) {
            trace!(start, end, root = %root, "proposed connection closes a cycle");
            return true;
        }
    }

    trace!(start, end, "proposed connection keeps the graph acyclic");
    false
}

/// Iterative depth-first visit from `root`.
///
/// White nodes are unvisited, grey nodes are on the current path, and nodes
/// in neither set are fully explored. Meeting a grey child is a back edge.
fn visit<'a>(
    root: &'a str,
    outgoing: &HashMap<&'a str, BTreeSet<&'a str>>,
    white: &mut HashSet<&'a str>,
    grey: &mut HashSet<&'a str>,
) -> bool {
    let empty = BTreeSet::new();
    let children_of = |id: &str| -> Vec<&'a str> {
        outgoing
            .get(id)
            .unwrap_or(&empty)
            .iter()
            .copied()
            .collect()
    };

    white.remove(root);
    grey.insert(root);
    let mut stack: Vec<(&'a str, Vec<&'a str>, usize)> = vec![(root, children_of(root), 0)];

    while let Some(top) = stack.last_mut() {
        let Some(&child) = top.1.get(top.2) else {
            grey.remove(top.0);
            stack.pop();
            continue;
        };
        top.2 += 1;

        if white.remove(child) {
            grey.insert(child);
            stack.push((child, children_of(child), 0));
        } else if grey.contains(child) {
            return true;
        }
    }

    false
}

/// Shortest chain of committed connections leading from `from` to `to`.
///
/// Walks backwards from `to` over the incoming lists, so it does not depend
/// on the outgoing cache being current. Returns `None` when `to` is not
/// reachable from `from`.
pub fn find_path(graph: &PipelineGraph, from: &str, to: &str) -> Option<Vec<String>> {
    if !graph.contains(from) || !graph.contains(to) {
        return None;
    }

    // next_hop[x] = the step x leads to on the way to `to`
    let mut next_hop: HashMap<&str, &str> = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::from([to]);
    let mut queue: VecDeque<&str> = VecDeque::from([to]);

    while let Some(current) = queue.pop_front() {
        if current == from {
            let mut path = vec![from.to_string()];
            let mut cursor = from;
            while let Some(&next) = next_hop.get(cursor) {
                path.push(next.to_string());
                cursor = next;
            }
            return Some(path);
        }

        let Some(step) = graph.step(current) else {
            continue;
        };
        for source in &step.incoming_connections {
            if seen.insert(source.as_str()) {
                next_hop.insert(source.as_str(), current);
                queue.push_back(source.as_str());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Step;
    use petgraph::algo::has_path_connecting;
    use petgraph::graph::DiGraph;
    use proptest::prelude::*;

    fn chain() -> PipelineGraph {
        PipelineGraph::from_steps([
            Step::new("a", "A"),
            Step::new("b", "B").with_incoming(["a"]),
            Step::new("c", "C").with_incoming(["b"]),
        ])
    }

    #[test]
    fn test_back_edge_is_cycle() {
        assert!(would_create_cycle(&chain(), "c", "a"));
        assert!(would_create_cycle(&chain(), "b", "a"));
    }

    #[test]
    fn test_forward_edge_is_not_cycle() {
        let mut graph = chain();
        assert!(!would_create_cycle(&graph, "a", "c"));

        graph.add_connection("a", "c");
        let outgoing: Vec<_> = graph.step("a").unwrap().outgoing_connections().iter().cloned().collect();
        assert_eq!(outgoing, vec!["b", "c"]);
    }

    #[test]
    fn test_self_loop_on_single_step() {
        let graph = PipelineGraph::from_steps([Step::new("a", "A")]);
        assert!(would_create_cycle(&graph, "a", "a"));
    }

    #[test]
    fn test_existing_edge_is_not_cycle() {
        assert!(!would_create_cycle(&chain(), "a", "b"));
    }

    #[test]
    fn test_diamond_is_not_cycle() {
        let graph = PipelineGraph::from_steps([
            Step::new("a", "A"),
            Step::new("b", "B").with_incoming(["a"]),
            Step::new("c", "C").with_incoming(["a"]),
            Step::new("d", "D").with_incoming(["b", "c"]),
        ]);

        assert!(!would_create_cycle(&graph, "b", "c"));
        assert!(!would_create_cycle(&graph, "a", "d"));
        assert!(would_create_cycle(&graph, "d", "a"));
    }

    #[test]
    fn test_guard_leaves_graph_untouched() {
        let graph = chain();
        let snapshot = graph.clone();

        let first = would_create_cycle(&graph, "c", "a");
        let second = would_create_cycle(&graph, "c", "a");

        assert_eq!(first, second);
        assert_eq!(graph, snapshot);
    }

    #[test]
    fn test_find_path() {
        let graph = chain();

        assert_eq!(find_path(&graph, "a", "c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(find_path(&graph, "b", "b").unwrap(), vec!["b"]);
        assert_eq!(find_path(&graph, "c", "a"), None);
        assert_eq!(find_path(&graph, "a", "zzz"), None);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let steps = (0..20_000).map(|i| {
            let step = Step::new(format!("s{}", i), "");
            if i == 0 {
                step
            } else {
                step.with_incoming([format!("s{}", i - 1)])
            }
        });
        let graph = PipelineGraph::from_steps(steps);

        assert!(would_create_cycle(&graph, "s19999", "s0"));
        assert!(!would_create_cycle(&graph, "s0", "s19999"));
    }

    /// Random DAG: edges only go from lower to higher index
    fn arb_dag() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
        (2usize..12).prop_flat_map(|n| {
            let edges = prop::collection::vec((0..n, 0..n), 0..30).prop_map(|pairs| {
                pairs
                    .into_iter()
                    .filter(|(a, b)| a < b)
                    .collect::<Vec<_>>()
            });
            (Just(n), edges)
        })
    }

    fn build(n: usize, edges: &[(usize, usize)]) -> PipelineGraph {
        let mut graph = PipelineGraph::from_steps((0..n).map(|i| Step::new(format!("s{}", i), "")));
        for (a, b) in edges {
            graph.add_connection(&format!("s{}", a), &format!("s{}", b));
        }
        graph
    }

    proptest! {
        #[test]
        fn test_self_loop_always_cycle((n, edges) in arb_dag(), pick in 0usize..12) {
            let graph = build(n, &edges);
            let id = format!("s{}", pick % n);
            prop_assert!(would_create_cycle(&graph, &id, &id));
        }

        #[test]
        fn test_matches_reachability((n, edges) in arb_dag(), a in 0usize..12, b in 0usize..12) {
            let (a, b) = (a % n, b % n);
            prop_assume!(a != b);
            prop_assume!(!edges.contains(&(a, b)));

            let graph = build(n, &edges);

            let mut reference = DiGraph::<usize, ()>::new();
            let nodes: Vec<_> = (0..n).map(|i| reference.add_node(i)).collect();
            for (x, y) in &edges {
                reference.update_edge(nodes[*x], nodes[*y], ());
            }
            let expected = has_path_connecting(&reference, nodes[b], nodes[a], None);

            prop_assert_eq!(
                would_create_cycle(&graph, &format!("s{}", a), &format!("s{}", b)),
                expected
            );
        }

        #[test]
        fn test_outgoing_cache_mirrors_incoming((n, edges) in arb_dag(), drop in 0usize..30) {
            // Bulk-author the incoming lists, then drop one edge again
            let steps = (0..n).map(|i| {
                let sources: Vec<String> = edges
                    .iter()
                    .filter(|(_, b)| *b == i)
                    .map(|(a, _)| format!("s{}", a))
                    .collect();
                Step::new(format!("s{}", i), "").with_incoming(sources)
            });
            let mut graph = PipelineGraph::from_steps(steps);
            if let Some((a, b)) = edges.get(drop) {
                graph.remove_connection(&format!("s{}", a), &format!("s{}", b));
            }

            for x in graph.steps() {
                for y in graph.steps() {
                    prop_assert_eq!(
                        x.outgoing_connections().contains(&y.id),
                        y.incoming_connections.contains(&x.id),
                        "{} -> {}", x.id, y.id
                    );
                }
            }
        }

        #[test]
        fn test_guard_is_pure((n, edges) in arb_dag(), a in 0usize..12, b in 0usize..12) {
            let graph = build(n, &edges);
            let snapshot = graph.clone();
            let (start, end) = (format!("s{}", a % n), format!("s{}", b % n));

            let first = would_create_cycle(&graph, &start, &end);
            let second = would_create_cycle(&graph, &start, &end);

            prop_assert_eq!(first, second);
            prop_assert_eq!(&graph, &snapshot);
        }
    }
}
