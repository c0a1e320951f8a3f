//! Explicit link graph operations.
//!
//! Provides the adjacency view over a project's stored links, reachability
//! search and the cycle check run before every link insertion.
//!
//! Only explicit links participate. Hierarchy edges (parent -> child) are
//! never merged into this graph; they are acyclic by rank already.

use crate::domain::{TicketId, TicketLink};
use std::collections::{HashMap, HashSet, VecDeque};

/// Directed adjacency view built from a set of links.
///
/// The graph borrows nothing; it is rebuilt from the full link set of a
/// project on each check, which is O(V+E) and fine for per-project graphs.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    adjacency: HashMap<TicketId, Vec<TicketId>>,
}

impl LinkGraph {
    /// Build the adjacency structure from an edge list
    pub fn from_links(links: &[TicketLink]) -> Self {
        let mut adjacency: HashMap<TicketId, Vec<TicketId>> = HashMap::new();
        for link in links {
            adjacency
                .entry(link.source_id)
                .or_default()
                .push(link.target_id);
        }
        Self { adjacency }
    }

    /// Build the adjacency structure from `(source, target)` pairs
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (TicketId, TicketId)>,
    {
        let mut adjacency: HashMap<TicketId, Vec<TicketId>> = HashMap::new();
        for (source, target) in edges {
            adjacency.entry(source).or_default().push(target);
        }
        Self { adjacency }
    }

    /// Number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Direct successors of a node
    pub fn successors(&self, node: TicketId) -> &[TicketId] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if a directed path leads from `start` to `target`.
    ///
    /// A node always reaches itself.
    pub fn is_reachable(&self, start: TicketId, target: TicketId) -> bool {
        self.path_between(start, target).is_some()
    }

    /// Breadth-first search for a path from `start` to `target`.
    ///
    /// Returns the node sequence including both endpoints.
    pub fn path_between(&self, start: TicketId, target: TicketId) -> Option<Vec<TicketId>> {
        if start == target {
            return Some(vec![start]);
        }

        let mut predecessor: HashMap<TicketId, TicketId> = HashMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for &next in self.successors(current) {
                if !visited.insert(next) {
                    continue;
                }
                predecessor.insert(next, current);
                if next == target {
                    let mut path = vec![target];
                    let mut node = target;
                    while let Some(&prev) = predecessor.get(&node) {
                        path.push(prev);
                        node = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// Check whether adding `source -> target` would close a cycle.
    ///
    /// Adding the edge creates a cycle exactly when `source` is already
    /// reachable from `target`. Returns that existing path if so.
    pub fn cycle_on_add(&self, source: TicketId, target: TicketId) -> Option<Vec<TicketId>> {
        self.path_between(target, source)
    }

    /// Returns true if the graph contains no directed cycle.
    pub fn is_acyclic(&self) -> bool {
        self.find_cycle().is_none()
    }

    /// Find any directed cycle, returned as the node sequence around the loop.
    ///
    /// Uses iterative DFS with an explicit "on stack" set; nodes are visited
    /// in ascending order so the result is deterministic.
    pub fn find_cycle(&self) -> Option<Vec<TicketId>> {
        let mut roots: Vec<TicketId> = self.adjacency.keys().copied().collect();
        roots.sort_unstable();

        let mut done: HashSet<TicketId> = HashSet::new();

        for root in roots {
            if done.contains(&root) {
                continue;
            }

            let mut stack: Vec<(TicketId, usize)> = vec![(root, 0)];
            let mut on_stack: Vec<TicketId> = vec![root];

            while let Some((node, index)) = stack.last_mut() {
                let successors = self.successors(*node);
                if *index >= successors.len() {
                    done.insert(*node);
                    on_stack.pop();
                    stack.pop();
                    continue;
                }

                let next = successors[*index];
                *index += 1;

                if let Some(pos) = on_stack.iter().position(|&n| n == next) {
                    let mut cycle = on_stack[pos..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                if !done.contains(&next) {
                    on_stack.push(next);
                    stack.push((next, 0));
                }
            }
        }

        None
    }
}
