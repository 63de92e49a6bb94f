//! Traversal index over a graph snapshot.
//!
//! Backed by an undirected petgraph `Graph` whose weights are positions into
//! the snapshot's `nodes` and `edges` vectors, with a HashMap from node id to
//! petgraph index for O(1) lookup. Neighbor lists are returned in snapshot
//! node order so traversals are deterministic.

use crate::model::KnowledgeGraph;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Undirected;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
pub struct GraphIndex {
    graph: Graph<usize, usize, Undirected>,
    /// Map from node id to petgraph's internal index.
    node_index: HashMap<String, NodeIndex>,
}

impl GraphIndex {
    pub fn new(snapshot: &KnowledgeGraph) -> Self {
        let mut graph = Graph::with_capacity(snapshot.nodes.len(), snapshot.edges.len());
        let mut node_index = HashMap::with_capacity(snapshot.nodes.len());

        for (pos, node) in snapshot.nodes.iter().enumerate() {
            let idx = graph.add_node(pos);
            node_index.insert(node.id.clone(), idx);
        }
        for (pos, edge) in snapshot.edges.iter().enumerate() {
            let (Some(&a), Some(&b)) = (
                node_index.get(edge.source.as_str()),
                node_index.get(edge.target.as_str()),
            ) else {
                continue;
            };
            graph.add_edge(a, b, pos);
        }

        Self { graph, node_index }
    }

    /// Position of a node in the snapshot's `nodes`.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).map(|idx| self.graph[*idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Number of incident edges.
    pub fn degree(&self, id: &str) -> usize {
        self.node_index
            .get(id)
            .map(|idx| self.graph.edges(*idx).count())
            .unwrap_or(0)
    }

    /// Positions of incident edges in the snapshot's `edges`, ascending.
    pub fn incident_edges(&self, id: &str) -> Vec<usize> {
        let Some(&idx) = self.node_index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<usize> = self.graph.edges(idx).map(|e| *e.weight()).collect();
        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Distinct neighbor indices in snapshot node order.
    fn neighbors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .edges(idx)
            .map(|e| if e.source() == idx { e.target() } else { e.source() })
            .collect();
        out.sort_by_key(|n| self.graph[*n]);
        out.dedup();
        out
    }

    /// Breadth-first walk from `start` up to `max_depth` hops.
    ///
    /// Returns `(node position, distance)` pairs in visit order, starting with
    /// `(start, 0)`. Empty when `start` is unknown.
    pub fn bfs(&self, start: &str, max_depth: usize) -> Vec<(usize, usize)> {
        let Some(&start_idx) = self.node_index.get(start) else {
            return Vec::new();
        };

        let mut visited = vec![false; self.graph.node_count()];
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        visited[start_idx.index()] = true;
        queue.push_back((start_idx, 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            order.push((self.graph[current], depth));
            if depth == max_depth {
                continue;
            }
            for next in self.neighbors(current) {
                if !visited[next.index()] {
                    visited[next.index()] = true;
                    queue.push_back((next, depth + 1));
                }
            }
        }
        order
    }

    /// Fewest-hop path from `from` to `to`, at most `max_depth` edges long.
    ///
    /// Returns node positions including both endpoints. Ties resolve to the
    /// path through lower-positioned nodes.
    pub fn shortest_path(&self, from: &str, to: &str, max_depth: usize) -> Option<Vec<usize>> {
        let from_idx = *self.node_index.get(from)?;
        let to_idx = *self.node_index.get(to)?;
        if from_idx == to_idx {
            return Some(vec![self.graph[from_idx]]);
        }

        let mut parent: Vec<Option<NodeIndex>> = vec![None; self.graph.node_count()];
        let mut visited = vec![false; self.graph.node_count()];
        let mut queue = VecDeque::new();
        visited[from_idx.index()] = true;
        queue.push_back((from_idx, 0usize));

        while let Some((current, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            for next in self.neighbors(current) {
                if visited[next.index()] {
                    continue;
                }
                visited[next.index()] = true;
                parent[next.index()] = Some(current);
                if next == to_idx {
                    let mut path = vec![self.graph[next]];
                    let mut cursor = current;
                    path.push(self.graph[cursor]);
                    while let Some(p) = parent[cursor.index()] {
                        path.push(self.graph[p]);
                        cursor = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back((next, depth + 1));
            }
        }
        None
    }

    pub fn connected_components(&self) -> usize {
        petgraph::algo::connected_components(&self.graph)
    }
}
