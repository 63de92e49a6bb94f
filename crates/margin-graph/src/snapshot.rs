//! Read-only queries over one built graph.

use crate::error::{GraphError, GraphResult};
use crate::index::GraphIndex;
use crate::model::{EdgeType, GraphEdge, GraphNode, KnowledgeGraph, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A node and its neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSubgraph {
    pub center: GraphNode,
    /// Nodes reached within the requested depth, in visit order.
    pub neighbors: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub related_books: Vec<GraphNode>,
    pub related_episodes: Vec<GraphNode>,
    pub related_speakers: Vec<GraphNode>,
}

/// Aggregate statistics of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<NodeType, usize>,
    pub edges_by_type: BTreeMap<EdgeType, usize>,
    /// `2E / N`
    pub average_degree: f64,
    /// `E / (N(N-1)/2)`, zero below two nodes.
    pub density: f64,
    pub connected_components: usize,
}

/// A built graph together with its traversal index.
#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    graph: Arc<KnowledgeGraph>,
    index: Arc<GraphIndex>,
}

impl GraphSnapshot {
    pub fn new(graph: KnowledgeGraph) -> Self {
        let index = GraphIndex::new(&graph);
        Self {
            graph: Arc::new(graph),
            index: Arc::new(index),
        }
    }

    pub fn graph(&self) -> &Arc<KnowledgeGraph> {
        &self.graph
    }

    pub fn version(&self) -> u64 {
        self.graph.metadata.version
    }

    fn node_at(&self, pos: usize) -> &GraphNode {
        &self.graph.nodes[pos]
    }

    fn lookup(&self, id: &str) -> GraphResult<usize> {
        self.index
            .position(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    pub fn by_type(&self, types: &[NodeType]) -> KnowledgeGraph {
        self.graph.filter_by_type(types)
    }

    pub fn subgraph(&self, id: &str, depth: usize) -> GraphResult<NodeSubgraph> {
        let center = self.lookup(id)?;
        let visited = self.index.bfs(id, depth);

        let mut edge_positions: Vec<usize> = visited
            .iter()
            .filter(|(_, distance)| *distance < depth)
            .flat_map(|(pos, _)| self.index.incident_edges(&self.node_at(*pos).id))
            .collect();
        edge_positions.sort_unstable();
        edge_positions.dedup();

        let neighbors: Vec<GraphNode> = visited
            .iter()
            .filter(|(pos, _)| *pos != center)
            .map(|(pos, _)| self.node_at(*pos).clone())
            .collect();
        let of_type = |t: NodeType| -> Vec<GraphNode> {
            neighbors
                .iter()
                .filter(|n| n.node_type == t)
                .cloned()
                .collect()
        };

        Ok(NodeSubgraph {
            center: self.node_at(center).clone(),
            related_books: of_type(NodeType::Book),
            related_episodes: of_type(NodeType::Episode),
            related_speakers: of_type(NodeType::Speaker),
            edges: edge_positions
                .into_iter()
                .map(|pos| self.graph.edges[pos].clone())
                .collect(),
            neighbors,
        })
    }

    /// Case-insensitive substring search over labels, in node order.
    pub fn search_nodes(&self, query: &str, types: Option<&[NodeType]>) -> Vec<GraphNode> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.graph
            .nodes
            .iter()
            .filter(|n| types.map_or(true, |t| t.contains(&n.node_type)))
            .filter(|n| n.label_contains(&needle))
            .cloned()
            .collect()
    }

    /// Nodes with the most incident edges; ties keep node order.
    pub fn most_connected(&self, limit: usize, node_type: Option<NodeType>) -> Vec<(GraphNode, usize)> {
        let mut ranked: Vec<(&GraphNode, usize)> = self
            .graph
            .nodes
            .iter()
            .filter(|n| node_type.map_or(true, |t| n.node_type == t))
            .map(|n| (n, self.index.degree(&n.id)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
            .into_iter()
            .take(limit)
            .map(|(n, degree)| (n.clone(), degree))
            .collect()
    }

    /// Fewest-hop path of at most `max_depth` edges.
    pub fn find_path(&self, source: &str, target: &str, max_depth: usize) -> GraphResult<Option<Vec<GraphNode>>> {
        self.lookup(source)?;
        self.lookup(target)?;
        Ok(self
            .index
            .shortest_path(source, target, max_depth)
            .map(|path| path.into_iter().map(|pos| self.node_at(pos).clone()).collect()))
    }

    pub fn stats(&self) -> GraphStats {
        let n = self.graph.nodes.len();
        let e = self.graph.edges.len();

        let mut nodes_by_type = BTreeMap::new();
        for node in &self.graph.nodes {
            *nodes_by_type.entry(node.node_type).or_insert(0) += 1;
        }
        let mut edges_by_type = BTreeMap::new();
        for edge in &self.graph.edges {
            *edges_by_type.entry(edge.edge_type).or_insert(0) += 1;
        }

        let average_degree = if n == 0 { 0.0 } else { 2.0 * e as f64 / n as f64 };
        let density = if n < 2 {
            0.0
        } else {
            e as f64 / (n as f64 * (n as f64 - 1.0) / 2.0)
        };

        GraphStats {
            node_count: n,
            edge_count: e,
            nodes_by_type,
            edges_by_type,
            average_degree,
            density,
            connected_components: self.index.connected_components(),
        }
    }
}
