//! Knowledge graph data model: typed nodes, typed weighted edges, snapshots.

use chrono::{DateTime, Utc};
use margin_core::{EntityKind, OriginalRef, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable node identifier, `"{type}_{originalId}"`.
pub type NodeId = String;

/// Build the stable id of a node.
pub fn node_id(node_type: NodeType, original_id: &str) -> NodeId {
    format!("{}_{}", node_type.as_str(), original_id)
}

/// Type of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Episode,
    Book,
    Speaker,
    Quote,
    Concept,
    Topic,
}

impl NodeType {
    pub const ALL: [NodeType; 6] = [
        NodeType::Episode,
        NodeType::Book,
        NodeType::Speaker,
        NodeType::Quote,
        NodeType::Concept,
        NodeType::Topic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Episode => "episode",
            NodeType::Book => "book",
            NodeType::Speaker => "speaker",
            NodeType::Quote => "quote",
            NodeType::Concept => "concept",
            NodeType::Topic => "topic",
        }
    }

    /// Display color used by graph renderers.
    pub fn color(&self) -> &'static str {
        match self {
            NodeType::Episode => "#6366f1",
            NodeType::Book => "#f59e0b",
            NodeType::Speaker => "#10b981",
            NodeType::Quote => "#ec4899",
            NodeType::Concept => "#8b5cf6",
            NodeType::Topic => "#3b82f6",
        }
    }

    /// Size of a node of this type with no relations.
    pub fn base_size(&self) -> f64 {
        match self {
            NodeType::Episode => 24.0,
            NodeType::Book => 18.0,
            NodeType::Speaker => 16.0,
            NodeType::Quote => 10.0,
            NodeType::Concept => 12.0,
            NodeType::Topic => 14.0,
        }
    }
}

impl From<EntityKind> for NodeType {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Episode => NodeType::Episode,
            EntityKind::Book => NodeType::Book,
            EntityKind::Speaker => NodeType::Speaker,
            EntityKind::Quote => NodeType::Quote,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let singular = s.strip_suffix('s').unwrap_or(&s);
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s || t.as_str() == singular)
            .ok_or_else(|| format!("unknown node type: {}", s))
    }
}

/// Relationship carried by an edge. Edges are stored directed but traversed
/// undirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// episode → book
    Mentions,
    /// episode → speaker
    Features,
    /// episode → quote
    ContainsQuote,
    /// quote → book
    QuotesFrom,
    /// quote → speaker
    SaidBy,
    /// episode → topic
    Discusses,
    /// book → concept
    Explores,
    /// speaker → book
    Authored,
    /// topic → concept, inferred from co-occurrence
    Related,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Mentions => "mentions",
            EdgeType::Features => "features",
            EdgeType::ContainsQuote => "contains_quote",
            EdgeType::QuotesFrom => "quotes_from",
            EdgeType::SaidBy => "said_by",
            EdgeType::Discusses => "discusses",
            EdgeType::Explores => "explores",
            EdgeType::Authored => "authored",
            EdgeType::Related => "related",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship strength, serialized as the integer 1, 2 or 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EdgeWeight {
    Weak = 1,
    Medium = 2,
    Strong = 3,
}

impl From<EdgeWeight> for u8 {
    fn from(weight: EdgeWeight) -> u8 {
        weight as u8
    }
}

impl TryFrom<u8> for EdgeWeight {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EdgeWeight::Weak),
            2 => Ok(EdgeWeight::Medium),
            3 => Ok(EdgeWeight::Strong),
            other => Err(format!("edge weight must be 1, 2 or 3, got {}", other)),
        }
    }
}

/// Per-type node properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeProps {
    Episode {
        original: OriginalRef,
        topics: Vec<String>,
        duration_minutes: Option<u32>,
        published_at: Option<DateTime<Utc>>,
        listen_count: u64,
    },
    Book {
        original: OriginalRef,
        author: Option<String>,
        category: Option<String>,
    },
    Speaker {
        original: OriginalRef,
        expertise: Vec<String>,
    },
    Quote {
        original: OriginalRef,
        text: String,
    },
    Concept {
        slug: String,
    },
    Topic {
        slug: String,
    },
}

impl NodeProps {
    /// Back-reference to the catalog entity; `None` for derived topic and concept nodes.
    pub fn original(&self) -> Option<&OriginalRef> {
        match self {
            NodeProps::Episode { original, .. }
            | NodeProps::Book { original, .. }
            | NodeProps::Speaker { original, .. }
            | NodeProps::Quote { original, .. } => Some(original),
            NodeProps::Concept { .. } | NodeProps::Topic { .. } => None,
        }
    }
}

/// A node of the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_ar: Option<String>,
    pub size: f64,
    pub color: String,
    pub position: Position,
    pub properties: NodeProps,
}

impl GraphNode {
    /// Case-insensitive substring match against `label` and `label_ar`.
    ///
    /// `needle` must already be lowercase.
    pub fn label_contains(&self, needle: &str) -> bool {
        self.label.to_lowercase().contains(needle)
            || self
                .label_ar
                .as_ref()
                .is_some_and(|ar| ar.to_lowercase().contains(needle))
    }
}

/// A directed, typed, weighted edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub weight: EdgeWeight,
}

impl GraphEdge {
    pub fn new(source: NodeId, target: NodeId, edge_type: EdgeType, weight: EdgeWeight) -> Self {
        Self {
            id: format!("{}-{}-{}", source, edge_type.as_str(), target),
            source,
            target,
            edge_type,
            weight,
        }
    }

    /// Whether `node` is either endpoint.
    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }
}

/// Build information for a graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    pub node_count: usize,
    pub edge_count: usize,
    pub last_updated: DateTime<Utc>,
    /// Build counter; increases with every rebuild.
    pub version: u64,
}

/// An immutable knowledge graph snapshot.
///
/// Every edge endpoint is a node of the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub metadata: GraphMetadata,
}

impl KnowledgeGraph {
    /// Assemble a snapshot, dropping edges whose endpoints are not in `nodes`.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>, version: u64) -> Self {
        let ids: std::collections::HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<GraphEdge> = edges
            .into_iter()
            .filter(|e| {
                let keep = ids.contains(e.source.as_str()) && ids.contains(e.target.as_str());
                if !keep {
                    tracing::debug!(edge = %e.id, "dropping edge with missing endpoint");
                }
                keep
            })
            .collect();

        let metadata = GraphMetadata {
            node_count: nodes.len(),
            edge_count: edges.len(),
            last_updated: Utc::now(),
            version,
        };
        Self {
            nodes,
            edges,
            metadata,
        }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pretty JSON in the shape graph renderers consume.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Whether every edge references existing nodes.
    pub fn is_consistent(&self) -> bool {
        let ids: std::collections::HashSet<&str> =
            self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.edges
            .iter()
            .all(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
    }

    /// Nodes of the given types and the edges between them.
    pub fn filter_by_type(&self, types: &[NodeType]) -> KnowledgeGraph {
        let nodes: Vec<GraphNode> = self
            .nodes
            .iter()
            .filter(|n| types.contains(&n.node_type))
            .cloned()
            .collect();
        let ids: std::collections::HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges: Vec<GraphEdge> = self
            .edges
            .iter()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .cloned()
            .collect();

        let metadata = GraphMetadata {
            node_count: nodes.len(),
            edge_count: edges.len(),
            ..self.metadata.clone()
        };
        KnowledgeGraph {
            nodes,
            edges,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(slug: &str) -> GraphNode {
        GraphNode {
            id: node_id(NodeType::Topic, slug),
            node_type: NodeType::Topic,
            label: slug.to_string(),
            label_ar: None,
            size: NodeType::Topic.base_size(),
            color: NodeType::Topic.color().to_string(),
            position: Position::default(),
            properties: NodeProps::Topic {
                slug: slug.to_string(),
            },
        }
    }

    #[test]
    fn node_ids_are_type_prefixed() {
        assert_eq!(node_id(NodeType::Episode, "42"), "episode_42");
        assert_eq!(node_id(NodeType::Concept, "deep-work"), "concept_deep-work");
    }

    #[test]
    fn node_type_parses_plural_and_case() {
        assert_eq!("Books".parse::<NodeType>().unwrap(), NodeType::Book);
        assert_eq!("topic".parse::<NodeType>().unwrap(), NodeType::Topic);
        assert!("podcast".parse::<NodeType>().is_err());
    }

    #[test]
    fn edge_weight_serializes_as_integer() {
        let edge = GraphEdge::new(
            "episode_1".into(),
            "book_1".into(),
            EdgeType::Mentions,
            EdgeWeight::Strong,
        );
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["weight"], 3);
        assert_eq!(json["type"], "mentions");
        assert_eq!(json["id"], "episode_1-mentions-book_1");

        let back: GraphEdge = serde_json::from_value(json).unwrap();
        assert_eq!(back, edge);
        assert!(serde_json::from_str::<EdgeWeight>("4").is_err());
    }

    #[test]
    fn node_serializes_with_camel_case_fields() {
        let mut node = topic("habits");
        node.label_ar = Some("عادات".into());
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "topic");
        assert_eq!(json["labelAr"], "عادات");
        assert_eq!(json["properties"]["kind"], "topic");
    }

    #[test]
    fn new_drops_dangling_edges() {
        let graph = KnowledgeGraph::new(
            vec![topic("a"), topic("b")],
            vec![
                GraphEdge::new("topic_a".into(), "topic_b".into(), EdgeType::Related, EdgeWeight::Weak),
                GraphEdge::new("topic_a".into(), "topic_zzz".into(), EdgeType::Related, EdgeWeight::Weak),
            ],
            1,
        );
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.metadata.edge_count, 1);
        assert!(graph.is_consistent());
    }

    #[test]
    fn label_match_checks_arabic_label() {
        let mut node = topic("habits");
        node.label_ar = Some("العادات".into());
        assert!(node.label_contains("hab"));
        assert!(node.label_contains("عادات"));
        assert!(!node.label_contains("focus"));
    }
}
