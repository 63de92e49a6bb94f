//! Radial layout for graph rendering.
//!
//! The first episode node (or the first node when there are no episodes) sits
//! at the canvas center. Every other node is placed on a ring, in node order,
//! at angle `2π·(i−1)/(n−1) − π/2` for `i = 1..n`. The ring radius is
//! offset per node by a deterministic jitter so labels overlap less.

use crate::model::{GraphNode, NodeType};
use margin_core::Position;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Canvas and ring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Base ring radius.
    pub radius: f64,
    /// Maximum distance a node may sit inside or outside the base ring.
    pub jitter: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            radius: 300.0,
            jitter: 60.0,
        }
    }
}

impl LayoutConfig {
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0, self.height / 2.0)
    }
}

/// 64-bit FNV-1a. Stable across builds and platforms.
fn fnv1a(text: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in text.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Deterministic offset in `[-jitter, jitter]` derived from the node id.
fn jitter_for(id: &str, jitter: f64) -> f64 {
    let unit = (fnv1a(id) % 10_000) as f64 / 9_999.0;
    (unit * 2.0 - 1.0) * jitter
}

/// Assign a position to every node.
pub fn apply_layout(nodes: &mut [GraphNode], config: &LayoutConfig) {
    if nodes.is_empty() {
        return;
    }

    let center_pos = nodes
        .iter()
        .position(|n| n.node_type == NodeType::Episode)
        .unwrap_or(0);
    let center = config.center();
    nodes[center_pos].position = center;

    let n = nodes.len();
    if n == 1 {
        return;
    }

    let ring = (0..n).filter(|&i| i != center_pos);
    for (offset, idx) in ring.enumerate() {
        let i = offset + 1;
        let angle = TAU * (i - 1) as f64 / (n - 1) as f64 - PI / 2.0;
        let radius = config.radius + jitter_for(&nodes[idx].id, config.jitter);
        nodes[idx].position = Position::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{node_id, NodeProps};

    fn node(node_type: NodeType, id: &str) -> GraphNode {
        GraphNode {
            id: node_id(node_type, id),
            node_type,
            label: id.to_string(),
            label_ar: None,
            size: 10.0,
            color: node_type.color().to_string(),
            position: Position::default(),
            properties: NodeProps::Topic { slug: id.to_string() },
        }
    }

    #[test]
    fn first_episode_is_centered() {
        let mut nodes = vec![
            node(NodeType::Book, "b1"),
            node(NodeType::Episode, "e1"),
            node(NodeType::Speaker, "s1"),
        ];
        let config = LayoutConfig::default();
        apply_layout(&mut nodes, &config);

        assert_eq!(nodes[1].position, Position::new(600.0, 400.0));
        for n in [&nodes[0], &nodes[2]] {
            let d = n.position.distance_to(&config.center());
            assert!(d >= config.radius - config.jitter - 1e-9);
            assert!(d <= config.radius + config.jitter + 1e-9);
        }
    }

    #[test]
    fn ring_starts_at_top() {
        let config = LayoutConfig {
            jitter: 0.0,
            ..LayoutConfig::default()
        };
        let mut nodes = vec![node(NodeType::Episode, "e1"), node(NodeType::Book, "b1")];
        apply_layout(&mut nodes, &config);

        // angle -π/2: straight up from the center
        assert!((nodes[1].position.x - 600.0).abs() < 1e-9);
        assert!((nodes[1].position.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn layout_is_deterministic() {
        let build = || {
            let mut nodes: Vec<GraphNode> = (0..12)
                .map(|i| node(NodeType::Topic, &format!("t{}", i)))
                .collect();
            apply_layout(&mut nodes, &LayoutConfig::default());
            nodes.into_iter().map(|n| n.position).collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn single_node_and_empty_input() {
        let mut nodes = vec![node(NodeType::Topic, "only")];
        apply_layout(&mut nodes, &LayoutConfig::default());
        assert_eq!(nodes[0].position, Position::new(600.0, 400.0));

        let mut none: Vec<GraphNode> = Vec::new();
        apply_layout(&mut none, &LayoutConfig::default());
    }

    #[test]
    fn jitter_stays_in_band() {
        for id in ["a", "episode_1", "concept_deep-work", "ك"] {
            assert!(jitter_for(id, 60.0).abs() <= 60.0);
        }
        assert_eq!(jitter_for("x", 0.0), 0.0);
    }
}
