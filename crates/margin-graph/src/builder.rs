//! Builds a [`KnowledgeGraph`] snapshot from a catalog.
//!
//! Nodes come first: one per episode, book, speaker and quote, then one per
//! distinct episode topic and distinct book concept. Edges are collected per
//! relationship, deduplicated by `(source, target, type)` keeping the
//! strongest weight, and finally filtered to existing endpoints.

use crate::config::{EdgeWeights, GraphConfig};
use crate::layout::{apply_layout, LayoutConfig};
use crate::model::{node_id, EdgeType, EdgeWeight, GraphEdge, GraphNode, KnowledgeGraph, NodeId, NodeProps, NodeType};
use indexmap::map::Entry;
use indexmap::IndexMap;
use margin_core::{slugify, Book, Catalog, EntityKind, Episode, OriginalRef, Position, Quote, Speaker, SpeakerRole};
use std::collections::HashMap;

const QUOTE_LABEL_CHARS: usize = 60;
const MAX_SIZE_BONUS_DEGREE: usize = 15;

/// Deterministic catalog-to-graph transformation.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    weights: EdgeWeights,
    layout: LayoutConfig,
}

impl GraphBuilder {
    pub fn new(weights: EdgeWeights, layout: LayoutConfig) -> Self {
        Self { weights, layout }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.weights.clone(), config.layout.clone())
    }

    pub fn weights(&self) -> &EdgeWeights {
        &self.weights
    }

    /// Build a laid-out snapshot tagged with `version`.
    pub fn build(&self, catalog: &Catalog, version: u64) -> KnowledgeGraph {
        let nodes = self.collect_nodes(catalog);
        let edges = self.collect_edges(catalog);

        let mut graph = KnowledgeGraph::new(nodes, edges, version);

        let mut degree: HashMap<&str, usize> = HashMap::new();
        for edge in &graph.edges {
            *degree.entry(edge.source.as_str()).or_default() += 1;
            *degree.entry(edge.target.as_str()).or_default() += 1;
        }
        let sizes: Vec<f64> = graph
            .nodes
            .iter()
            .map(|n| {
                let d = degree.get(n.id.as_str()).copied().unwrap_or(0);
                n.node_type.base_size() + 2.0 * d.min(MAX_SIZE_BONUS_DEGREE) as f64
            })
            .collect();
        for (node, size) in graph.nodes.iter_mut().zip(sizes) {
            node.size = size;
        }

        apply_layout(&mut graph.nodes, &self.layout);

        tracing::info!(
            nodes = graph.metadata.node_count,
            edges = graph.metadata.edge_count,
            version,
            "built knowledge graph"
        );
        graph
    }

    fn collect_nodes(&self, catalog: &Catalog) -> Vec<GraphNode> {
        let mut nodes: IndexMap<NodeId, GraphNode> = IndexMap::new();
        let mut push = |node: GraphNode| match nodes.entry(node.id.clone()) {
            Entry::Occupied(_) => tracing::debug!(node = %node.id, "skipping duplicate entity"),
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
        };

        for e in &catalog.episodes {
            push(episode_node(e));
        }
        for b in &catalog.books {
            push(book_node(b));
        }
        for s in &catalog.speakers {
            push(speaker_node(s));
        }
        for q in &catalog.quotes {
            push(quote_node(q));
        }

        let topics = distinct_labels(catalog.episodes.iter().flat_map(|e| e.topics.iter()));
        for (slug, label) in topics {
            push(derived_node(NodeType::Topic, slug, label));
        }
        let concepts = distinct_labels(catalog.books.iter().flat_map(|b| b.concepts.iter()));
        for (slug, label) in concepts {
            push(derived_node(NodeType::Concept, slug, label));
        }

        nodes.into_values().collect()
    }

    fn collect_edges(&self, catalog: &Catalog) -> Vec<GraphEdge> {
        let w = &self.weights;
        let mut edges = EdgeSet::default();

        for row in &catalog.episode_books {
            let weight = if row.explicit {
                w.explicit_mention
            } else {
                w.inferred_mention
            };
            edges.add(
                node_id(NodeType::Episode, &row.episode_id),
                node_id(NodeType::Book, &row.book_id),
                EdgeType::Mentions,
                weight,
            );
        }

        for row in &catalog.episode_speakers {
            let weight = match row.role {
                SpeakerRole::Host => w.host,
                SpeakerRole::Guest => w.guest,
            };
            edges.add(
                node_id(NodeType::Episode, &row.episode_id),
                node_id(NodeType::Speaker, &row.speaker_id),
                EdgeType::Features,
                weight,
            );
        }

        for q in &catalog.quotes {
            let quote = node_id(NodeType::Quote, &q.id);
            if let Some(episode_id) = &q.episode_id {
                edges.add(
                    node_id(NodeType::Episode, episode_id),
                    quote.clone(),
                    EdgeType::ContainsQuote,
                    w.contains_quote,
                );
            }
            if let Some(book_id) = &q.book_id {
                edges.add(
                    quote.clone(),
                    node_id(NodeType::Book, book_id),
                    EdgeType::QuotesFrom,
                    w.quotes_from,
                );
            }
            if let Some(speaker_id) = &q.speaker_id {
                edges.add(
                    quote.clone(),
                    node_id(NodeType::Speaker, speaker_id),
                    EdgeType::SaidBy,
                    w.said_by,
                );
            }
        }

        for e in &catalog.episodes {
            for slug in slugs(&e.topics) {
                edges.add(
                    node_id(NodeType::Episode, &e.id),
                    node_id(NodeType::Topic, &slug),
                    EdgeType::Discusses,
                    w.discusses,
                );
            }
        }

        for b in &catalog.books {
            for slug in slugs(&b.concepts) {
                edges.add(
                    node_id(NodeType::Book, &b.id),
                    node_id(NodeType::Concept, &slug),
                    EdgeType::Explores,
                    w.explores,
                );
            }
            if let Some(speaker_id) = &b.author_speaker_id {
                edges.add(
                    node_id(NodeType::Speaker, speaker_id),
                    node_id(NodeType::Book, &b.id),
                    EdgeType::Authored,
                    w.authored,
                );
            }
        }

        // Topic and concept meet when an episode discusses the topic and
        // mentions a book exploring the concept.
        for e in &catalog.episodes {
            let topic_slugs = slugs(&e.topics);
            if topic_slugs.is_empty() {
                continue;
            }
            for book in catalog.books_for_episode(&e.id) {
                for concept in slugs(&book.concepts) {
                    for topic in &topic_slugs {
                        if *topic != concept {
                            edges.add(
                                node_id(NodeType::Topic, topic),
                                node_id(NodeType::Concept, &concept),
                                EdgeType::Related,
                                w.related,
                            );
                        }
                    }
                }
            }
        }

        edges.into_vec()
    }
}

/// Edges keyed by `(source, target, type)`; re-adding keeps the stronger weight.
#[derive(Default)]
struct EdgeSet {
    edges: IndexMap<(NodeId, NodeId, EdgeType), GraphEdge>,
}

impl EdgeSet {
    fn add(&mut self, source: NodeId, target: NodeId, edge_type: EdgeType, weight: EdgeWeight) {
        match self.edges.entry((source.clone(), target.clone(), edge_type)) {
            Entry::Occupied(mut existing) => {
                let edge = existing.get_mut();
                edge.weight = edge.weight.max(weight);
            }
            Entry::Vacant(slot) => {
                slot.insert(GraphEdge::new(source, target, edge_type, weight));
            }
        }
    }

    fn into_vec(self) -> Vec<GraphEdge> {
        self.edges.into_values().collect()
    }
}

/// Distinct non-empty slugs, in first-seen order.
fn slugs(labels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let slug = slugify(label);
        if !slug.is_empty() && !out.contains(&slug) {
            out.push(slug);
        }
    }
    out
}

/// Slug to first-seen label for derived pseudo-entities.
fn distinct_labels<'a>(labels: impl Iterator<Item = &'a String>) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for label in labels {
        let slug = slugify(label);
        if !slug.is_empty() {
            out.entry(slug).or_insert_with(|| label.trim().to_string());
        }
    }
    out
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

fn base_node(
    node_type: NodeType,
    original_id: &str,
    label: String,
    label_ar: Option<String>,
    properties: NodeProps,
) -> GraphNode {
    GraphNode {
        id: node_id(node_type, original_id),
        node_type,
        label,
        label_ar,
        size: node_type.base_size(),
        color: node_type.color().to_string(),
        position: Position::default(),
        properties,
    }
}

fn episode_node(e: &Episode) -> GraphNode {
    base_node(
        NodeType::Episode,
        &e.id,
        e.title.clone(),
        e.title_ar.clone(),
        NodeProps::Episode {
            original: OriginalRef::new(EntityKind::Episode, &e.id),
            topics: e.topics.clone(),
            duration_minutes: e.duration_minutes,
            published_at: e.published_at,
            listen_count: e.listen_count,
        },
    )
}

fn book_node(b: &Book) -> GraphNode {
    base_node(
        NodeType::Book,
        &b.id,
        b.title.clone(),
        b.title_ar.clone(),
        NodeProps::Book {
            original: OriginalRef::new(EntityKind::Book, &b.id),
            author: b.author.clone(),
            category: b.category.clone(),
        },
    )
}

fn speaker_node(s: &Speaker) -> GraphNode {
    base_node(
        NodeType::Speaker,
        &s.id,
        s.name.clone(),
        s.name_ar.clone(),
        NodeProps::Speaker {
            original: OriginalRef::new(EntityKind::Speaker, &s.id),
            expertise: s.expertise.clone(),
        },
    )
}

fn quote_node(q: &Quote) -> GraphNode {
    base_node(
        NodeType::Quote,
        &q.id,
        truncate_label(&q.text, QUOTE_LABEL_CHARS),
        q.text_ar
            .as_deref()
            .map(|ar| truncate_label(ar, QUOTE_LABEL_CHARS)),
        NodeProps::Quote {
            original: OriginalRef::new(EntityKind::Quote, &q.id),
            text: q.text.clone(),
        },
    )
}

fn derived_node(node_type: NodeType, slug: String, label: String) -> GraphNode {
    let properties = match node_type {
        NodeType::Concept => NodeProps::Concept { slug: slug.clone() },
        _ => NodeProps::Topic { slug: slug.clone() },
    };
    base_node(node_type, &slug, label, None, properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use margin_core::{EpisodeBook, EpisodeSpeaker};

    fn scenario() -> Catalog {
        Catalog {
            episodes: vec![Episode {
                id: "E1".into(),
                title: "Habits with James".into(),
                ..Default::default()
            }],
            books: vec![Book {
                id: "B1".into(),
                title: "Atomic Habits".into(),
                ..Default::default()
            }],
            speakers: vec![Speaker {
                id: "S1".into(),
                name: "James Clear".into(),
                ..Default::default()
            }],
            episode_books: vec![EpisodeBook {
                episode_id: "E1".into(),
                book_id: "B1".into(),
                explicit: true,
            }],
            episode_speakers: vec![EpisodeSpeaker {
                episode_id: "E1".into(),
                speaker_id: "S1".into(),
                role: SpeakerRole::Guest,
            }],
            ..Default::default()
        }
    }

    fn weight_of(graph: &KnowledgeGraph, source: &str, target: &str) -> Option<EdgeWeight> {
        graph
            .edges
            .iter()
            .find(|e| e.source == source && e.target == target)
            .map(|e| e.weight)
    }

    #[test]
    fn builds_scenario_graph() {
        let graph = GraphBuilder::default().build(&scenario(), 1);

        let ids: Vec<_> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["episode_E1", "book_B1", "speaker_S1"]);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(weight_of(&graph, "episode_E1", "book_B1"), Some(EdgeWeight::Strong));
        assert_eq!(weight_of(&graph, "episode_E1", "speaker_S1"), Some(EdgeWeight::Medium));
        assert_eq!(graph.metadata.version, 1);
        assert!(graph.is_consistent());
    }

    #[test]
    fn duplicate_relations_keep_strongest_weight() {
        let mut catalog = scenario();
        catalog.episode_books.push(EpisodeBook {
            episode_id: "E1".into(),
            book_id: "B1".into(),
            explicit: false,
        });
        catalog.episode_books.insert(
            0,
            EpisodeBook {
                episode_id: "E1".into(),
                book_id: "B1".into(),
                explicit: false,
            },
        );

        let graph = GraphBuilder::default().build(&catalog, 1);
        let mentions: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Mentions)
            .collect();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].weight, EdgeWeight::Strong);
    }

    #[test]
    fn dangling_join_rows_are_dropped() {
        let mut catalog = scenario();
        catalog.episode_books.push(EpisodeBook {
            episode_id: "E1".into(),
            book_id: "deleted".into(),
            explicit: true,
        });
        catalog.quotes.push(Quote {
            id: "Q1".into(),
            text: "You do not rise to the level of your goals.".into(),
            episode_id: Some("E1".into()),
            speaker_id: Some("ghost".into()),
            ..Default::default()
        });

        let graph = GraphBuilder::default().build(&catalog, 1);
        assert!(graph.is_consistent());
        assert!(weight_of(&graph, "episode_E1", "quote_Q1").is_some());
        assert!(graph.edges.iter().all(|e| !e.touches("speaker_ghost")));
        assert!(graph.edges.iter().all(|e| !e.touches("book_deleted")));
    }

    #[test]
    fn topics_and_concepts_are_deduplicated_by_slug() {
        let mut catalog = scenario();
        catalog.episodes[0].topics = vec!["Habits".into(), "habits".into(), "Identity".into()];
        catalog.episodes.push(Episode {
            id: "E2".into(),
            title: "Focus".into(),
            topics: vec!["HABITS ".into(), "Deep Work".into()],
            ..Default::default()
        });
        catalog.books[0].concepts = vec!["Identity".into(), "Habit Stacking".into()];

        let graph = GraphBuilder::default().build(&catalog, 1);
        let topics: Vec<_> = graph
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Topic)
            .map(|n| (n.id.as_str(), n.label.as_str()))
            .collect();
        assert_eq!(
            topics,
            vec![
                ("topic_habits", "Habits"),
                ("topic_identity", "Identity"),
                ("topic_deep-work", "Deep Work"),
            ]
        );

        let discusses = graph
            .edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Discusses)
            .count();
        assert_eq!(discusses, 4);

        let concepts = graph
            .nodes
            .iter()
            .filter(|n| n.node_type == NodeType::Concept)
            .count();
        assert_eq!(concepts, 2);
    }

    #[test]
    fn related_edges_link_topics_to_concepts_of_mentioned_books() {
        let mut catalog = scenario();
        catalog.episodes[0].topics = vec!["Habits".into(), "Identity".into()];
        catalog.books[0].concepts = vec!["Identity".into(), "Habit Stacking".into()];

        let graph = GraphBuilder::default().build(&catalog, 1);
        let mut related: Vec<_> = graph
            .edges
            .iter()
            .filter(|e| e.edge_type == EdgeType::Related)
            .map(|e| (e.source.as_str(), e.target.as_str(), e.weight))
            .collect();
        related.sort();
        assert_eq!(
            related,
            vec![
                ("topic_habits", "concept_habit-stacking", EdgeWeight::Weak),
                ("topic_habits", "concept_identity", EdgeWeight::Weak),
                ("topic_identity", "concept_habit-stacking", EdgeWeight::Weak),
            ]
        );
    }

    #[test]
    fn quote_and_authorship_edges() {
        let mut catalog = scenario();
        catalog.books[0].author_speaker_id = Some("S1".into());
        catalog.quotes.push(Quote {
            id: "Q1".into(),
            text: "Every action is a vote for the type of person you wish to become.".into(),
            episode_id: Some("E1".into()),
            book_id: Some("B1".into()),
            speaker_id: Some("S1".into()),
            ..Default::default()
        });

        let graph = GraphBuilder::default().build(&catalog, 1);
        assert_eq!(weight_of(&graph, "speaker_S1", "book_B1"), Some(EdgeWeight::Strong));
        assert_eq!(weight_of(&graph, "episode_E1", "quote_Q1"), Some(EdgeWeight::Strong));
        assert_eq!(weight_of(&graph, "quote_Q1", "book_B1"), Some(EdgeWeight::Strong));
        assert_eq!(weight_of(&graph, "quote_Q1", "speaker_S1"), Some(EdgeWeight::Medium));

        let quote = graph.node("quote_Q1").unwrap();
        assert!(quote.label.ends_with('…'));
        assert!(quote.label.chars().count() <= QUOTE_LABEL_CHARS + 1);
    }

    #[test]
    fn nodes_reference_catalog_entities() {
        let catalog = scenario();
        let graph = GraphBuilder::default().build(&catalog, 1);

        for node in &graph.nodes {
            let original = node.properties.original().unwrap();
            let entity = catalog.resolve(original).unwrap();
            assert_eq!(entity.title(), node.label);
        }
    }

    #[test]
    fn size_grows_with_degree() {
        let graph = GraphBuilder::default().build(&scenario(), 1);
        let episode = graph.node("episode_E1").unwrap();
        assert_eq!(episode.size, NodeType::Episode.base_size() + 4.0);
        assert_eq!(episode.color, NodeType::Episode.color());
    }

    #[test]
    fn build_is_deterministic() {
        let mut catalog = scenario();
        catalog.episodes[0].topics = vec!["Habits".into(), "Identity".into()];
        catalog.books[0].concepts = vec!["Identity".into()];

        let builder = GraphBuilder::default();
        let a = builder.build(&catalog, 1);
        let b = builder.build(&catalog, 2);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn empty_catalog_builds_empty_graph() {
        let graph = GraphBuilder::default().build(&Catalog::default(), 1);
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
    }
}
