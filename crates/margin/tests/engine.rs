//! End-to-end engine scenarios over small catalogs.

use margin::graph::GraphError;
use margin::prelude::*;
use margin::SIMPLE_THRESHOLD;
use margin::core::{EpisodeBook, EpisodeSpeaker, SpeakerRole};
use std::sync::Arc;

fn catalog() -> Catalog {
    Catalog {
        episodes: vec![Episode {
            id: "E1".into(),
            title: "Habits with James".into(),
            topics: vec!["habits".into()],
            ..Default::default()
        }],
        books: vec![
            Book {
                id: "B1".into(),
                title: "Atomic Habits".into(),
                concepts: vec!["habits".into()],
                ..Default::default()
            },
            Book {
                id: "B2".into(),
                title: "Deep Work".into(),
                concepts: vec!["focus".into()],
                ..Default::default()
            },
        ],
        speakers: vec![Speaker {
            id: "S1".into(),
            name: "James Clear".into(),
            ..Default::default()
        }],
        quotes: vec![Quote {
            id: "Q1".into(),
            text: "You do not rise to the level of your goals.".into(),
            episode_id: Some("E1".into()),
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
    }
}

fn engine_over(source: Arc<InMemoryCatalog>) -> KnowledgeEngine {
    KnowledgeEngine::new(EngineConfig::default(), source).unwrap()
}

fn engine() -> KnowledgeEngine {
    engine_over(Arc::new(InMemoryCatalog::new(catalog())))
}

fn book(id: &str, title: &str) -> Book {
    Book {
        id: id.into(),
        title: title.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn indexes_every_entity_and_searches_them() {
    let engine = engine();
    assert_eq!(engine.index_catalog().await.unwrap(), 5);

    let options = engine.search_options();
    assert_eq!(options.threshold, SIMPLE_THRESHOLD);
    let hits = engine.search("habits", &options).await.unwrap();

    let mut top: Vec<(&str, EntityKind)> = hits.iter().take(2).map(|h| (h.id.as_str(), h.kind)).collect();
    top.sort();
    assert_eq!(top, vec![("B1", EntityKind::Book), ("E1", EntityKind::Episode)]);
    assert!(hits.iter().all(|h| h.score >= options.threshold));

    // Re-indexing is idempotent.
    assert_eq!(engine.index_catalog().await.unwrap(), 5);
    assert_eq!(engine.index().len().await.unwrap(), 5);
}

#[tokio::test]
async fn paraphrased_query_ranks_habit_books_first() {
    let catalog = Catalog {
        books: vec![
            book("A", "habits and identity"),
            book("B", "deep focus and work"),
            book("C", "habits and identity change"),
        ],
        ..Default::default()
    };
    let engine = engine_over(Arc::new(InMemoryCatalog::new(catalog)));
    engine.index_catalog().await.unwrap();

    let options = engine.search_options().with_limit(2);
    let hits = engine
        .search("building better habits", &options)
        .await
        .unwrap();

    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
    assert!(hits.iter().all(|h| h.score >= options.threshold));
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn symbol_only_title_does_not_block_indexing() {
    let catalog = Catalog {
        episodes: vec![Episode {
            id: "E1".into(),
            title: "Q&A".into(),
            ..Default::default()
        }],
        books: vec![book("B1", "Atomic Habits")],
        ..Default::default()
    };
    let engine = engine_over(Arc::new(InMemoryCatalog::new(catalog)));
    assert_eq!(engine.index_catalog().await.unwrap(), 2);

    let profile = UserProfile::new().with_topic("habits", 1.0);
    let episodes = engine
        .recommend(&profile, EntityKind::Episode, &RecommendOptions::default())
        .await
        .unwrap();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].id, "E1");
}

#[tokio::test]
async fn search_before_indexing_is_empty() {
    let hits = engine()
        .search("habits", &SearchOptions::default())
        .await
        .unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn find_similar_excludes_the_item_itself() {
    let engine = engine();
    engine.index_catalog().await.unwrap();

    let similar = engine
        .find_similar(EntityKind::Book, "B1", 10)
        .await
        .unwrap();
    assert!(similar.iter().all(|h| !(h.id == "B1" && h.kind == EntityKind::Book)));

    let missing = engine.find_similar(EntityKind::Book, "nope", 10).await;
    assert!(matches!(missing, Err(Error::Vector(_))));
}

#[tokio::test]
async fn graph_queries_go_through_the_facade() {
    let engine = engine();

    let top = engine.most_connected(1, None).await.unwrap();
    assert_eq!(top[0].0.id, "episode_E1");

    let path = engine
        .find_path("book_B1", "speaker_S1", None)
        .await
        .unwrap()
        .unwrap();
    let ids: Vec<&str> = path.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["book_B1", "episode_E1", "speaker_S1"]);

    let sub = engine.node_subgraph("episode_E1", 1).await.unwrap();
    assert_eq!(sub.center.id, "episode_E1");
    assert_eq!(sub.related_books.len(), 1);

    let books = engine.graph_by_type(&[NodeType::Book]).await.unwrap();
    assert_eq!(books.nodes.len(), 2);
    assert!(books.edges.is_empty());

    let found = engine.search_nodes("atomic", None).await.unwrap();
    assert_eq!(found.len(), 1);

    let stats = engine.graph_stats().await.unwrap();
    assert_eq!(stats.nodes_by_type[&NodeType::Book], 2);
    assert!(engine.full_graph(false).await.unwrap().is_consistent());
}

#[tokio::test]
async fn unknown_node_keeps_its_graph_error() {
    let result = engine().node_subgraph("book_missing", 1).await;
    assert!(matches!(
        result,
        Err(Error::Graph(GraphError::NodeNotFound(id))) if id == "book_missing"
    ));
}

#[tokio::test]
async fn invalidate_picks_up_catalog_changes() {
    let source = Arc::new(InMemoryCatalog::new(catalog()));
    let engine = engine_over(source.clone());
    let before = engine.full_graph(false).await.unwrap();

    let mut changed = catalog();
    changed.books.push(Book {
        id: "B3".into(),
        title: "Range".into(),
        ..Default::default()
    });
    source.replace(changed);

    let cached = engine.full_graph(false).await.unwrap();
    assert!(Arc::ptr_eq(&before, &cached));

    engine.invalidate_graph().await;
    let rebuilt = engine.full_graph(false).await.unwrap();
    assert!(rebuilt.node("book_B3").is_some());
}

#[tokio::test]
async fn recommends_books_for_a_topic() {
    let engine = engine();
    engine.index_catalog().await.unwrap();

    let profile = UserProfile::new().with_topic("habits", 1.0);
    let items = engine
        .recommend(&profile, EntityKind::Book, &RecommendOptions::default())
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "B1");
    assert_eq!(items[0].signals.topic_match, 1.0);
    assert!(!items[0].reason.is_empty());
}

#[tokio::test]
async fn json_catalog_from_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    let json = serde_json::to_string(&catalog()).unwrap();
    std::fs::write(dir.path().join("catalog.json"), json).unwrap();

    let engine = KnowledgeEngine::from_json_catalog(EngineConfig::default(), dir.path()).unwrap();
    assert_eq!(engine.index_catalog().await.unwrap(), 5);

    let mut config = EngineConfig::default();
    config.catalog.path = "missing.json".into();
    let engine = KnowledgeEngine::from_json_catalog(config, dir.path()).unwrap();
    assert!(matches!(engine.index_catalog().await, Err(Error::Catalog(_))));
}

#[tokio::test]
async fn configured_search_defaults_are_applied() {
    let config = EngineConfig::from_toml_str("[search]\nlimit = 1\nthreshold = -1.0").unwrap();
    let engine =
        KnowledgeEngine::new(config, Arc::new(InMemoryCatalog::new(catalog()))).unwrap();
    engine.index_catalog().await.unwrap();

    let hits = engine
        .search("something else entirely", &engine.search_options())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn invalid_ranking_weights_fail_construction() {
    let mut config = EngineConfig::default();
    config.ranking.weights.topic = 0.9;
    let result = KnowledgeEngine::new(config, Arc::new(InMemoryCatalog::default()));
    assert!(matches!(result, Err(Error::Rank(_))));
}
