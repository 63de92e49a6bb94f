//! Semantic search over the catalog.

use anyhow::Result;
use colored::Colorize;
use margin::core::EntityKind;
use margin::vectors::RankedResult;

use super::{open_indexed_engine, Output};
use crate::config::Loaded;

const SNIPPET_CHARS: usize = 80;

pub async fn search(
    loaded: &Loaded,
    output: Output,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f32>,
    kinds: Vec<EntityKind>,
) -> Result<()> {
    let engine = open_indexed_engine(loaded).await?;

    let mut options = engine.search_options();
    if let Some(limit) = limit {
        options = options.with_limit(limit);
    }
    if let Some(threshold) = threshold {
        options = options.with_threshold(threshold);
    }
    if !kinds.is_empty() {
        options = options.with_kinds(kinds);
    }

    let results = engine.search(query, &options).await?;
    if output.json(&results)? {
        return Ok(());
    }

    if results.is_empty() {
        println!("{} No results found for: {}", "•".yellow(), query.cyan());
        return Ok(());
    }

    println!(
        "{} Results for {} (threshold={}):",
        "→".blue(),
        query.cyan().bold(),
        options.threshold
    );
    println!();
    print_results(&results);
    Ok(())
}

pub async fn similar(loaded: &Loaded, output: Output, kind: EntityKind, id: &str, limit: usize) -> Result<()> {
    let engine = open_indexed_engine(loaded).await?;
    let results = engine.find_similar(kind, id, limit).await?;
    if output.json(&results)? {
        return Ok(());
    }

    if results.is_empty() {
        println!("{} Nothing similar to {} {}", "•".yellow(), kind, id.cyan());
        return Ok(());
    }

    println!("{} Similar to {} {}:", "→".blue(), kind, id.cyan().bold());
    println!();
    print_results(&results);
    Ok(())
}

fn print_results(results: &[RankedResult]) {
    for (i, result) in results.iter().enumerate() {
        let rank = format!("{}.", i + 1);
        let title = result
            .metadata
            .title()
            .map(str::to_string)
            .unwrap_or_else(|| snippet(&result.content));

        println!(
            "  {} {} {} {}",
            rank.blue(),
            title.white().bold(),
            format!("[{} {}]", result.kind, result.id).dimmed(),
            format!("({:.3})", result.score).dimmed()
        );
    }

    println!();
    println!("{} {} results", "✓".green(), results.len().to_string().cyan());
}

fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
