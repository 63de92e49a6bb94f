//! Explore the knowledge graph.

use anyhow::{Context, Result};
use colored::Colorize;
use margin::graph::{GraphNode, NodeType};
use serde::Serialize;
use std::path::Path;

use super::{open_engine, Output};
use crate::config::Loaded;

#[derive(Serialize)]
struct RankedNode<'a> {
    node: &'a GraphNode,
    degree: usize,
}

pub async fn stats(loaded: &Loaded, output: Output) -> Result<()> {
    let engine = open_engine(loaded)?;
    let stats = engine.graph_stats().await?;
    if output.json(&stats)? {
        return Ok(());
    }

    println!("{}", "Margin Graph Statistics".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Graph Structure".blue().bold());
    println!("  Total nodes:       {}", stats.node_count.to_string().cyan());
    println!("  Total edges:       {}", stats.edge_count.to_string().cyan());
    println!("  Components:        {}", stats.connected_components.to_string().cyan());
    println!("  Avg degree:        {:.2}", stats.average_degree);
    println!("  Density:           {:.6}", stats.density);
    println!();

    println!("{}", "Node Types".blue().bold());
    for (node_type, count) in &stats.nodes_by_type {
        println!("  {:<18} {}", format!("{}:", node_type), count.to_string().cyan());
    }
    println!();

    println!("{}", "Edge Types".blue().bold());
    for (edge_type, count) in &stats.edges_by_type {
        println!("  {:<18} {}", format!("{}:", edge_type), count.to_string().cyan());
    }

    println!();
    println!("{}", "═".repeat(40).dimmed());
    Ok(())
}

pub async fn top(loaded: &Loaded, output: Output, limit: usize, node_type: Option<NodeType>) -> Result<()> {
    let engine = open_engine(loaded)?;
    let top = engine.most_connected(limit, node_type).await?;

    let ranked: Vec<RankedNode<'_>> = top
        .iter()
        .map(|(node, degree)| RankedNode { node, degree: *degree })
        .collect();
    if output.json(&ranked)? {
        return Ok(());
    }

    let scope = node_type.map(|t| format!("{} ", t)).unwrap_or_default();
    println!(
        "{} Top {} most connected {}nodes:",
        "→".blue(),
        limit.to_string().cyan(),
        scope
    );
    println!();

    for (i, entry) in ranked.iter().enumerate() {
        let rank = format!("{}.", i + 1);
        println!(
            "  {} {} {} {}",
            rank.blue(),
            entry.node.label.white().bold(),
            format!("[{}]", entry.node.id).dimmed(),
            format!("({} connections)", entry.degree).dimmed()
        );
    }
    Ok(())
}

pub async fn neighbors(loaded: &Loaded, output: Output, node: &str, depth: usize) -> Result<()> {
    let engine = open_engine(loaded)?;
    let sub = engine.node_subgraph(node, depth).await?;
    if output.json(&sub)? {
        return Ok(());
    }

    println!(
        "{} {} {} within {} hops:",
        "→".blue(),
        sub.center.label.cyan().bold(),
        format!("[{}]", sub.center.id).dimmed(),
        depth
    );
    println!();

    print_group("Books", &sub.related_books);
    print_group("Episodes", &sub.related_episodes);
    print_group("Speakers", &sub.related_speakers);

    let others: Vec<GraphNode> = sub
        .neighbors
        .iter()
        .filter(|n| {
            !matches!(
                n.node_type,
                NodeType::Book | NodeType::Episode | NodeType::Speaker
            )
        })
        .cloned()
        .collect();
    print_group("Other", &others);

    println!(
        "{} {} neighbors, {} edges",
        "✓".green(),
        sub.neighbors.len().to_string().cyan(),
        sub.edges.len().to_string().cyan()
    );
    Ok(())
}

fn print_group(title: &str, nodes: &[GraphNode]) {
    if nodes.is_empty() {
        return;
    }
    println!("{}", title.blue().bold());
    for node in nodes {
        println!("  • {} {}", node.label, format!("[{}]", node.id).dimmed());
    }
    println!();
}

pub async fn path(
    loaded: &Loaded,
    output: Output,
    from: &str,
    to: &str,
    max_depth: Option<usize>,
) -> Result<()> {
    let engine = open_engine(loaded)?;
    let path = engine.find_path(from, to, max_depth).await?;
    if output.json(&path)? {
        return Ok(());
    }

    println!("{} Finding path: {} → {}", "→".blue(), from.cyan(), to.cyan());
    println!();

    match path {
        Some(path) => {
            println!("  Path length: {} hops", (path.len() - 1).to_string().green());
            println!();
            println!("  Path:");
            for (i, node) in path.iter().enumerate() {
                let prefix = if i == 0 {
                    "  ●".green().to_string()
                } else if i == path.len() - 1 {
                    "  ●".blue().to_string()
                } else {
                    "  │".dimmed().to_string()
                };
                println!("{} {} {}", prefix, node.label, format!("[{}]", node.id).dimmed());
            }
        }
        None => {
            let limit = max_depth.unwrap_or(engine.config().graph.max_path_depth);
            println!(
                "  {} No path found between {} and {} within {} hops",
                "✗".red(),
                from,
                to,
                limit
            );
        }
    }
    Ok(())
}

pub async fn find(loaded: &Loaded, output: Output, query: &str, types: &[NodeType]) -> Result<()> {
    let engine = open_engine(loaded)?;
    let types = (!types.is_empty()).then_some(types);
    let nodes = engine.search_nodes(query, types).await?;
    if output.json(&nodes)? {
        return Ok(());
    }

    if nodes.is_empty() {
        println!("{} No nodes match: {}", "•".yellow(), query.cyan());
        return Ok(());
    }

    for node in &nodes {
        println!(
            "  {} {} {}",
            format!("{:<8}", node.node_type).blue(),
            node.label.white().bold(),
            format!("[{}]", node.id).dimmed()
        );
    }
    println!();
    println!("{} {} nodes", "✓".green(), nodes.len().to_string().cyan());
    Ok(())
}

pub async fn export(loaded: &Loaded, file: &Path) -> Result<()> {
    let engine = open_engine(loaded)?;

    println!("{} Building graph...", "→".blue());
    let graph = engine.full_graph(false).await?;
    let json = graph.to_json().context("Failed to serialize graph")?;
    std::fs::write(file, json).with_context(|| format!("Failed to write {}", file.display()))?;

    println!(
        "{} Exported {} nodes and {} edges to {}",
        "✓".green(),
        graph.metadata.node_count.to_string().cyan(),
        graph.metadata.edge_count.to_string().cyan(),
        file.display()
    );
    Ok(())
}
