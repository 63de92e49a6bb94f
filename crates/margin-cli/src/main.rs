//! Margin CLI - search, explore and get recommendations from a podcast catalog.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use margin::core::EntityKind;
use margin::graph::NodeType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "margin")]
#[command(author, version, about = "Margin - knowledge retrieval for long-form audio", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: margin.toml in this or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default margin.toml
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Semantic search over the catalog
    Search {
        /// Search query
        query: String,

        /// Maximum results (default from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity (default from config)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Restrict to kinds (e.g. "book,speaker")
        #[arg(short, long, value_delimiter = ',')]
        kind: Vec<EntityKind>,
    },

    /// Items similar to an indexed item
    Similar {
        /// Kind of the item (episode, book, speaker, quote)
        kind: EntityKind,
        /// Catalog id of the item
        id: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Explore the knowledge graph
    Graph {
        #[command(subcommand)]
        command: GraphCommands,
    },

    /// Recommend catalog items for a listener profile
    Recommend {
        /// Favorite topics (e.g. "habits,deep work")
        #[arg(short, long, value_delimiter = ',')]
        topic: Vec<String>,

        /// Kind of item to recommend
        #[arg(short, long, default_value = "book")]
        kind: EntityKind,

        /// Preferred mood
        #[arg(long)]
        mood: Option<String>,

        /// Preferred tone
        #[arg(long)]
        tone: Option<String>,

        /// Preferred duration (short, medium, long)
        #[arg(long)]
        duration: Option<margin::rank::DurationPreference>,

        /// Episode ids already listened to; they are skipped
        #[arg(long, value_delimiter = ',')]
        listened: Vec<String>,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum GraphCommands {
    /// Node, edge and component counts
    Stats,

    /// Most connected nodes
    Top {
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Only nodes of this type
        #[arg(short = 't', long = "type")]
        node_type: Option<NodeType>,
    },

    /// Neighborhood of a node
    Neighbors {
        /// Node id (e.g. "book_B1")
        node: String,

        #[arg(short, long, default_value = "1")]
        depth: usize,
    },

    /// Shortest path between two nodes
    Path {
        from: String,
        to: String,

        /// Maximum hops (default from config)
        #[arg(short, long)]
        max_depth: Option<usize>,
    },

    /// Find nodes by label
    Find {
        query: String,

        /// Only nodes of these types
        #[arg(short = 't', long = "type", value_delimiter = ',')]
        node_type: Vec<NodeType>,
    },

    /// Export the full graph as JSON
    Export {
        /// Output file path
        output: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "margin=debug,margin_graph=debug,margin_vectors=debug,margin_rank=debug,margin_embeddings=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = commands::Output { json: cli.json };
    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        command => {
            let loaded = config::load(cli.config.as_deref())?;
            dispatch(command, &loaded, output).await
        }
    }
}

async fn dispatch(command: Commands, loaded: &config::Loaded, output: commands::Output) -> Result<()> {
    match command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Search {
            query,
            limit,
            threshold,
            kind,
        } => commands::search::search(loaded, output, &query, limit, threshold, kind).await,
        Commands::Similar { kind, id, limit } => {
            commands::search::similar(loaded, output, kind, &id, limit).await
        }
        Commands::Graph { command } => match command {
            GraphCommands::Stats => commands::graph::stats(loaded, output).await,
            GraphCommands::Top { limit, node_type } => {
                commands::graph::top(loaded, output, limit, node_type).await
            }
            GraphCommands::Neighbors { node, depth } => {
                commands::graph::neighbors(loaded, output, &node, depth).await
            }
            GraphCommands::Path { from, to, max_depth } => {
                commands::graph::path(loaded, output, &from, &to, max_depth).await
            }
            GraphCommands::Find { query, node_type } => {
                commands::graph::find(loaded, output, &query, &node_type).await
            }
            GraphCommands::Export { output: file } => commands::graph::export(loaded, &file).await,
        },
        Commands::Recommend {
            topic,
            kind,
            mood,
            tone,
            duration,
            listened,
            limit,
        } => {
            let request = commands::recommend::Request {
                topics: topic,
                kind,
                mood,
                tone,
                duration,
                listened,
                limit,
            };
            commands::recommend::run(loaded, output, request).await
        }
    }
}
