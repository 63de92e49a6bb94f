//! CLI command implementations.

pub mod graph;
pub mod init;
pub mod recommend;
pub mod search;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use margin::KnowledgeEngine;
use std::time::Duration;

use crate::config::Loaded;

/// How results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    /// Print `value` as pretty JSON when `--json` was given. Returns whether it did.
    pub fn json<T: serde::Serialize>(&self, value: &T) -> Result<bool> {
        if !self.json {
            return Ok(false);
        }
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", text);
        Ok(true)
    }
}

/// Engine over the catalog named in the loaded config.
pub fn open_engine(loaded: &Loaded) -> Result<KnowledgeEngine> {
    let catalog = loaded.base_dir.join(&loaded.config.catalog.path);
    if !catalog.exists() {
        anyhow::bail!(
            "Catalog not found: {}. Set [catalog] path in {}.",
            catalog.display(),
            crate::config::CONFIG_FILE.cyan()
        );
    }
    KnowledgeEngine::from_json_catalog(loaded.config.clone(), &loaded.base_dir)
        .context("Failed to create engine")
}

/// Engine with the catalog embedded into its similarity index.
pub async fn open_indexed_engine(loaded: &Loaded) -> Result<KnowledgeEngine> {
    let engine = open_engine(loaded)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Indexing catalog with {}...",
        engine.index().embeddings().model_name()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let indexed = engine.index_catalog().await;
    spinner.finish_and_clear();
    let indexed = indexed.context("Failed to index catalog")?;
    tracing::debug!(indexed, "catalog ready");

    Ok(engine)
}
