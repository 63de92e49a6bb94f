//! Initialize a Margin project.

use anyhow::{Context, Result};
use colored::Colorize;
use margin::EngineConfig;
use std::path::PathBuf;

use crate::config::{self, CONFIG_FILE};

pub fn run(path: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Margin project...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    let config = EngineConfig::default();
    let config_path = base_path.join(CONFIG_FILE);
    if !config_path.exists() {
        config::save(&config, &config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    // An empty catalog parses to zero entities.
    let catalog_path = base_path.join(&config.catalog.path);
    if !catalog_path.exists() {
        std::fs::write(&catalog_path, "{}\n")
            .with_context(|| format!("Failed to write {}", catalog_path.display()))?;
        println!("  {} Created {}", "✓".green(), catalog_path.display());
    }

    println!();
    println!("{} Margin project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} fill {} with episodes, books, speakers and quotes", "1.".blue(), catalog_path.display());
    println!("  {} margin search \"your query\"", "2.".blue());
    println!("  {} margin graph stats", "3.".blue());
    println!("  {} margin recommend --topic habits", "4.".blue());

    Ok(())
}
