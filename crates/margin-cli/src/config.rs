//! Configuration discovery for the Margin CLI.

use anyhow::{Context, Result};
use margin::EngineConfig;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "margin.toml";

/// Engine config plus where it came from.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub config: EngineConfig,
    /// File the config was read from. `None` means built-in defaults.
    pub path: Option<PathBuf>,
    /// Directory relative catalog paths are resolved against.
    pub base_dir: PathBuf,
}

/// Load `explicit`, or else margin.toml from the current directory, its
/// parents, or the user config directory. Falls back to defaults.
pub fn load(explicit: Option<&Path>) -> Result<Loaded> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config = EngineConfig::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            Ok(Loaded {
                config,
                path: Some(path),
                base_dir,
            })
        }
        None => Ok(Loaded {
            config: EngineConfig::default(),
            path: None,
            base_dir: std::env::current_dir().context("Failed to read current directory")?,
        }),
    }
}

/// Save config to the specified path.
pub fn save(config: &EngineConfig, path: &Path) -> Result<()> {
    let content = config.to_toml_string().context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

/// Find margin.toml in current or parent directories, then in the user config directory.
fn find_config_file() -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(find_upwards(&cwd).or_else(user_config_file))
}

fn find_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

fn user_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("margin").join(CONFIG_FILE);
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_config_in_a_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();

        assert_eq!(find_upwards(&nested), Some(dir.path().join(CONFIG_FILE)));
    }

    #[test]
    fn explicit_path_sets_the_catalog_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[search]\nlimit = 3\n").unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.config.search.limit, 3);
        assert_eq!(loaded.base_dir, dir.path());
        assert_eq!(loaded.path, Some(path));
    }

    #[test]
    fn saved_defaults_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        save(&EngineConfig::default(), &path).unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.config, EngineConfig::default());
        assert!(std::fs::read_to_string(&path).unwrap().contains("[embedding]"));
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[search\n").unwrap();

        let err = load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
