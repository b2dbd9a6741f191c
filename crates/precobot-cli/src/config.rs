//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `$PRECOBOT_CONFIG` environment variable
//! 2. `~/.config/precobot/config.toml`
//! 3. Built-in defaults (everything is optional)

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub chat: ChatConfig,
}

/// Catalog file locations.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory scanned for catalog files. Default: platform data dir.
    pub dir: Option<String>,
    /// Canonical output file. Default: `precos.json` inside the catalog
    /// directory, so mutations are reloaded on the next start.
    pub output: Option<String>,
}

/// Chat surface settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Custom welcome text replacing the built-in `start` reply.
    pub greeting: Option<String>,
}

/// Load config from disk. Returns defaults if no config file exists.
pub fn load_config() -> Result<Config> {
    let path = config_path();

    if let Some(p) = &path {
        if p.exists() {
            let content =
                std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display()))?;
            let config: Config =
                toml::from_str(&content).with_context(|| format!("parsing {}", p.display()))?;
            return Ok(config);
        }
    }

    Ok(Config::default())
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(p) = std::env::var("PRECOBOT_CONFIG") {
        return Some(PathBuf::from(p));
    }

    // 2. ~/.config/precobot/config.toml
    if let Some(home) = dirs_home() {
        let p = home.join(".config").join("precobot").join("config.toml");
        return Some(p);
    }

    None
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Show the active config path (for `precobot config`).
pub fn show_config_path() -> String {
    match config_path() {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.catalog.dir.is_none());
        assert!(config.catalog.output.is_none());
        assert!(config.chat.greeting.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[catalog]
dir = "/srv/precobot/catalog"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.dir.as_deref(), Some("/srv/precobot/catalog"));
        // Other fields should be defaults
        assert!(config.catalog.output.is_none());
        assert!(config.chat.greeting.is_none());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[catalog]
dir = "/srv/precobot/catalog"
output = "/srv/precobot/catalog/precos.json"

[chat]
greeting = "Welcome to the counter bot"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.catalog.output.as_deref(),
            Some("/srv/precobot/catalog/precos.json")
        );
        assert_eq!(config.chat.greeting.as_deref(), Some("Welcome to the counter bot"));
    }
}
