//! Traitlab Configuration
//!
//! Loads and saves the client's configuration from `~/.traitlab/traitlab.json`.
//! The only setting the core depends on is the backend base URL, read once
//! at startup; `BACKEND_API` in the environment overrides the file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::types::{default_config, TraitlabConfig};

/// Config file name within the traitlab directory.
const CONFIG_FILENAME: &str = "traitlab.json";

/// Returns the traitlab state directory: `~/.traitlab`.
pub fn get_traitlab_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
    home.join(".traitlab")
}

/// Returns the full path to the config file: `~/.traitlab/traitlab.json`.
pub fn get_config_path() -> PathBuf {
    get_traitlab_dir().join(CONFIG_FILENAME)
}

/// Load the traitlab config from disk.
///
/// Reads `~/.traitlab/traitlab.json` and merges missing fields with
/// defaults. The `BACKEND_API` environment variable, if set, overrides
/// the backend URL from the file.
///
/// Returns `None` if the config file does not exist or cannot be parsed.
pub fn load_config() -> Option<TraitlabConfig> {
    let config_path = get_config_path();
    if !config_path.exists() {
        return None;
    }

    let contents = fs::read_to_string(&config_path).ok()?;
    let mut config: TraitlabConfig = serde_json::from_str(&contents).ok()?;

    // Merge defaults for unset fields
    let defaults = default_config();

    if config.backend_api.is_empty() {
        config.backend_api = defaults.backend_api;
    }
    if config.proxy_url.is_empty() {
        config.proxy_url = defaults.proxy_url;
    }
    if config.listen_addr.is_empty() {
        config.listen_addr = defaults.listen_addr;
    }
    if config.db_path.is_empty() {
        config.db_path = defaults.db_path;
    }

    if let Ok(url) = std::env::var("BACKEND_API") {
        if !url.is_empty() {
            config.backend_api = url;
        }
    }

    Some(config)
}

/// Load the config, falling back to defaults (plus the `BACKEND_API`
/// environment override) when no config file is present.
pub fn load_config_or_default() -> TraitlabConfig {
    load_config().unwrap_or_else(|| {
        let mut config = default_config();
        if let Ok(url) = std::env::var("BACKEND_API") {
            if !url.is_empty() {
                config.backend_api = url;
            }
        }
        config
    })
}

/// Save the traitlab config to disk at `~/.traitlab/traitlab.json`.
///
/// Creates the traitlab directory if it does not exist.
pub fn save_config(config: &TraitlabConfig) -> Result<()> {
    let dir = get_traitlab_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir).context("Failed to create traitlab directory")?;
    }

    let config_path = get_config_path();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(&config_path, &json).context("Failed to write config file")?;

    Ok(())
}

/// Resolve a path that may start with `~` to an absolute path.
///
/// If the path starts with `~`, the tilde is replaced with the user's home
/// directory. Otherwise the path is returned as-is.
pub fn resolve_path(p: &str) -> String {
    if let Some(rest) = p.strip_prefix('~') {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        home.join(rest).to_string_lossy().to_string()
    } else {
        p.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_with_tilde() {
        let resolved = resolve_path("~/some/path");
        assert!(!resolved.starts_with('~'));
        assert!(resolved.ends_with("some/path"));
    }

    #[test]
    fn test_resolve_path_without_tilde() {
        let path = "/absolute/path/to/file";
        assert_eq!(resolve_path(path), path);
    }

    #[test]
    fn test_default_config_values() {
        let config = default_config();
        assert_eq!(config.backend_api, "http://localhost:8000");
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.db_path, "~/.traitlab/state.db");
    }
}
