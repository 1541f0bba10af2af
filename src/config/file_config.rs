//! Configuration file support for arxiv-scout.
//!
//! # Configuration File Format
//!
//! ```toml
//! [arxiv]
//! base_url = "http://export.arxiv.org/api/query"
//! user_agent = "arxiv-scout/0.1.0"
//! connect_timeout_secs = 10
//!
//! [retry]
//! timeout_ms = 15000
//! max_retries = 3
//! initial_backoff_ms = 1000
//! max_backoff_ms = 10000
//! max_jitter_ms = 1000
//!
//! [cache]
//! enabled = false
//! ttl_seconds = 1800
//! max_entries = 256
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Every key can be overridden from the environment, e.g.
//! `ARXIV_SCOUT_ARXIV__BASE_URL` or `ARXIV_SCOUT_RETRY__TIMEOUT_MS`.

use std::path::PathBuf;

use super::Config;

/// File name looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "arxiv-scout.toml";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Find a configuration file in the default locations
///
/// Checks `./arxiv-scout.toml`, then `<config dir>/arxiv-scout/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("arxiv-scout").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Render a configuration as TOML
pub fn render_toml(config: &Config) -> Result<String, ConfigFileError> {
    toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    #[test]
    fn test_render_round_trips_through_loader() {
        let mut config = Config::default();
        config.retry.max_retries = 7;
        config.logging.format = Some("json".to_string());

        let rendered = render_toml(&config).unwrap();
        assert!(rendered.contains("[retry]"));
        assert!(rendered.contains("max_retries = 7"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, rendered).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_default_config_renders_every_section() {
        let rendered = render_toml(&Config::default()).unwrap();
        for section in ["[arxiv]", "[retry]", "[cache]", "[logging]"] {
            assert!(rendered.contains(section), "missing {}", section);
        }
        // Unset options are omitted
        assert!(!rendered.contains("format"));
    }
}
