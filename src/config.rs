//! TOML configuration for the guesser.
//!
//! Provides three loading methods:
//! - `default_config()` - Settings embedded in the binary at compile time
//! - `load_config(path)` - Settings from a specific file
//! - `resolve_config(explicit)` - Explicit file, else the per-user file, else defaults
//!
//! `ANIME_GUESSER_API_URL` overrides `service.api_url` in every case.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::analyzer::ImageOptions;
use crate::error::GuesserError;
use crate::refinement::RollbackMode;

/// Default settings, loaded from `config/guesser.toml`.
const DEFAULT_CONFIG: &str = include_str!("../config/guesser.toml");

/// Environment variable overriding the recognition service address.
pub const API_URL_ENV: &str = "ANIME_GUESSER_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct GuesserConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub refinement: RefinementConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Base address of the recognition API (without the `/api` suffix)
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default)]
    pub max_dimension: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefinementConfig {
    #[serde(default)]
    pub rollback_mode: RollbackMode,
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("AnimeGuesser/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_single_flight() -> bool {
    true
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_dimension: None,
        }
    }
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            rollback_mode: RollbackMode::default(),
            single_flight: default_single_flight(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl GuesserConfig {
    /// Image acquisition limits derived from the `[image]` table.
    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            max_bytes: self.image.max_bytes,
            max_dimension: self.image.max_dimension,
        }
    }

    /// Check that the base address is an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), GuesserError> {
        let url = Url::parse(&self.service.api_url).map_err(|e| {
            GuesserError::Config(format!("Invalid api_url '{}': {}", self.service.api_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(GuesserError::Config(format!(
                "api_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(GuesserError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_env_override(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                debug!("Overriding api_url from {}: {}", API_URL_ENV, url);
                self.service.api_url = url.to_string();
            }
        }
        self
    }
}

/// Get the settings embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_config() -> GuesserConfig {
    toml::from_str(DEFAULT_CONFIG).expect("embedded guesser.toml must be valid TOML")
}

/// Load settings from a TOML file at the given path.
pub fn load_config(path: &Path) -> Result<GuesserConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let config: GuesserConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(config)
}

/// Per-user config file location, e.g. `~/.config/anime-guesser/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("anime-guesser").join("config.toml"))
}

/// Resolve the effective configuration.
///
/// An explicit path must exist. Without one, the per-user file is used when
/// present, otherwise the embedded defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<GuesserConfig> {
    let config = match explicit {
        Some(path) => {
            info!("Loading config from {:?}", path);
            load_config(path)?
        }
        None => match config_path().filter(|p| p.exists()) {
            Some(path) => {
                info!("Loading config from {:?}", path);
                load_config(&path)?
            }
            None => {
                debug!("No user config found, using defaults");
                default_config()
            }
        },
    };

    let config = config.apply_env_override();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_values() {
        let config = default_config();
        assert_eq!(config.service.api_url, "http://localhost:8080");
        assert_eq!(config.service.request_timeout_secs, 30);
        assert_eq!(config.image.max_bytes, 10 * 1024 * 1024);
        assert!(config.image.max_dimension.is_none());
        assert_eq!(config.refinement.rollback_mode, RollbackMode::Retain);
        assert!(config.refinement.single_flight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[service]\napi_url = \"https://guess.example.com\"\n\n[refinement]\nrollback_mode = \"recompute\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.service.api_url, "https://guess.example.com");
        assert_eq!(config.service.request_timeout_secs, 30);
        assert_eq!(config.refinement.rollback_mode, RollbackMode::Recompute);
        assert!(config.refinement.single_flight);
        assert_eq!(config.image.max_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Path::new("/nonexistent/guesser.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read"));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[service\napi_url = ").unwrap();

        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = default_config();
        config.service.api_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(GuesserError::Config(_))));

        config.service.api_url = "ftp://example.com".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = default_config();
        config.service.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_image_options_from_config() {
        let mut config = default_config();
        config.image.max_dimension = Some(512);
        let options = config.image_options();
        assert_eq!(options.max_bytes, 10 * 1024 * 1024);
        assert_eq!(options.max_dimension, Some(512));
    }
}
